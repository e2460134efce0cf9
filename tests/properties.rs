//! Property-based tests for the int set, span relations and index order

use cas_graph::types::builtin::{ANNOTATION, INITIAL_VIEW_NAME};
use cas_graph::{AdaptiveIntSet, Cas, Span, TypeSystem};
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Debug, Clone)]
enum Op {
    Add(u32),
    Remove(u32),
}

/// Values mixing a small dense range with a cluster far from zero, so both
/// forms and the offset get exercised
fn value() -> impl Strategy<Value = u32> {
    prop_oneof![0u32..512, 1_000_000u32..1_000_400, any::<u32>()]
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![3 => value().prop_map(Op::Add), 1 => value().prop_map(Op::Remove)]
}

fn span() -> impl Strategy<Value = Span> {
    (0i32..50, 0i32..20).prop_map(|(begin, len)| Span::new(begin, begin + len))
}

fn non_empty_span() -> impl Strategy<Value = Span> {
    (0i32..50, 1i32..20).prop_map(|(begin, len)| Span::new(begin, begin + len))
}

proptest! {
    #[test]
    fn prop_int_set_matches_model(ops in prop::collection::vec(op(), 0..300)) {
        let mut set = AdaptiveIntSet::new();
        let mut model = BTreeSet::new();
        for op in ops {
            match op {
                Op::Add(v) => prop_assert_eq!(set.add(v), model.insert(v)),
                Op::Remove(v) => prop_assert_eq!(set.remove(v), model.remove(&v)),
            }
            prop_assert_eq!(set.len(), model.len());
        }

        let expected: Vec<u32> = model.iter().copied().collect();
        prop_assert_eq!(set.to_ordered_vec(), expected.clone());
        prop_assert_eq!(set.ordered_iter().collect::<Vec<_>>(), expected.clone());

        let mut unordered = set.to_unordered_vec();
        unordered.sort_unstable();
        prop_assert_eq!(unordered, expected);

        for v in &model {
            prop_assert!(set.contains(*v));
        }
    }

    #[test]
    fn prop_relations_are_symmetric(a in span(), b in span()) {
        prop_assert_eq!(a.overlaps(&b), b.overlaps(&a));
        prop_assert_eq!(a.covers(&b), b.covered_by(&a));
        prop_assert_eq!(a.left_of(&b), b.right_of(&a));
        prop_assert_eq!(a.overlaps_left(&b), b.overlaps_right(&a));
    }

    #[test]
    fn prop_left_right_overlap_trichotomy(a in non_empty_span(), b in non_empty_span()) {
        let holding = [a.left_of(&b), a.right_of(&b), a.overlaps(&b)]
            .iter()
            .filter(|&&x| x)
            .count();
        prop_assert_eq!(holding, 1);
    }

    #[test]
    fn prop_select_is_sorted_by_begin_then_longest(spans in prop::collection::vec(span(), 0..40)) {
        let mut ts = TypeSystem::new();
        ts.commit().unwrap();
        let mut cas = Cas::new(Arc::new(ts)).unwrap();
        cas.set_document_text(INITIAL_VIEW_NAME, &"x".repeat(80)).unwrap();

        for s in &spans {
            let id = cas.create_instance(ANNOTATION).unwrap();
            cas.set_span(id, *s).unwrap();
            cas.add_to_indexes(id, INITIAL_VIEW_NAME).unwrap();
        }

        let selected: Vec<Span> = cas
            .select(INITIAL_VIEW_NAME, ANNOTATION)
            .into_iter()
            .map(|id| cas.span(id).unwrap())
            .collect();
        prop_assert_eq!(selected.len(), spans.len() + 1);
        for pair in selected.windows(2) {
            let (x, y) = (pair[0], pair[1]);
            prop_assert!(x.begin < y.begin || (x.begin == y.begin && x.end >= y.end));
        }
    }
}
