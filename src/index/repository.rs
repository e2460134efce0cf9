//! Per-view index repository.
//!
//! Annotations are kept per exact type in ordered sets keyed by
//! `(begin asc, end desc, insertion seq asc)`. Other records are kept per
//! exact type in [`AdaptiveIntSet`]s. Queries over a type and its subtypes
//! merge the per-type sets on the fly.

use crate::index::span::Span;
use crate::structures::AdaptiveIntSet;
use crate::types::{FsId, TypeId, TypeSystem};
use std::cmp::{Ordering, Reverse};
use std::collections::{btree_set, BTreeSet, BinaryHeap, HashMap};

/// Sort key of an indexed annotation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AnnotationKey {
    /// Span at the time of indexing
    pub span: Span,
    /// Insertion sequence number, breaks ties between equal spans
    pub seq: u64,
    /// Indexed record
    pub id: FsId,
}

impl Ord for AnnotationKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.span
            .begin
            .cmp(&other.span.begin)
            .then_with(|| other.span.end.cmp(&self.span.end))
            .then_with(|| self.seq.cmp(&other.seq))
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for AnnotationKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Index state of one view
#[derive(Clone, Debug, Default)]
pub struct IndexRepository {
    members: AdaptiveIntSet,
    plain: HashMap<TypeId, AdaptiveIntSet>,
    annotations: HashMap<TypeId, BTreeSet<AnnotationKey>>,
    keys: HashMap<FsId, (TypeId, AnnotationKey)>,
    next_seq: u64,
}

impl IndexRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of indexed records
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// True if nothing is indexed
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// True if `id` is indexed here
    pub fn contains(&self, id: FsId) -> bool {
        self.members.contains(id.get())
    }

    /// Index a record. `span` must be given for annotations and only for them.
    ///
    /// Returns false if the record was already indexed.
    pub fn add(&mut self, id: FsId, type_id: TypeId, span: Option<Span>) -> bool {
        if !self.members.add(id.get()) {
            return false;
        }
        match span {
            Some(span) => {
                let key = AnnotationKey {
                    span,
                    seq: self.next_seq,
                    id,
                };
                self.next_seq += 1;
                self.annotations.entry(type_id).or_default().insert(key);
                self.keys.insert(id, (type_id, key));
            }
            None => {
                self.plain.entry(type_id).or_default().add(id.get());
            }
        }
        true
    }

    /// Remove a record. Returns false if it was not indexed.
    pub fn remove(&mut self, id: FsId, type_id: TypeId) -> bool {
        if !self.members.remove(id.get()) {
            return false;
        }
        if let Some((t, key)) = self.keys.remove(&id) {
            if let Some(set) = self.annotations.get_mut(&t) {
                set.remove(&key);
            }
        } else if let Some(set) = self.plain.get_mut(&type_id) {
            set.remove(id.get());
        }
        true
    }

    /// Move an indexed annotation to its new span, keeping its tie-break position
    pub fn reposition(&mut self, id: FsId, span: Span) {
        if let Some((t, key)) = self.keys.get_mut(&id) {
            if let Some(set) = self.annotations.get_mut(t) {
                set.remove(key);
                key.span = span;
                set.insert(*key);
            }
        }
    }

    /// Indexed span of an annotation
    pub fn span_of(&self, id: FsId) -> Option<Span> {
        self.keys.get(&id).map(|(_, key)| key.span)
    }

    /// Every indexed record in id order
    pub fn members(&self) -> Vec<FsId> {
        self.members.ordered_iter().map(FsId).collect()
    }

    /// Every indexed record in no particular order
    pub fn members_unordered(&self) -> Vec<FsId> {
        self.members
            .to_unordered_vec()
            .into_iter()
            .map(FsId)
            .collect()
    }

    /// Annotations whose type `t` subsumes, in index order
    pub fn annotations<'a>(&'a self, ts: &TypeSystem, t: TypeId) -> MergedAnnotations<'a> {
        let sources = self
            .annotations
            .iter()
            .filter(|(exact, set)| !set.is_empty() && ts.subsumes(t, **exact))
            .map(|(_, set)| set.iter())
            .collect();
        MergedAnnotations::new(sources)
    }

    /// Records whose type `t` subsumes, in id order
    pub fn records_of(&self, ts: &TypeSystem, t: TypeId) -> Vec<FsId> {
        let mut out: Vec<FsId> = self
            .plain
            .iter()
            .filter(|(exact, _)| ts.subsumes(t, **exact))
            .flat_map(|(_, set)| set.to_unordered_vec())
            .map(FsId)
            .collect();
        out.extend(
            self.keys
                .iter()
                .filter(|(_, (exact, _))| ts.subsumes(t, *exact))
                .map(|(id, _)| *id),
        );
        out.sort_unstable();
        out
    }

    /// Indexed records in the order they were added. Plain records, whose
    /// insertion order is not tracked, follow in id order.
    pub(crate) fn insertion_order(&self) -> Vec<FsId> {
        let mut annotated: Vec<&AnnotationKey> = self.keys.values().map(|(_, key)| key).collect();
        annotated.sort_by_key(|key| key.seq);
        let mut order: Vec<FsId> = annotated.into_iter().map(|key| key.id).collect();
        let mut plain: Vec<FsId> = self
            .plain
            .values()
            .flat_map(AdaptiveIntSet::to_unordered_vec)
            .map(FsId)
            .collect();
        plain.sort_unstable();
        order.extend(plain);
        order
    }

    /// Drop everything
    pub fn clear(&mut self) {
        self.members.clear();
        self.plain.clear();
        self.annotations.clear();
        self.keys.clear();
    }
}

/// K-way merge over per-type annotation sets
pub struct MergedAnnotations<'a> {
    sources: Vec<btree_set::Iter<'a, AnnotationKey>>,
    heap: BinaryHeap<Reverse<(AnnotationKey, usize)>>,
}

impl<'a> MergedAnnotations<'a> {
    fn new(mut sources: Vec<btree_set::Iter<'a, AnnotationKey>>) -> Self {
        let mut heap = BinaryHeap::with_capacity(sources.len());
        for (source, iter) in sources.iter_mut().enumerate() {
            if let Some(key) = iter.next() {
                heap.push(Reverse((*key, source)));
            }
        }
        Self { sources, heap }
    }
}

impl Iterator for MergedAnnotations<'_> {
    type Item = AnnotationKey;

    fn next(&mut self) -> Option<AnnotationKey> {
        let Reverse((key, source)) = self.heap.pop()?;
        if let Some(next) = self.sources[source].next() {
            self.heap.push(Reverse((*next, source)));
        }
        Some(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::builtin::{ANNOTATION, DOCUMENT_ANNOTATION, FS_ARRAY, TOP};

    fn committed() -> (TypeSystem, TypeId) {
        let mut ts = TypeSystem::new();
        let token = ts.add_type("example.Token", ANNOTATION).unwrap();
        ts.commit().unwrap();
        (ts, token)
    }

    #[test]
    fn test_index_order() {
        let (ts, token) = committed();
        let mut repo = IndexRepository::new();
        repo.add(FsId(1), token, Some(Span::new(5, 8)));
        repo.add(FsId(2), token, Some(Span::new(0, 3)));
        repo.add(FsId(3), ANNOTATION, Some(Span::new(0, 10)));
        repo.add(FsId(4), token, Some(Span::new(0, 3)));

        let order: Vec<FsId> = repo.annotations(&ts, ANNOTATION).map(|k| k.id).collect();
        assert_eq!(order, vec![FsId(3), FsId(2), FsId(4), FsId(1)]);

        let tokens: Vec<FsId> = repo.annotations(&ts, token).map(|k| k.id).collect();
        assert_eq!(tokens, vec![FsId(2), FsId(4), FsId(1)]);
    }

    #[test]
    fn test_add_is_idempotent_and_remove_reports_membership() {
        let (ts, token) = committed();
        let mut repo = IndexRepository::new();
        assert!(repo.add(FsId(1), token, Some(Span::new(0, 1))));
        assert!(!repo.add(FsId(1), token, Some(Span::new(0, 1))));
        assert_eq!(repo.len(), 1);

        assert!(repo.remove(FsId(1), token));
        assert!(!repo.remove(FsId(1), token));
        assert!(repo.is_empty());
        assert_eq!(repo.annotations(&ts, TOP).count(), 0);
    }

    #[test]
    fn test_reposition_keeps_tie_break() {
        let (ts, token) = committed();
        let mut repo = IndexRepository::new();
        repo.add(FsId(1), token, Some(Span::new(4, 6)));
        repo.add(FsId(2), token, Some(Span::new(0, 2)));
        repo.reposition(FsId(1), Span::new(0, 2));

        let order: Vec<FsId> = repo.annotations(&ts, token).map(|k| k.id).collect();
        assert_eq!(order, vec![FsId(1), FsId(2)]);
        assert_eq!(repo.span_of(FsId(1)), Some(Span::new(0, 2)));
    }

    #[test]
    fn test_records_of_mixes_plain_and_annotations() {
        let (ts, token) = committed();
        let mut repo = IndexRepository::new();
        repo.add(FsId(7), FS_ARRAY, None);
        repo.add(FsId(3), token, Some(Span::new(0, 1)));
        repo.add(FsId(5), DOCUMENT_ANNOTATION, Some(Span::new(0, 1)));

        assert_eq!(repo.records_of(&ts, TOP), vec![FsId(3), FsId(5), FsId(7)]);
        assert_eq!(repo.records_of(&ts, FS_ARRAY), vec![FsId(7)]);
        assert_eq!(repo.members(), vec![FsId(3), FsId(5), FsId(7)]);
    }
}
