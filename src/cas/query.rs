//! Index queries, covered text and trimming

use super::Cas;
use crate::core::error::Result;
use crate::index::{AnnotationKey, AnnotationTree, Span};
use crate::types::{FsId, TypeId};

impl Cas {
    /// Records indexed in a view, in id order
    pub fn members(&self, view: &str) -> Vec<FsId> {
        self.view(view)
            .map(|v| v.index.members())
            .unwrap_or_default()
    }

    /// Records of type `t` or a subtype indexed in a view.
    ///
    /// Annotation types come back in index order (begin ascending, end
    /// descending, then insertion order). Other types come back in id order.
    pub fn select(&self, view: &str, t: TypeId) -> Vec<FsId> {
        let Some(v) = self.view(view) else {
            return Vec::new();
        };
        if self.type_system.is_annotation(t) {
            v.index
                .annotations(&self.type_system, t)
                .map(|key| key.id)
                .collect()
        } else {
            v.index.records_of(&self.type_system, t)
        }
    }

    /// Annotations of type `t` lying inside `span`
    pub fn select_covered(&self, view: &str, t: TypeId, span: Span) -> Vec<FsId> {
        self.scan(view, t, |key| key.span.begin > span.end, |key| span.covers(&key.span))
    }

    /// Annotations of type `t` enclosing `span`
    pub fn select_covering(&self, view: &str, t: TypeId, span: Span) -> Vec<FsId> {
        self.scan(view, t, |key| key.span.begin > span.begin, |key| key.span.covers(&span))
    }

    /// Annotations of type `t` sharing at least one code point with `span`
    pub fn select_overlapping(&self, view: &str, t: TypeId, span: Span) -> Vec<FsId> {
        self.scan(view, t, |key| key.span.begin >= span.end, |key| key.span.overlaps(&span))
    }

    /// Containment tree of the annotations of type `t` in a view.
    ///
    /// The root defaults to the view's document annotation, which is created
    /// if missing.
    pub fn annotation_tree(&mut self, view: &str, root: Option<FsId>, t: TypeId) -> Result<AnnotationTree> {
        let root = match root {
            Some(id) => id,
            None => self.document_annotation(view)?,
        };
        let root_span = self.span(root)?;
        let Some(v) = self.view(view) else {
            return Ok(AnnotationTree::build((root, root_span), Vec::new()));
        };
        let ordered = v
            .index
            .annotations(&self.type_system, t)
            .take_while(|key| key.span.begin <= root_span.end)
            .map(|key| (key.id, key.span));
        Ok(AnnotationTree::build((root, root_span), ordered))
    }

    /// Text covered by an annotation
    pub fn covered_text(&self, id: FsId) -> Result<String> {
        let span = self.span(id)?;
        let view = self.bound_view(id)?;
        Ok(self
            .document_text(view.name())
            .map(|text| span.covered_text(text))
            .unwrap_or_default())
    }

    /// Shrink an annotation over leading and trailing code points matching
    /// `predicate`, returning the new span
    pub fn trim<P>(&mut self, id: FsId, predicate: P) -> Result<Span>
    where
        P: FnMut(char) -> bool,
    {
        let span = self.span(id)?;
        let name = self.bound_view(id)?.name().to_string();
        let Some(text) = self.document_text(&name) else {
            return Ok(span);
        };
        let trimmed = span.trim(text, predicate);
        if trimmed != span {
            self.set_span(id, trimmed)?;
        }
        Ok(trimmed)
    }

    /// [`trim`](Self::trim) with the whitespace predicate
    pub fn trim_whitespace(&mut self, id: FsId) -> Result<Span> {
        self.trim(id, char::is_whitespace)
    }

    fn scan<S, F>(&self, view: &str, t: TypeId, stop: S, keep: F) -> Vec<FsId>
    where
        S: Fn(&AnnotationKey) -> bool,
        F: Fn(&AnnotationKey) -> bool,
    {
        let Some(v) = self.view(view) else {
            return Vec::new();
        };
        v.index
            .annotations(&self.type_system, t)
            .take_while(|key| !stop(key))
            .filter(|key| keep(key))
            .map(|key| key.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::cas::tests::sample_type_system;
    use crate::cas::Cas;
    use crate::core::error::{Error, GraphError};
    use crate::index::{Span, TreeNode};
    use crate::types::builtin::{ANNOTATION, INITIAL_VIEW_NAME, TOP};
    use crate::types::{FsId, TypeId};

    fn annotate(cas: &mut Cas, t: TypeId, begin: i32, end: i32) -> FsId {
        let id = cas.create_instance(t).unwrap();
        cas.set_span(id, Span::new(begin, end)).unwrap();
        cas.add_to_indexes(id, INITIAL_VIEW_NAME).unwrap();
        id
    }

    fn setup() -> (Cas, TypeId) {
        let mut cas = Cas::new(sample_type_system()).unwrap();
        cas.set_document_text(INITIAL_VIEW_NAME, "The quick brown fox.").unwrap();
        let token = cas.type_system().type_by_name("example.Token").unwrap();
        (cas, token)
    }

    #[test]
    fn test_select_orders_by_begin_then_longer_first() {
        let (mut cas, token) = setup();
        let quick = annotate(&mut cas, token, 4, 9);
        let the = annotate(&mut cas, token, 0, 3);
        let phrase = annotate(&mut cas, ANNOTATION, 4, 15);
        let brown = annotate(&mut cas, token, 10, 15);

        assert_eq!(cas.select(INITIAL_VIEW_NAME, token), vec![the, quick, brown]);

        let doc = cas.document_annotation(INITIAL_VIEW_NAME).unwrap();
        assert_eq!(
            cas.select(INITIAL_VIEW_NAME, ANNOTATION),
            vec![doc, the, phrase, quick, brown]
        );
        assert_eq!(cas.select("nowhere", token), Vec::<FsId>::new());
    }

    #[test]
    fn test_select_non_annotation_in_id_order() {
        let (mut cas, _) = setup();
        let entity_type = cas.type_system().type_by_name("example.Entity").unwrap();
        let b = cas.create_instance(entity_type).unwrap();
        let a = cas.create_instance(entity_type).unwrap();
        cas.add_to_indexes(a, INITIAL_VIEW_NAME).unwrap();
        cas.add_to_indexes(b, INITIAL_VIEW_NAME).unwrap();
        assert_eq!(cas.select(INITIAL_VIEW_NAME, entity_type), vec![b, a]);

        let all = cas.select(INITIAL_VIEW_NAME, TOP);
        assert_eq!(all, cas.members(INITIAL_VIEW_NAME));
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_span_selections() {
        let (mut cas, token) = setup();
        let the = annotate(&mut cas, token, 0, 3);
        let quick = annotate(&mut cas, token, 4, 9);
        let brown = annotate(&mut cas, token, 10, 15);
        let phrase = annotate(&mut cas, ANNOTATION, 4, 15);

        assert_eq!(
            cas.select_covered(INITIAL_VIEW_NAME, token, Span::new(4, 15)),
            vec![quick, brown]
        );
        assert_eq!(
            cas.select_covering(INITIAL_VIEW_NAME, ANNOTATION, Span::new(5, 8)),
            vec![cas.view(INITIAL_VIEW_NAME).unwrap().document_annotation().unwrap(), phrase, quick]
        );
        assert_eq!(
            cas.select_overlapping(INITIAL_VIEW_NAME, token, Span::new(2, 5)),
            vec![the, quick]
        );
    }

    #[test]
    fn test_covered_text_and_trim() {
        let mut cas = Cas::new(sample_type_system()).unwrap();
        cas.set_document_text(INITIAL_VIEW_NAME, "  hi  ").unwrap();
        let token = cas.type_system().type_by_name("example.Token").unwrap();
        let id = annotate(&mut cas, token, 0, 6);

        assert_eq!(cas.covered_text(id).unwrap(), "  hi  ");
        assert_eq!(cas.trim_whitespace(id).unwrap(), Span::new(2, 4));
        assert_eq!(cas.covered_text(id).unwrap(), "hi");
        assert_eq!(cas.select(INITIAL_VIEW_NAME, token), vec![id]);
    }

    #[test]
    fn test_covered_text_requires_binding() {
        let (mut cas, token) = setup();
        let loose = cas.create_instance(token).unwrap();
        assert!(matches!(
            cas.covered_text(loose),
            Err(Error::Graph(GraphError::UnboundAnnotation { .. }))
        ));
    }

    #[test]
    fn test_annotation_tree() {
        let (mut cas, token) = setup();
        let phrase = annotate(&mut cas, ANNOTATION, 4, 15);
        let quick = annotate(&mut cas, token, 4, 9);
        let brown = annotate(&mut cas, token, 10, 15);
        let fox = annotate(&mut cas, token, 16, 19);

        let tree = cas.annotation_tree(INITIAL_VIEW_NAME, None, ANNOTATION).unwrap();
        let doc = cas.document_annotation(INITIAL_VIEW_NAME).unwrap();
        assert_eq!(tree.root().id(), doc);

        let top: Vec<FsId> = tree.children(tree.root()).map(TreeNode::id).collect();
        assert_eq!(top, vec![phrase, fox]);
        let inner: Vec<FsId> = tree
            .children(tree.node(phrase).unwrap())
            .map(TreeNode::id)
            .collect();
        assert_eq!(inner, vec![quick, brown]);

        let sub = cas.annotation_tree(INITIAL_VIEW_NAME, Some(phrase), token).unwrap();
        assert_eq!(sub.len(), 3);
    }
}
