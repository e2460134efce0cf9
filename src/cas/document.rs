//! Sofa data, document text and the document annotation of each view

use super::Cas;
use crate::core::error::{GraphError, Result};
use crate::index::Span;
use crate::types::builtin::{
    self, DEFAULT_LANGUAGE, DOCUMENT_SLOT_LANGUAGE, SOFA_SLOT_ARRAY, SOFA_SLOT_MIME,
    SOFA_SLOT_STRING, SOFA_SLOT_URI,
};
use crate::types::{FsId, TypeId, Value};
use std::collections::HashSet;
use tracing::warn;

/// MIME type recorded by [`Cas::set_document_text`]
pub const TEXT_MIME_TYPE: &str = "text";

/// Views whose primary document annotation was settled during one load
#[derive(Clone, Debug, Default)]
pub struct DocumentAnnotationMarks {
    finalized: HashSet<String>,
}

impl DocumentAnnotationMarks {
    /// Nothing finalized yet
    pub fn new() -> Self {
        Self::default()
    }

    /// True once the view's primary document annotation was settled
    pub fn is_finalized(&self, view: &str) -> bool {
        self.finalized.contains(view)
    }

    fn mark(&mut self, view: &str) {
        self.finalized.insert(view.to_string());
    }
}

impl Cas {
    /// Set the view text with MIME type `text`
    pub fn set_document_text(&mut self, view: &str, text: &str) -> Result<()> {
        self.set_sofa_data_string(view, text, Some(TEXT_MIME_TYPE))
    }

    /// Set the view text.
    ///
    /// Creates the primary document annotation over the whole text, or
    /// stretches the existing one to the new length. Fails with
    /// `InvalidSpan` and leaves the view as it was if another indexed
    /// annotation would end past the new text.
    pub fn set_sofa_data_string(&mut self, view: &str, text: &str, mime: Option<&str>) -> Result<()> {
        let length = text.chars().count();
        let vi = self.ensure_view(view);
        let v = &self.views[vi];
        let primary = v.document_annotation();
        let stale = v
            .index
            .members()
            .into_iter()
            .filter(|&id| Some(id) != primary)
            .filter_map(|id| v.index.span_of(id))
            .find(|span| !span.is_valid_for(length));
        if let Some(span) = stale {
            return Err(GraphError::InvalidSpan {
                begin: span.begin,
                end: span.end,
                length,
            }
            .into());
        }

        self.write_sofa_string(view, text, mime)?;
        match self.view_mut(view).document_annotation() {
            Some(existing) => self.set_span(existing, Span::new(0, length as i32)),
            None => self.create_document_annotation(view, builtin::DOCUMENT_ANNOTATION).map(|_| ()),
        }
    }

    /// Store the view text and MIME type only; the document annotation and
    /// the index are left alone
    pub(crate) fn write_sofa_string(&mut self, view: &str, text: &str, mime: Option<&str>) -> Result<()> {
        let sofa = {
            let v = self.view_mut(view);
            v.text_len = Some(text.chars().count());
            v.sofa
        };
        self.write_slot(sofa, SOFA_SLOT_STRING, Value::from(text))?;
        self.write_slot(sofa, SOFA_SLOT_URI, Value::Null)?;
        self.write_slot(sofa, SOFA_SLOT_ARRAY, Value::Null)?;
        self.write_slot(sofa, SOFA_SLOT_MIME, mime.map_or(Value::Null, Value::from))
    }

    /// Point the view at remote data; the view has no text afterwards
    pub fn set_sofa_data_uri(&mut self, view: &str, uri: &str, mime: Option<&str>) -> Result<()> {
        let sofa = {
            let v = self.view_mut(view);
            v.text_len = None;
            v.sofa
        };
        self.write_slot(sofa, SOFA_SLOT_URI, Value::from(uri))?;
        self.write_slot(sofa, SOFA_SLOT_STRING, Value::Null)?;
        self.write_slot(sofa, SOFA_SLOT_ARRAY, Value::Null)?;
        self.write_slot(sofa, SOFA_SLOT_MIME, mime.map_or(Value::Null, Value::from))
    }

    /// Use an array record as the view data; the view has no text afterwards
    pub fn set_sofa_data_array(&mut self, view: &str, array: FsId, mime: Option<&str>) -> Result<()> {
        self.array(array)?;
        let sofa = {
            let v = self.view_mut(view);
            v.text_len = None;
            v.sofa
        };
        self.write_slot(sofa, SOFA_SLOT_ARRAY, Value::Ref(array))?;
        self.write_slot(sofa, SOFA_SLOT_STRING, Value::Null)?;
        self.write_slot(sofa, SOFA_SLOT_URI, Value::Null)?;
        self.write_slot(sofa, SOFA_SLOT_MIME, mime.map_or(Value::Null, Value::from))
    }

    /// Text of a view
    pub fn document_text(&self, view: &str) -> Option<&str> {
        self.sofa_slot(view, SOFA_SLOT_STRING)?.as_str()
    }

    /// MIME type of the view data
    pub fn sofa_mime_type(&self, view: &str) -> Option<&str> {
        self.sofa_slot(view, SOFA_SLOT_MIME)?.as_str()
    }

    /// Remote data location of a view
    pub fn sofa_data_uri(&self, view: &str) -> Option<&str> {
        self.sofa_slot(view, SOFA_SLOT_URI)?.as_str()
    }

    /// Array record holding the view data
    pub fn sofa_data_array(&self, view: &str) -> Option<FsId> {
        self.sofa_slot(view, SOFA_SLOT_ARRAY)?.as_fs()
    }

    /// Language of the view's primary document annotation
    pub fn document_language(&self, view: &str) -> String {
        self.view(view)
            .and_then(|v| v.document_annotation())
            .and_then(|id| self.record(id).ok()?.slot(DOCUMENT_SLOT_LANGUAGE)?.as_str())
            .unwrap_or(DEFAULT_LANGUAGE)
            .to_string()
    }

    /// Set the language on the view's primary document annotation
    pub fn set_document_language(&mut self, view: &str, language: &str) -> Result<()> {
        let id = self.document_annotation(view)?;
        self.write_slot(id, DOCUMENT_SLOT_LANGUAGE, Value::from(language))
    }

    /// Primary document annotation of a view, created over the whole text
    /// if the view has none
    pub fn document_annotation(&mut self, view: &str) -> Result<FsId> {
        match self.view_mut(view).document_annotation() {
            Some(id) => Ok(id),
            None => self.create_document_annotation(view, builtin::DOCUMENT_ANNOTATION),
        }
    }

    /// Decide which record stands for an incoming document annotation of
    /// type `t` while loading content into `view`.
    ///
    /// - no primary yet: a new record of type `t` becomes primary;
    /// - primary already settled during this load: a plain extra record;
    /// - primary of the same type: the primary is reused;
    /// - primary of another type: it leaves the index and a new primary
    ///   of type `t` replaces it.
    ///
    /// Every case but the extra one settles the view in `marks`.
    pub fn reconcile_document_annotation(
        &mut self,
        view: &str,
        t: TypeId,
        marks: &mut DocumentAnnotationMarks,
    ) -> Result<FsId> {
        self.type_system.check(t)?;
        if !self.type_system.subsumes(builtin::DOCUMENT_ANNOTATION, t) {
            return Err(GraphError::TypeMismatch {
                feature: "%TYPE".to_string(),
                expected: builtin::TYPE_NAME_DOCUMENT_ANNOTATION.to_string(),
                actual: self.type_system.type_name(t).to_string(),
            }
            .into());
        }
        if marks.is_finalized(view) {
            return self.create_instance(t);
        }

        let id = match self.view_mut(view).document_annotation() {
            None => self.create_document_annotation(view, t)?,
            Some(existing) if self.type_of(existing)? == t => existing,
            Some(existing) => {
                self.remove_from_indexes(existing, view)?;
                let replacement = self.create_document_annotation(view, t)?;
                warn!(
                    view,
                    replaced = existing.get(),
                    replacement = replacement.get(),
                    type_name = self.type_system.type_name(t),
                    "document annotation replaced by a different type"
                );
                replacement
            }
        };
        marks.mark(view);
        Ok(id)
    }

    fn create_document_annotation(&mut self, view: &str, t: TypeId) -> Result<FsId> {
        let id = self.create_instance(t)?;
        let length = self.view_mut(view).text_len.unwrap_or_default();
        self.write_slot(id, DOCUMENT_SLOT_LANGUAGE, Value::from(DEFAULT_LANGUAGE))?;
        self.set_span(id, Span::new(0, length as i32))?;
        self.add_to_indexes(id, view)?;
        self.view_mut(view).document_annotation = Some(id);
        Ok(id)
    }

    fn sofa_slot(&self, view: &str, slot: usize) -> Option<&Value> {
        let sofa = self.view(view)?.sofa;
        self.record(sofa).ok()?.slot(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cas::tests::sample_type_system;
    use crate::core::error::Error;
    use crate::types::builtin::{ANNOTATION, INITIAL_VIEW_NAME, INTEGER_ARRAY, STRING};
    use crate::types::TypeSystem;
    use std::sync::Arc;

    #[test]
    fn test_document_text_creates_document_annotation() {
        let mut cas = Cas::new(sample_type_system()).unwrap();
        cas.set_document_text(INITIAL_VIEW_NAME, "caf\u{00E9} au lait").unwrap();

        let doc = cas.document_annotation(INITIAL_VIEW_NAME).unwrap();
        assert_eq!(cas.type_of(doc).unwrap(), builtin::DOCUMENT_ANNOTATION);
        assert_eq!(cas.span(doc).unwrap(), Span::new(0, 12));
        assert_eq!(cas.document_language(INITIAL_VIEW_NAME), DEFAULT_LANGUAGE);
        assert_eq!(cas.sofa_mime_type(INITIAL_VIEW_NAME), Some(TEXT_MIME_TYPE));
        assert!(cas.is_indexed(doc, INITIAL_VIEW_NAME));

        cas.set_document_text(INITIAL_VIEW_NAME, "short").unwrap();
        assert_eq!(cas.document_annotation(INITIAL_VIEW_NAME).unwrap(), doc);
        assert_eq!(cas.span(doc).unwrap(), Span::new(0, 5));
    }

    #[test]
    fn test_shorter_text_rejected_while_spans_reach_past_it() {
        let mut cas = Cas::new(sample_type_system()).unwrap();
        cas.set_document_text(INITIAL_VIEW_NAME, "hello world").unwrap();
        let token_type = cas.type_system().type_by_name("example.Token").unwrap();
        let token = cas.create_instance(token_type).unwrap();
        cas.set_span(token, Span::new(6, 11)).unwrap();
        cas.add_to_indexes(token, INITIAL_VIEW_NAME).unwrap();
        let doc = cas.document_annotation(INITIAL_VIEW_NAME).unwrap();

        let err = cas.set_document_text(INITIAL_VIEW_NAME, "hi").unwrap_err();
        assert!(matches!(
            err,
            Error::Graph(GraphError::InvalidSpan { begin: 6, end: 11, length: 2 })
        ));
        assert_eq!(cas.document_text(INITIAL_VIEW_NAME), Some("hello world"));
        assert_eq!(cas.view(INITIAL_VIEW_NAME).unwrap().text_len(), Some(11));
        assert_eq!(cas.span(doc).unwrap(), Span::new(0, 11));

        // the primary document annotation is stretched, not checked
        cas.set_document_text(INITIAL_VIEW_NAME, "hello there").unwrap();
        assert_eq!(cas.span(token).unwrap(), Span::new(6, 11));

        // unindexed annotations do not constrain the text
        cas.remove_from_indexes(token, INITIAL_VIEW_NAME).unwrap();
        cas.set_document_text(INITIAL_VIEW_NAME, "hi").unwrap();
        assert_eq!(cas.span(doc).unwrap(), Span::new(0, 2));
    }

    #[test]
    fn test_writing_text_alone_leaves_index_untouched() {
        let mut cas = Cas::new(sample_type_system()).unwrap();
        cas.write_sofa_string(INITIAL_VIEW_NAME, "plain", Some(TEXT_MIME_TYPE)).unwrap();
        assert_eq!(cas.document_text(INITIAL_VIEW_NAME), Some("plain"));
        assert_eq!(cas.view(INITIAL_VIEW_NAME).unwrap().text_len(), Some(5));
        assert!(cas.members(INITIAL_VIEW_NAME).is_empty());
        assert!(cas.view(INITIAL_VIEW_NAME).unwrap().document_annotation().is_none());
    }

    #[test]
    fn test_document_language() {
        let mut cas = Cas::new(sample_type_system()).unwrap();
        cas.set_document_text(INITIAL_VIEW_NAME, "hallo").unwrap();
        cas.set_document_language(INITIAL_VIEW_NAME, "de").unwrap();
        assert_eq!(cas.document_language(INITIAL_VIEW_NAME), "de");
        assert_eq!(cas.document_language("missing"), DEFAULT_LANGUAGE);
    }

    #[test]
    fn test_sofa_uri_and_array() {
        let mut cas = Cas::new(sample_type_system()).unwrap();
        cas.set_sofa_data_uri("audio", "file:///tmp/a.wav", Some("audio/wav")).unwrap();
        assert_eq!(cas.sofa_data_uri("audio"), Some("file:///tmp/a.wav"));
        assert!(cas.document_text("audio").is_none());
        assert!(cas.view("audio").unwrap().document_annotation().is_none());

        let array = cas.create_array(INTEGER_ARRAY, 4).unwrap();
        cas.set_sofa_data_array("signal", array, None).unwrap();
        assert_eq!(cas.sofa_data_array("signal"), Some(array));

        let not_array = cas.document_annotation(INITIAL_VIEW_NAME).unwrap();
        assert!(matches!(
            cas.set_sofa_data_array("signal", not_array, None),
            Err(Error::Graph(GraphError::NotAnArray { .. }))
        ));
    }

    fn with_custom_document_type() -> (Arc<TypeSystem>, TypeId) {
        let mut ts = TypeSystem::new();
        let meta = ts.add_type("example.DocumentMetaData", builtin::DOCUMENT_ANNOTATION).unwrap();
        ts.add_feature(meta, "documentTitle", STRING).unwrap();
        ts.add_type("example.Token", ANNOTATION).unwrap();
        ts.commit().unwrap();
        (Arc::new(ts), meta)
    }

    #[test]
    fn test_reconcile_same_type_reuses() {
        let (ts, _) = with_custom_document_type();
        let mut cas = Cas::new(ts).unwrap();
        cas.set_document_text(INITIAL_VIEW_NAME, "text").unwrap();
        let existing = cas.document_annotation(INITIAL_VIEW_NAME).unwrap();

        let mut marks = DocumentAnnotationMarks::new();
        let got = cas
            .reconcile_document_annotation(INITIAL_VIEW_NAME, builtin::DOCUMENT_ANNOTATION, &mut marks)
            .unwrap();
        assert_eq!(got, existing);
        assert!(marks.is_finalized(INITIAL_VIEW_NAME));

        let extra = cas
            .reconcile_document_annotation(INITIAL_VIEW_NAME, builtin::DOCUMENT_ANNOTATION, &mut marks)
            .unwrap();
        assert_ne!(extra, existing);
        assert!(!cas.is_indexed(extra, INITIAL_VIEW_NAME));
        assert_eq!(cas.document_annotation(INITIAL_VIEW_NAME).unwrap(), existing);
    }

    #[test]
    fn test_reconcile_other_type_replaces() {
        let (ts, meta) = with_custom_document_type();
        let mut cas = Cas::new(ts).unwrap();
        cas.set_document_text(INITIAL_VIEW_NAME, "text").unwrap();
        let implicit = cas.document_annotation(INITIAL_VIEW_NAME).unwrap();

        let mut marks = DocumentAnnotationMarks::new();
        let replacement = cas
            .reconcile_document_annotation(INITIAL_VIEW_NAME, meta, &mut marks)
            .unwrap();

        assert_ne!(replacement, implicit);
        assert!(!cas.is_indexed(implicit, INITIAL_VIEW_NAME));
        assert!(cas.is_indexed(replacement, INITIAL_VIEW_NAME));
        assert_eq!(cas.document_annotation(INITIAL_VIEW_NAME).unwrap(), replacement);
        assert_eq!(cas.select(INITIAL_VIEW_NAME, builtin::DOCUMENT_ANNOTATION), vec![replacement]);
    }

    #[test]
    fn test_reconcile_without_primary() {
        let (ts, meta) = with_custom_document_type();
        let mut cas = Cas::new(ts).unwrap();
        let mut marks = DocumentAnnotationMarks::new();
        let id = cas.reconcile_document_annotation("fresh", meta, &mut marks).unwrap();
        assert_eq!(cas.view("fresh").unwrap().document_annotation(), Some(id));
        assert!(marks.is_finalized("fresh"));
        assert!(!marks.is_finalized(INITIAL_VIEW_NAME));
    }

    #[test]
    fn test_removed_primary_is_recreated() {
        let mut cas = Cas::new(sample_type_system()).unwrap();
        cas.set_document_text(INITIAL_VIEW_NAME, "abc").unwrap();
        let first = cas.document_annotation(INITIAL_VIEW_NAME).unwrap();
        cas.remove_from_indexes(first, INITIAL_VIEW_NAME).unwrap();
        let second = cas.document_annotation(INITIAL_VIEW_NAME).unwrap();
        assert_ne!(first, second);
        assert_eq!(cas.span(second).unwrap(), Span::new(0, 3));
    }
}
