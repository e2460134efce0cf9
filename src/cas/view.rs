//! Views ("subjects of analysis")

use crate::index::IndexRepository;
use crate::types::FsId;

/// Named partition of a graph with its own sofa record and index
#[derive(Clone, Debug)]
pub struct View {
    pub(crate) name: String,
    pub(crate) sofa: FsId,
    pub(crate) sofa_num: i32,
    /// Text length in code points, `None` while the view has no text
    pub(crate) text_len: Option<usize>,
    pub(crate) document_annotation: Option<FsId>,
    pub(crate) index: IndexRepository,
}

impl View {
    pub(crate) fn new(name: &str, sofa: FsId, sofa_num: i32) -> Self {
        Self {
            name: name.to_string(),
            sofa,
            sofa_num,
            text_len: None,
            document_annotation: None,
            index: IndexRepository::new(),
        }
    }

    /// View name (the sofa id)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sofa record owned by this view
    pub fn sofa(&self) -> FsId {
        self.sofa
    }

    /// Sofa number, assigned in view creation order from 1
    pub fn sofa_num(&self) -> i32 {
        self.sofa_num
    }

    /// Length of the document text in code points
    pub fn text_len(&self) -> Option<usize> {
        self.text_len
    }

    /// Primary document annotation, if one exists and is still indexed
    pub fn document_annotation(&self) -> Option<FsId> {
        self.document_annotation
            .filter(|id| self.index.contains(*id))
    }

    /// Index repository of this view
    pub fn index(&self) -> &IndexRepository {
        &self.index
    }

    /// Number of indexed records
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// True if nothing is indexed in this view
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// True if `id` is indexed in this view
    pub fn contains(&self, id: FsId) -> bool {
        self.index.contains(id)
    }
}
