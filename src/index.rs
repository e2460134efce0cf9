//! Annotation indexes, span relations and containment trees

pub mod repository;
pub mod span;
pub mod tree;

pub use repository::{AnnotationKey, IndexRepository, MergedAnnotations};
pub use span::Span;
pub use tree::{AnnotationTree, TreeNode};
