//! Containment tree over the annotations of a view

use crate::index::span::Span;
use crate::types::FsId;
use std::collections::HashMap;

/// Node of an [`AnnotationTree`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeNode {
    id: FsId,
    span: Span,
    parent: Option<usize>,
    children: Vec<usize>,
    depth: usize,
}

impl TreeNode {
    /// Annotation at this node
    pub fn id(&self) -> FsId {
        self.id
    }

    /// Span of the annotation when the tree was built
    pub fn span(&self) -> Span {
        self.span
    }

    /// Distance from the root
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of children
    pub fn child_count(&self) -> usize {
        self.children.len()
    }
}

/// Annotations grouped by containment.
///
/// A node's children are the annotations it contains with no other
/// annotation of the tree in between, in index order.
#[derive(Clone, Debug)]
pub struct AnnotationTree {
    nodes: Vec<TreeNode>,
    by_id: HashMap<FsId, usize>,
}

impl AnnotationTree {
    /// Build a tree from a root and candidates sorted in index order
    /// (begin ascending, end descending).
    ///
    /// Candidates the root does not cover, and the root itself, are skipped.
    pub fn build<I>(root: (FsId, Span), ordered: I) -> Self
    where
        I: IntoIterator<Item = (FsId, Span)>,
    {
        let mut nodes = vec![TreeNode {
            id: root.0,
            span: root.1,
            parent: None,
            children: Vec::new(),
            depth: 0,
        }];
        let mut by_id = HashMap::new();
        by_id.insert(root.0, 0);

        let mut ancestry: Vec<usize> = vec![0];
        for (id, span) in ordered {
            if id == root.0 || !root.1.covers(&span) {
                continue;
            }
            while ancestry.len() > 1 {
                let top = ancestry[ancestry.len() - 1];
                if nodes[top].span.covers(&span) {
                    break;
                }
                ancestry.pop();
            }
            let parent = ancestry[ancestry.len() - 1];
            let index = nodes.len();
            let depth = nodes[parent].depth + 1;
            nodes.push(TreeNode {
                id,
                span,
                parent: Some(parent),
                children: Vec::new(),
                depth,
            });
            nodes[parent].children.push(index);
            by_id.insert(id, index);
            ancestry.push(index);
        }

        Self { nodes, by_id }
    }

    /// Root node
    pub fn root(&self) -> &TreeNode {
        &self.nodes[0]
    }

    /// Node holding `id`
    pub fn node(&self, id: FsId) -> Option<&TreeNode> {
        self.by_id.get(&id).map(|&i| &self.nodes[i])
    }

    /// Children of `node` in index order
    pub fn children<'a>(&'a self, node: &'a TreeNode) -> impl Iterator<Item = &'a TreeNode> + 'a {
        node.children.iter().map(move |&i| &self.nodes[i])
    }

    /// Parent of `node`, `None` for the root
    pub fn parent(&self, node: &TreeNode) -> Option<&TreeNode> {
        node.parent.map(|i| &self.nodes[i])
    }

    /// Pre-order traversal starting at the root
    pub fn depth_first(&self) -> Vec<&TreeNode> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![0usize];
        while let Some(i) = stack.pop() {
            let node = &self.nodes[i];
            out.push(node);
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    /// Number of nodes, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false; a tree has at least its root
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u32) -> FsId {
        FsId(n)
    }

    #[test]
    fn test_nested_children() {
        // doc [0,20) > sentence [0,10) > tokens [0,4) [5,10); sentence [11,20) > token [11,20)
        let ordered = vec![
            (id(2), Span::new(0, 10)),
            (id(3), Span::new(0, 4)),
            (id(4), Span::new(5, 10)),
            (id(5), Span::new(11, 20)),
            (id(6), Span::new(11, 20)),
        ];
        let tree = AnnotationTree::build((id(1), Span::new(0, 20)), ordered);

        let root = tree.root();
        let top: Vec<FsId> = tree.children(root).map(TreeNode::id).collect();
        assert_eq!(top, vec![id(2), id(5)]);

        let first = tree.node(id(2)).unwrap();
        let tokens: Vec<FsId> = tree.children(first).map(TreeNode::id).collect();
        assert_eq!(tokens, vec![id(3), id(4)]);

        let same_span = tree.node(id(6)).unwrap();
        assert_eq!(tree.parent(same_span).map(TreeNode::id), Some(id(5)));
        assert_eq!(same_span.depth(), 2);

        let order: Vec<FsId> = tree.depth_first().into_iter().map(TreeNode::id).collect();
        assert_eq!(order, vec![id(1), id(2), id(3), id(4), id(5), id(6)]);
    }

    #[test]
    fn test_root_filters_uncovered() {
        let ordered = vec![(id(2), Span::new(0, 3)), (id(3), Span::new(4, 6)), (id(4), Span::new(5, 9))];
        let tree = AnnotationTree::build((id(3), Span::new(4, 6)), ordered);
        assert_eq!(tree.len(), 1);
        assert!(tree.node(id(2)).is_none());
    }

    #[test]
    fn test_overlapping_siblings() {
        let ordered = vec![(id(2), Span::new(0, 5)), (id(3), Span::new(3, 8))];
        let tree = AnnotationTree::build((id(1), Span::new(0, 10)), ordered);
        let top: Vec<FsId> = tree.children(tree.root()).map(TreeNode::id).collect();
        assert_eq!(top, vec![id(2), id(3)]);
    }
}
