//! Canonical node identity.
//!
//! A node's canonical id is derived from its position in the tree: the root
//! is `r`, the children of a split are `<parent>/0` and `<parent>/1`. Ids
//! are never stored on nodes; [`walk`] computes them during traversal, so
//! identity is purely structural and cannot drift. Ratio, gutter, divider,
//! and element edits leave every id unchanged; only structural edits move
//! them.

use super::model::Node;

/// Depth-first pre-order iterator over `(canonical id, node)` pairs.
pub struct NodeIter<'a> {
    stack: Vec<(String, &'a Node)>,
}

impl<'a> Iterator for NodeIter<'a> {
    type Item = (String, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        let (id, node) = self.stack.pop()?;
        if let Node::Split(split) = node {
            // Push in reverse so child 0 is visited first.
            for (i, child) in split.children.iter().enumerate().rev() {
                self.stack.push((format!("{id}/{i}"), child));
            }
        }
        Some((id, node))
    }
}

/// Iterate the tree rooted at `root` as `(canonical id, node)` pairs.
pub fn walk(root: &Node) -> NodeIter<'_> {
    NodeIter {
        stack: vec![("r".to_owned(), root)],
    }
}

/// Find a node by its alias, returning its canonical id.
pub fn find_by_alias<'a>(root: &'a Node, alias: &str) -> Option<(String, &'a Node)> {
    walk(root).find(|(_, node)| node.alias() == Some(alias))
}
