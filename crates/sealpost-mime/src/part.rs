//! The MIME part tree.
//!
//! Parts live in an arena owned by [`PartTree`] and refer to each other
//! by [`PartId`]. A part links to its first child (when it is a
//! container) and to its next sibling; there are no parent links.

use std::fmt::{self, Write as _};

use crate::error::{Error, Result};
use crate::header::Headers;

/// Handle of a part inside a [`PartTree`]. The default is the root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PartId(usize);

impl PartId {
    /// The root part of every tree.
    pub const ROOT: Self = Self(0);

    /// Returns the arena index of this part.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Multipart container state of a part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    /// Media type, e.g. `multipart/mixed`.
    pub mediatype: String,
    /// Boundary delimiter separating the children.
    pub boundary: String,
    /// First nested part.
    pub first_child: PartId,
}

/// What a part carries after its headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Content {
    /// Nothing yet.
    #[default]
    Empty,
    /// Opaque, already transfer-encoded bytes.
    Body(Vec<u8>),
    /// Nested parts.
    Multipart(Container),
}

/// One node of the tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Part {
    pub(crate) headers: Headers,
    pub(crate) content: Content,
    pub(crate) next: Option<PartId>,
}

impl Part {
    /// Returns the headers in output order.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Returns what follows the headers.
    #[must_use]
    pub const fn content(&self) -> &Content {
        &self.content
    }

    /// Returns the body, if one has been added.
    #[must_use]
    pub fn body(&self) -> Option<&[u8]> {
        match &self.content {
            Content::Body(body) => Some(body),
            _ => None,
        }
    }

    /// Returns the container state, if this part is a container.
    #[must_use]
    pub const fn container(&self) -> Option<&Container> {
        match &self.content {
            Content::Multipart(container) => Some(container),
            _ => None,
        }
    }

    /// Returns the first nested part of a container.
    #[must_use]
    pub fn child(&self) -> Option<PartId> {
        self.container().map(|c| c.first_child)
    }

    /// Returns the container media type.
    #[must_use]
    pub fn mediatype(&self) -> Option<&str> {
        self.container().map(|c| c.mediatype.as_str())
    }

    /// Returns the container boundary.
    #[must_use]
    pub fn boundary(&self) -> Option<&str> {
        self.container().map(|c| c.boundary.as_str())
    }

    /// Returns the following sibling in the same container.
    #[must_use]
    pub const fn next(&self) -> Option<PartId> {
        self.next
    }

    /// Checks whether a body has been added.
    #[must_use]
    pub const fn has_body(&self) -> bool {
        matches!(self.content, Content::Body(_))
    }
}

/// Arena holding all parts of one message. The root always exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartTree {
    parts: Vec<Part>,
}

impl Default for PartTree {
    fn default() -> Self {
        Self::new()
    }
}

impl PartTree {
    /// Creates a tree consisting of an empty root part.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parts: vec![Part::default()],
        }
    }

    /// Returns a part by handle, or `None` if the handle belongs to
    /// another tree.
    #[must_use]
    pub fn part(&self, id: PartId) -> Option<&Part> {
        self.parts.get(id.0)
    }

    /// Returns a part by a handle this tree handed out.
    pub(crate) fn node(&self, id: PartId) -> &Part {
        &self.parts[id.0]
    }

    pub(crate) fn part_mut(&mut self, id: PartId) -> &mut Part {
        &mut self.parts[id.0]
    }

    /// Returns the root part.
    #[must_use]
    pub fn root(&self) -> &Part {
        self.node(PartId::ROOT)
    }

    pub(crate) fn root_mut(&mut self) -> &mut Part {
        self.part_mut(PartId::ROOT)
    }

    /// Returns the number of parts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Always `false`: a tree has at least its root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Iterates over a sibling chain starting at `first`.
    ///
    /// Yields nothing for a handle that does not belong to this tree.
    pub fn siblings(&self, first: PartId) -> impl Iterator<Item = PartId> + '_ {
        let start = self.part(first).map(|_| first);
        std::iter::successors(start, move |id| self.part(*id).and_then(Part::next))
    }

    /// Finds the container holding `needle`.
    ///
    /// Returns `None` for the root and for top-level parts.
    #[must_use]
    pub fn find_parent(&self, needle: PartId) -> Option<PartId> {
        self.parts.iter().enumerate().find_map(|(index, part)| {
            part.child()
                .filter(|first| self.siblings(*first).any(|id| id == needle))
                .map(|_| PartId(index))
        })
    }

    /// Makes room for `additional` parts without reallocating later.
    pub(crate) fn reserve(&mut self, additional: usize) -> Result<()> {
        self.parts
            .try_reserve(additional)
            .map_err(Error::out_of_memory)
    }

    /// Appends an empty sibling after `after` and returns it.
    pub(crate) fn append_sibling(&mut self, after: PartId) -> Result<PartId> {
        debug_assert!(self.node(after).next.is_none());
        self.reserve(1)?;
        let id = PartId(self.parts.len());
        self.parts.push(Part::default());
        self.part_mut(after).next = Some(id);
        Ok(id)
    }

    /// Turns the empty part `id` into a container and returns its first child.
    ///
    /// Callers must have reserved room for one part beforehand.
    pub(crate) fn make_container(
        &mut self,
        id: PartId,
        mediatype: String,
        boundary: String,
    ) -> PartId {
        debug_assert!(matches!(self.node(id).content, Content::Empty));
        let child = PartId(self.parts.len());
        self.parts.push(Part::default());
        self.part_mut(id).content = Content::Multipart(Container {
            mediatype,
            boundary,
            first_child: child,
        });
        child
    }

    /// Renders the tree structure for diagnostics.
    ///
    /// Each part shows as `[part]` followed by its headers, its body
    /// size, and for containers a `[container]` line with the nested
    /// parts indented one level deeper.
    #[must_use]
    pub fn dump(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.dump_chain(&mut out, PartId::ROOT, 0);
        out
    }

    fn dump_chain(&self, out: &mut String, first: PartId, level: usize) -> fmt::Result {
        let indent = level * 2;
        for id in self.siblings(first) {
            let part = self.node(id);
            writeln!(out, "{:indent$}[part]", "")?;
            for header in &part.headers {
                writeln!(out, "{:indent$}{}: {}", "", header.name, header.value)?;
            }
            match &part.content {
                Content::Empty => writeln!(out, "{:indent$}[no body]", "")?,
                Content::Body(body) => writeln!(out, "{:indent$}[body {} bytes]", "", body.len())?,
                Content::Multipart(container) => {
                    writeln!(out, "{:indent$}[container {}]", "", container.boundary)?;
                    self.dump_chain(out, container.first_child, level + 1)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::similar_names)]
mod tests {
    use super::*;

    fn nested_tree() -> (PartTree, PartId, PartId, PartId) {
        let mut tree = PartTree::new();
        tree.reserve(1).unwrap();
        let outer_child = tree.make_container(PartId::ROOT, "multipart/mixed".into(), "B1".into());
        let sibling = tree.append_sibling(outer_child).unwrap();
        tree.reserve(1).unwrap();
        let inner_child = tree.make_container(sibling, "multipart/alternative".into(), "B2".into());
        (tree, outer_child, sibling, inner_child)
    }

    #[test]
    fn test_new_tree_has_root() {
        let tree = PartTree::new();
        assert_eq!(tree.len(), 1);
        assert!(!tree.is_empty());
        assert_eq!(tree.root().content(), &Content::Empty);
        assert!(tree.root().next().is_none());
    }

    #[test]
    fn test_find_parent() {
        let (tree, outer_child, sibling, inner_child) = nested_tree();
        assert_eq!(tree.find_parent(PartId::ROOT), None);
        assert_eq!(tree.find_parent(outer_child), Some(PartId::ROOT));
        assert_eq!(tree.find_parent(sibling), Some(PartId::ROOT));
        assert_eq!(tree.find_parent(inner_child), Some(sibling));
    }

    #[test]
    fn test_container_accessors() {
        let (tree, outer_child, sibling, inner_child) = nested_tree();
        let root = tree.root();
        assert_eq!(root.child(), Some(outer_child));
        assert_eq!(root.mediatype(), Some("multipart/mixed"));
        assert_eq!(root.boundary(), Some("B1"));
        assert!(root.body().is_none());

        let siblings: Vec<_> = tree.siblings(outer_child).collect();
        assert_eq!(siblings, [outer_child, sibling]);
        assert_eq!(tree.part(sibling).unwrap().child(), Some(inner_child));
    }

    #[test]
    fn test_foreign_handle() {
        let (big, _, _, inner_child) = nested_tree();
        let small = PartTree::new();

        assert!(big.part(inner_child).is_some());
        assert!(small.part(inner_child).is_none());
        assert_eq!(small.siblings(inner_child).count(), 0);
        assert_eq!(small.find_parent(inner_child), None);
    }

    #[test]
    fn test_dump() {
        let (mut tree, outer_child, _, _) = nested_tree();
        tree.root_mut().headers.append("subject", "hi").unwrap();
        tree.part_mut(outer_child).content = Content::Body(b"abc".to_vec());

        let dump = tree.dump();
        let expected = "\
[part]
Subject: hi
[container B1]
  [part]
  [body 3 bytes]
  [part]
  [container B2]
    [part]
    [no body]
";
        assert_eq!(dump, expected);
    }
}
