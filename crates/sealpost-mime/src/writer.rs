//! Serialization of a part tree into multipart wire text.
//!
//! Output uses bare `\n` line endings; converting to CRLF is left to
//! the transport.

use std::io::Write;

use crate::content_type::with_boundary;
use crate::error::{Error, Result};
use crate::header::CONTENT_TYPE;
use crate::part::{Content, PartId, PartTree};

/// Writes the whole tree, starting at the root.
///
/// # Errors
///
/// Returns [`Error::InvalidValue`] for a container whose Content-Type
/// is blank, [`Error::Inconsistent`] for siblings with no enclosing
/// container and [`Error::ResourceExhausted`] if the sink fails.
pub fn write_tree<W: Write + ?Sized>(tree: &PartTree, out: &mut W) -> Result<()> {
    write_chain(tree, None, PartId::ROOT, out)
}

/// Writes the sibling chain starting at `first`; `parent` is the
/// container holding it.
fn write_chain<W: Write + ?Sized>(
    tree: &PartTree,
    parent: Option<PartId>,
    first: PartId,
    out: &mut W,
) -> Result<()> {
    for id in tree.siblings(first) {
        let part = tree.node(id);

        for header in part.headers() {
            match part.container() {
                Some(container) if header.name == CONTENT_TYPE => {
                    let value = with_boundary(&header.value, &container.boundary)?;
                    writeln!(out, "{}: {value}", header.name)?;
                }
                _ => writeln!(out, "{}: {}", header.name, header.value)?,
            }
        }
        out.write_all(b"\n")?;

        match part.content() {
            Content::Empty => {}
            Content::Body(body) => out.write_all(body)?,
            Content::Multipart(container) => {
                write!(out, "\n--{}\n", container.boundary)?;
                write_chain(tree, Some(id), container.first_child, out)?;
                write!(out, "\n--{}--\n", container.boundary)?;
            }
        }

        if part.next().is_some() {
            let boundary = parent
                .and_then(|p| tree.node(p).boundary())
                .ok_or_else(|| {
                    Error::Inconsistent("sibling part outside of a container".to_string())
                })?;
            write!(out, "\n--{boundary}\n")?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn render(tree: &PartTree) -> Result<String> {
        let mut out = Vec::new();
        write_tree(tree, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_single_part() {
        let mut tree = PartTree::new();
        tree.root_mut().headers.append("content-type", "text/plain").unwrap();
        tree.root_mut().content = Content::Body(b"hello\n".to_vec());

        assert_eq!(render(&tree).unwrap(), "Content-Type: text/plain\n\nhello\n");
    }

    #[test]
    fn test_empty_root() {
        let tree = PartTree::new();
        assert_eq!(render(&tree).unwrap(), "\n");
    }

    #[test]
    fn test_container_layout() {
        let mut tree = PartTree::new();
        tree.root_mut()
            .headers
            .append("Content-Type", "multipart/mixed")
            .unwrap();
        tree.reserve(1).unwrap();
        let first = tree.make_container(PartId::ROOT, "multipart/mixed".into(), "B".into());
        tree.part_mut(first).content = Content::Body(b"a".to_vec());
        let second = tree.append_sibling(first).unwrap();
        tree.part_mut(second).content = Content::Body(b"b".to_vec());

        let expected = "Content-Type: multipart/mixed;\n\tboundary=\"B\"\n\n\
                        \n--B\n\na\n--B\n\nb\n--B--\n";
        assert_eq!(render(&tree).unwrap(), expected);
    }

    #[test]
    fn test_blank_container_content_type() {
        let mut tree = PartTree::new();
        tree.root_mut().headers.append("Content-Type", "  ").unwrap();
        tree.reserve(1).unwrap();
        let _ = tree.make_container(PartId::ROOT, "multipart/mixed".into(), "B".into());

        assert_eq!(render(&tree).unwrap_err().kind(), ErrorKind::InvalidValue);
    }

    #[test]
    fn test_root_sibling_is_inconsistent() {
        let mut tree = PartTree::new();
        tree.root_mut().content = Content::Body(b"a".to_vec());
        let stray = tree.append_sibling(PartId::ROOT).unwrap();
        tree.part_mut(stray).content = Content::Body(b"b".to_vec());

        let err = render(&tree).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Inconsistent);
    }

    #[test]
    fn test_sink_failure() {
        struct Broken;

        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("sink closed"))
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let mut tree = PartTree::new();
        tree.root_mut().headers.append("Subject", "x").unwrap();
        let err = write_tree(&tree, &mut Broken).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ResourceExhausted);
    }
}
