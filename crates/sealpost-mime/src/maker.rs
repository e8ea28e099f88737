//! Incremental MIME message builder.

use std::io::{Read, Write};

use chrono::Utc;
use tracing::{debug, info};

use crate::boundary::BoundaryGenerator;
use crate::config::{Config, Verbosity};
use crate::error::{Error, Result};
use crate::header::{CONTENT_TYPE, DATE, MIME_VERSION, capitalize};
use crate::part::{Content, PartId, PartTree};
use crate::writer::write_tree;

/// RFC 5322 date format used for the default `Date` header.
const RFC5322_DATE: &str = "%a, %d %b %Y %H:%M:%S %z";

/// Builds a MIME tree from a sequence of calls and writes it out.
///
/// Headers and bodies always go to the *current* part. The first call
/// creates the root part. [`add_container`](Self::add_container) turns
/// the current part into a container and moves into its first child;
/// calling [`add_header`](Self::add_header) after a body has been added
/// inside a container starts the next sibling.
///
/// ```
/// use sealpost_mime::MimeMaker;
///
/// let mut maker = MimeMaker::new();
/// maker.add_header("From", "alice@example.org")?;
/// maker.add_container(Some("multipart/signed; protocol=\"application/pgp-signature\""))?;
/// maker.add_header("Content-Type", "text/plain")?;
/// maker.add_body("Hello\n")?;
/// maker.add_header("Content-Type", "application/pgp-signature")?;
/// maker.add_body("-----BEGIN PGP SIGNATURE-----\n...\n")?;
///
/// let text = String::from_utf8(maker.render()?).unwrap();
/// assert!(text.starts_with("From: alice@example.org\n"));
/// # Ok::<(), sealpost_mime::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct MimeMaker {
    config: Config,
    tree: Option<PartTree>,
    current: PartId,
    boundaries: BoundaryGenerator,
}

impl MimeMaker {
    /// Creates an empty builder with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty builder with the given configuration.
    #[must_use]
    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Sets the diagnostic level from a number; see [`Verbosity::from_level`].
    pub fn set_verbose(&mut self, level: u32) {
        self.config.verbosity = Verbosity::from_level(level);
    }

    /// Returns the tree, or `None` if nothing has been added yet.
    #[must_use]
    pub const fn tree(&self) -> Option<&PartTree> {
        self.tree.as_ref()
    }

    /// Returns the part the next call applies to.
    #[must_use]
    pub fn current(&self) -> Option<PartId> {
        self.tree.as_ref().map(|_| self.current)
    }

    /// Checks whether no call has created the tree yet.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.tree.is_none()
    }

    fn ensure_root(tree: &mut Option<PartTree>) -> &mut PartTree {
        tree.get_or_insert_with(|| {
            debug!("Creating MIME root part");
            PartTree::new()
        })
    }

    /// Adds a header to the current part.
    ///
    /// If the current part already has a body and sits in a container,
    /// a new sibling part is started first. Passing an empty `name` and
    /// `value` only does that: it starts a part without headers.
    ///
    /// Adding a `Content-Type` also adds `MIME-Version: 1.0` to the root
    /// part unless the root already has one. The value of a container's
    /// Content-Type must not carry a `boundary` parameter; it is added
    /// on output.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conflict`] if the current part is a top-level
    /// part with a body, [`Error::InvalidValue`] for a value without a
    /// name, and [`Error::ResourceExhausted`] on allocation failure.
    pub fn add_header(&mut self, name: &str, value: &str) -> Result<()> {
        let tree = Self::ensure_root(&mut self.tree);
        let parent = tree.find_parent(self.current);

        if tree.node(self.current).has_body() {
            if parent.is_none() {
                return Err(Error::conflict(
                    "a top-level part with a body cannot take another part",
                ));
            }
            self.current = tree.append_sibling(self.current)?;
            debug!(part = self.current.index(), "Started sibling part");
        }

        if name.is_empty() && value.is_empty() {
            return Ok(());
        }
        if name.is_empty() {
            return Err(Error::InvalidValue(format!(
                "header value {value:?} without a name"
            )));
        }

        if capitalize(name) == CONTENT_TYPE && !tree.root().headers().has(MIME_VERSION) {
            tree.root_mut().headers.append(MIME_VERSION, "1.0")?;
        }
        tree.part_mut(self.current).headers.append(name, value)
    }

    /// Starts a new part without headers; same as `add_header("", "")`.
    ///
    /// # Errors
    ///
    /// See [`add_header`](Self::add_header).
    pub fn start_part(&mut self) -> Result<()> {
        self.add_header("", "")
    }

    /// Sets the body of the current part.
    ///
    /// The bytes are copied verbatim; they must already be transfer
    /// encoded. An empty body is still a body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conflict`] if the current part already has a
    /// body and [`Error::ResourceExhausted`] if the copy cannot be
    /// allocated.
    pub fn add_body(&mut self, body: impl AsRef<[u8]>) -> Result<()> {
        let body = body.as_ref();
        self.check_body_slot()?;

        let mut buf = Vec::new();
        buf.try_reserve_exact(body.len())
            .map_err(Error::out_of_memory)?;
        buf.extend_from_slice(body);
        self.set_body(buf);
        Ok(())
    }

    /// Drains `source` and uses its contents as the body of the current
    /// part. The source is consumed even if the body slot is taken.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResourceExhausted`] if reading fails and
    /// [`Error::Conflict`] if the current part already has a body.
    pub fn add_stream<R: Read>(&mut self, mut source: R) -> Result<()> {
        let mut buf = Vec::new();
        source.read_to_end(&mut buf)?;
        self.check_body_slot()?;
        self.set_body(buf);
        Ok(())
    }

    fn check_body_slot(&mut self) -> Result<()> {
        let tree = Self::ensure_root(&mut self.tree);
        match tree.node(self.current).content() {
            Content::Empty => Ok(()),
            Content::Body(_) => Err(Error::conflict("part already has a body")),
            Content::Multipart(_) => Err(Error::conflict("part is a container")),
        }
    }

    fn set_body(&mut self, body: Vec<u8>) {
        let tree = Self::ensure_root(&mut self.tree);
        debug!(part = self.current.index(), len = body.len(), "Adding body");
        tree.part_mut(self.current).content = Content::Body(body);
    }

    /// Turns the current part into a container and moves into its first
    /// child.
    ///
    /// `mediatype` defaults to the configured one (`multipart/mixed`).
    /// If the root part has no Content-Type yet, one with `mediatype` is
    /// added to the root.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conflict`] if the current part has a body or is
    /// already a container, and [`Error::ResourceExhausted`] if entropy
    /// or memory is unavailable. On error the tree is left as it was.
    pub fn add_container(&mut self, mediatype: Option<&str>) -> Result<()> {
        let mediatype = mediatype
            .unwrap_or(self.config.default_mediatype.as_str())
            .to_string();
        let tree = Self::ensure_root(&mut self.tree);

        match tree.node(self.current).content() {
            Content::Empty => {}
            Content::Body(_) => return Err(Error::conflict("part already has a body")),
            Content::Multipart(_) => {
                return Err(Error::conflict("part is already a container"));
            }
        }

        let boundary = self.boundaries.next_boundary()?;
        tree.reserve(1)?;
        if !tree.root().headers().has(CONTENT_TYPE) {
            tree.root_mut().headers.append(CONTENT_TYPE, &mediatype)?;
        }

        debug!(part = self.current.index(), %mediatype, %boundary, "Adding container");
        self.current = tree.make_container(self.current, mediatype, boundary);
        Ok(())
    }

    /// Adds `MIME-Version` and `Date` to the root if they are missing.
    ///
    /// Both go to the top of the root headers: `MIME-Version` first,
    /// `Date` right after it.
    fn add_missing_headers(tree: &mut PartTree) -> Result<()> {
        let headers = &mut tree.root_mut().headers;
        if !headers.has(MIME_VERSION) {
            headers.insert(0, MIME_VERSION, "1.0")?;
        }
        if !headers.has(DATE) {
            let date = Utc::now().format(RFC5322_DATE).to_string();
            let at = headers.position(MIME_VERSION).map_or(0, |i| i + 1);
            headers.insert(at, DATE, &date)?;
        }
        Ok(())
    }

    /// Writes the message to `out`.
    ///
    /// Missing `MIME-Version` and `Date` headers are added to the root
    /// first. Writing does not change the tree, so a failed call can be
    /// repeated with another sink.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoData`] if nothing has been added,
    /// [`Error::InvalidValue`] for a blank container Content-Type, and
    /// [`Error::ResourceExhausted`] if writing fails.
    pub fn make<W: Write + ?Sized>(&mut self, out: &mut W) -> Result<()> {
        let tree = self.tree.as_mut().ok_or(Error::NoData)?;
        Self::add_missing_headers(tree)?;
        let tree = &*tree;

        if self.config.verbosity.is_verbose() {
            info!(
                parts = tree.len(),
                containers = self.boundaries.count(),
                "Writing MIME message"
            );
        }
        if self.config.verbosity.is_debug() {
            log_dump(&tree.dump());
        }

        write_tree(tree, out)?;
        out.flush()?;
        Ok(())
    }

    /// Writes the message into a new buffer; see [`make`](Self::make).
    ///
    /// # Errors
    ///
    /// See [`make`](Self::make).
    pub fn render(&mut self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.make(&mut out)?;
        Ok(out)
    }

    /// Returns a textual dump of the tree for diagnostics.
    #[must_use]
    pub fn tree_dump(&self) -> String {
        self.tree.as_ref().map(PartTree::dump).unwrap_or_default()
    }

    /// Logs the tree structure at `debug` level, one event per line.
    pub fn dump_tree(&self) {
        log_dump(&self.tree_dump());
    }
}

fn log_dump(dump: &str) {
    for line in dump.lines() {
        debug!("{line}");
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::needless_collect,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn render_string(maker: &mut MimeMaker) -> String {
        String::from_utf8(maker.render().unwrap()).unwrap()
    }

    fn header_lines(text: &str) -> Vec<&str> {
        text.split("\n\n").next().unwrap().lines().collect()
    }

    #[test]
    fn test_make_empty_builder() {
        let mut maker = MimeMaker::new();
        assert!(maker.is_empty());
        assert_eq!(maker.render().unwrap_err().kind(), ErrorKind::NoData);
        assert!(maker.is_empty());
    }

    #[test]
    fn test_content_type_only() {
        let mut maker = MimeMaker::new();
        maker.add_header("Content-Type", "text/plain").unwrap();
        let text = render_string(&mut maker);

        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "MIME-Version: 1.0");
        assert!(lines[1].starts_with("Date: "));
        assert_eq!(lines[2], "Content-Type: text/plain");
        assert!(text.ends_with("Content-Type: text/plain\n\n"));
        assert!(maker.tree().unwrap().root().body().is_none());
    }

    #[test]
    fn test_empty_body_is_written() {
        let mut maker = MimeMaker::new();
        maker.add_header("Content-Type", "text/plain").unwrap();
        maker.add_body("").unwrap();
        let text = render_string(&mut maker);

        assert!(text.ends_with("Content-Type: text/plain\n\n"));
        assert_eq!(maker.tree().unwrap().root().body(), Some(&b""[..]));
        assert_eq!(maker.add_body("x").unwrap_err().kind(), ErrorKind::Conflict);
    }

    #[test]
    fn test_date_format() {
        let mut maker = MimeMaker::new();
        maker.add_header("Subject", "s").unwrap();
        let text = render_string(&mut maker);
        let date = header_lines(&text)
            .into_iter()
            .find_map(|l| l.strip_prefix("Date: "))
            .unwrap();

        assert!(chrono::DateTime::parse_from_rfc2822(date).is_ok());
        assert!(date.ends_with("+0000"));
    }

    #[test]
    fn test_existing_date_and_version_kept() {
        let mut maker = MimeMaker::new();
        maker.add_header("mime-version", "1.0").unwrap();
        maker.add_header("date", "Thu, 01 Jan 2026 00:00:00 +0000").unwrap();
        maker.add_header("content-type", "text/plain").unwrap();
        let text = render_string(&mut maker);

        assert_eq!(
            header_lines(&text),
            [
                "MIME-Version: 1.0",
                "Date: Thu, 01 Jan 2026 00:00:00 +0000",
                "Content-Type: text/plain"
            ]
        );
    }

    #[test]
    fn test_second_body_conflicts() {
        let mut maker = MimeMaker::new();
        maker.add_body("a").unwrap();
        let err = maker.add_body("b").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(maker.tree().unwrap().root().body(), Some(&b"a"[..]));
    }

    #[test]
    fn test_header_after_top_level_body_conflicts() {
        let mut maker = MimeMaker::new();
        maker.add_header("Subject", "x").unwrap();
        maker.add_body("body").unwrap();
        assert_eq!(
            maker.add_header("X-Extra", "y").unwrap_err().kind(),
            ErrorKind::Conflict
        );
        assert_eq!(maker.tree().unwrap().len(), 1);
    }

    #[test]
    fn test_container_nests_and_conflicts_with_body() {
        let mut maker = MimeMaker::new();
        maker.add_container(None).unwrap();
        let child = maker.current().unwrap();
        maker.add_container(None).unwrap();
        assert_ne!(maker.current(), Some(child));

        let mut maker = MimeMaker::new();
        maker.add_body("x").unwrap();
        assert_eq!(
            maker.add_container(None).unwrap_err().kind(),
            ErrorKind::Conflict
        );
        assert!(!maker.tree().unwrap().root().headers().has(CONTENT_TYPE));
    }

    #[test]
    fn test_container_injects_root_content_type() {
        let mut maker = MimeMaker::new();
        maker.add_container(None).unwrap();
        let root = maker.tree().unwrap().root();
        assert_eq!(root.headers().get(CONTENT_TYPE), Some("multipart/mixed"));
        assert_eq!(root.mediatype(), Some("multipart/mixed"));
        assert!(root.boundary().is_some());
        // The injection goes through the header store directly, so no
        // MIME-Version is added at this point.
        assert!(!root.headers().has(MIME_VERSION));
    }

    #[test]
    fn test_existing_root_content_type_not_duplicated() {
        let mut maker = MimeMaker::new();
        maker
            .add_header("Content-Type", "multipart/alternative")
            .unwrap();
        maker.add_container(Some("multipart/alternative")).unwrap();
        let root = maker.tree().unwrap().root();
        let count = root
            .headers()
            .iter()
            .filter(|h| h.name == CONTENT_TYPE)
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_two_part_container() {
        let mut maker = MimeMaker::new();
        maker.add_container(None).unwrap();
        maker.add_header("Content-Type", "text/plain").unwrap();
        maker.add_body("a").unwrap();
        maker.add_header("Content-Type", "text/plain").unwrap();
        maker.add_body("b").unwrap();

        let text = render_string(&mut maker);
        let boundary = maker.tree().unwrap().root().boundary().unwrap().to_string();

        let open = format!("\n--{boundary}\n");
        let close = format!("\n--{boundary}--\n");
        let expected_tail = format!(
            "\n\n{open}Content-Type: text/plain\n\na{open}Content-Type: text/plain\n\nb{close}"
        );
        assert!(text.starts_with(&format!(
            "Content-Type: multipart/mixed;\n\tboundary=\"{boundary}\"\nMIME-Version: 1.0\nDate: "
        )));
        assert!(text.ends_with(&expected_tail), "{text}");
        assert_eq!(text.matches(&open).count(), 2);
        assert_eq!(text.matches(&close).count(), 1);
    }

    #[test]
    fn test_start_part_without_headers() {
        let mut maker = MimeMaker::new();
        maker.add_container(None).unwrap();
        maker.add_body("one").unwrap();
        maker.start_part().unwrap();
        maker.add_body("two").unwrap();

        let tree = maker.tree().unwrap();
        let first = tree.root().child().unwrap();
        let bodies: Vec<_> = tree
            .siblings(first)
            .map(|id| tree.part(id).unwrap().body().unwrap().to_vec())
            .collect();
        assert_eq!(bodies, [b"one".to_vec(), b"two".to_vec()]);
        let last = tree.siblings(first).last().unwrap();
        assert!(tree.part(last).unwrap().headers().is_empty());
    }

    #[test]
    fn test_empty_header_on_fresh_builder() {
        let mut maker = MimeMaker::new();
        maker.start_part().unwrap();
        assert!(!maker.is_empty());
        assert!(maker.tree().unwrap().root().headers().is_empty());
    }

    #[test]
    fn test_value_without_name() {
        let mut maker = MimeMaker::new();
        assert_eq!(
            maker.add_header("", "orphan").unwrap_err().kind(),
            ErrorKind::InvalidValue
        );
    }

    #[test]
    fn test_nested_content_type_goes_to_root_only() {
        let mut maker = MimeMaker::new();
        maker.add_container(Some("multipart/mixed")).unwrap();
        maker.add_container(Some("multipart/alternative")).unwrap();

        let tree = maker.tree().unwrap();
        let inner = tree.root().child().unwrap();
        assert_eq!(tree.part(inner).unwrap().mediatype(), Some("multipart/alternative"));
        assert!(!tree.part(inner).unwrap().headers().has(CONTENT_TYPE));
        assert_eq!(tree.root().headers().get(CONTENT_TYPE), Some("multipart/mixed"));
    }

    #[test]
    fn test_mime_version_added_to_root_from_nested_part() {
        let mut maker = MimeMaker::new();
        maker.add_header("Subject", "nested").unwrap();
        maker.add_container(None).unwrap();
        maker.add_header("Content-Type", "text/plain").unwrap();

        let tree = maker.tree().unwrap();
        let names: Vec<_> = tree.root().headers().iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, ["Subject", "Content-Type", "MIME-Version"]);
        let child = tree.part(maker.current().unwrap()).unwrap();
        assert_eq!(child.headers().len(), 1);
    }

    #[test]
    fn test_boundaries_increment() {
        let mut maker = MimeMaker::new();
        maker.add_container(None).unwrap();
        maker.add_container(None).unwrap();
        maker.add_container(None).unwrap();

        let tree = maker.tree().unwrap();
        let mut id = PartId::ROOT;
        let mut counters = Vec::new();
        while let Some(container) = tree.part(id).unwrap().container() {
            counters.push(container.boundary[3..5].to_string());
            id = container.first_child;
        }
        assert_eq!(counters, ["01", "02", "03"]);
    }

    #[test]
    fn test_add_stream() {
        let mut maker = MimeMaker::new();
        maker.add_header("Content-Type", "application/octet-stream").unwrap();
        maker.add_stream(std::io::Cursor::new(vec![0u8, 1, 2, 255])).unwrap();
        assert_eq!(
            maker.tree().unwrap().root().body(),
            Some(&[0u8, 1, 2, 255][..])
        );

        let text = maker.render().unwrap();
        assert!(text.ends_with(&[b'\n', b'\n', 0, 1, 2, 255]));
    }

    #[test]
    fn test_add_stream_read_error() {
        struct Failing;

        impl Read for Failing {
            fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("pipe broke"))
            }
        }

        let mut maker = MimeMaker::new();
        let err = maker.add_stream(Failing).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ResourceExhausted);
        assert!(maker.is_empty());
    }

    #[test]
    fn test_make_is_repeatable() {
        let mut maker = MimeMaker::new();
        maker.add_container(None).unwrap();
        maker.add_header("Content-Type", "text/plain").unwrap();
        maker.add_body("x").unwrap();

        let first = maker.render().unwrap();
        let second = maker.render().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_default_mediatype_from_config() {
        let config = Config::builder()
            .default_mediatype("multipart/encrypted; protocol=\"application/pgp-encrypted\"")
            .build();
        let mut maker = MimeMaker::with_config(config);
        maker.add_container(None).unwrap();
        assert_eq!(
            maker.tree().unwrap().root().mediatype(),
            Some("multipart/encrypted; protocol=\"application/pgp-encrypted\"")
        );
    }

    #[test]
    fn test_set_verbose() {
        let mut maker = MimeMaker::new();
        maker.set_verbose(20);
        assert_eq!(maker.config().verbosity, Verbosity::Debug);
        maker.add_header("Subject", "debug").unwrap();
        assert!(maker.render().is_ok());
        maker.set_verbose(0);
        assert_eq!(maker.config().verbosity, Verbosity::Quiet);
    }

    #[test]
    fn test_tree_dump() {
        let mut maker = MimeMaker::new();
        assert_eq!(maker.tree_dump(), "");
        maker.add_container(None).unwrap();
        maker.add_header("content-type", "text/plain").unwrap();
        maker.add_body("hello").unwrap();

        let dump = maker.tree_dump();
        assert!(dump.starts_with("[part]\nContent-Type: multipart/mixed\n"));
        assert!(dump.contains("  Content-Type: text/plain\n  [body 5 bytes]\n"));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Header(&'static str, &'static str),
        StartPart,
        Body(Vec<u8>),
        Container(Option<&'static str>),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            Just(Op::Header("content-type", "text/plain")),
            Just(Op::Header("Subject", "x")),
            Just(Op::StartPart),
            proptest::collection::vec(any::<u8>(), 0..8).prop_map(Op::Body),
            Just(Op::Container(None)),
            Just(Op::Container(Some("multipart/alternative"))),
        ]
    }

    /// Walks the tree from the root and checks that every part is
    /// reached exactly once and that containers never carry bodies.
    fn check_tree(tree: &PartTree) {
        let mut seen = HashSet::new();
        let mut stack = vec![PartId::ROOT];
        while let Some(first) = stack.pop() {
            for id in tree.siblings(first) {
                assert!(seen.insert(id), "part {id:?} visited twice");
                let part = tree.part(id).unwrap();
                assert!(!(part.has_body() && part.child().is_some()));
                assert_eq!(part.boundary().is_some(), part.child().is_some());
                assert_eq!(part.mediatype().is_some(), part.child().is_some());
                if let Some(child) = part.child() {
                    stack.push(child);
                }
            }
        }
        assert_eq!(seen.len(), tree.len());
    }

    proptest! {
        #[test]
        fn prop_tree_stays_consistent(ops in proptest::collection::vec(op_strategy(), 0..24)) {
            let mut maker = MimeMaker::new();
            for op in ops {
                let _ = match op {
                    Op::Header(name, value) => maker.add_header(name, value),
                    Op::StartPart => maker.start_part(),
                    Op::Body(body) => maker.add_body(body),
                    Op::Container(mediatype) => maker.add_container(mediatype),
                };
                if let Some(tree) = maker.tree() {
                    check_tree(tree);
                }
            }

            match maker.render() {
                Ok(_) => prop_assert!(!maker.is_empty()),
                Err(err) => prop_assert_eq!(err.kind(), ErrorKind::NoData),
            }
        }
    }
}
