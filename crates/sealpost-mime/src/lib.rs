//! # sealpost-mime
//!
//! MIME tree builder and multipart writer for signed and encrypted mail.
//!
//! ## Features
//!
//! - **Incremental building**: headers, bodies and nested containers are
//!   added one call at a time against a moving cursor
//! - **Boundaries**: `=-=NN-SUFFIX=-=` delimiters with a per-message
//!   random suffix, so a hostile body cannot guess them
//! - **Header canonicalization**: `content-type` is written as
//!   `Content-Type`, `mime-version` as `MIME-Version`
//! - **Writing**: RFC 2045/2046 multipart text with `\n` line endings
//!
//! Bodies are opaque. Transfer encoding, signing and encryption happen
//! before the bytes reach this crate.
//!
//! ## Quick Start
//!
//! ### A single-part message
//!
//! ```
//! use sealpost_mime::MimeMaker;
//!
//! let mut maker = MimeMaker::new();
//! maker.add_header("From", "alice@example.org")?;
//! maker.add_header("Subject", "Hello")?;
//! maker.add_header("Content-Type", "text/plain; charset=utf-8")?;
//! maker.add_body("Hello, World!\n")?;
//!
//! let text = String::from_utf8(maker.render()?).unwrap();
//! assert!(text.contains("MIME-Version: 1.0\n"));
//! # Ok::<(), sealpost_mime::Error>(())
//! ```
//!
//! ### A PGP/MIME encrypted message
//!
//! ```
//! use sealpost_mime::MimeMaker;
//!
//! let mut maker = MimeMaker::new();
//! maker.add_header("To", "bob@example.org")?;
//! maker.add_container(Some("multipart/encrypted; protocol=\"application/pgp-encrypted\""))?;
//! maker.add_header("Content-Type", "application/pgp-encrypted")?;
//! maker.add_body("Version: 1\n")?;
//! maker.add_header("Content-Type", "application/octet-stream")?;
//! maker.add_body("-----BEGIN PGP MESSAGE-----\n...\n-----END PGP MESSAGE-----\n")?;
//!
//! let mut out = Vec::new();
//! maker.make(&mut out)?;
//! # Ok::<(), sealpost_mime::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod boundary;
mod config;
mod content_type;
mod error;
mod header;
mod maker;
mod part;
mod writer;

pub mod encoding;

pub use boundary::BoundaryGenerator;
pub use config::{Config, ConfigBuilder, DEFAULT_MEDIATYPE, Verbosity};
pub use content_type::with_boundary;
pub use error::{Error, ErrorKind, Result};
pub use header::{CONTENT_TYPE, DATE, Header, Headers, MIME_VERSION, capitalize};
pub use maker::MimeMaker;
pub use part::{Container, Content, Part, PartId, PartTree};
pub use writer::write_tree;
