//! Documentation tree discovery for dk.
//!
//! This crate walks a documentation root and produces one [`DocumentNode`]
//! per markdown or PDF file. It handles:
//!
//! - Recursive, deterministic directory walking with exclusions
//! - File kind classification (markdown, summary markdown, PDF)
//! - Title derivation from frontmatter, the first H1 heading, or the filename
//!
//! Nodes are rebuilt on every scan; nothing is cached between runs.
//!
//! # Example
//!
//! ```ignore
//! use std::path::PathBuf;
//! use dk_scan::{ScanOptions, Scanner};
//!
//! let scanner = Scanner::new(PathBuf::from("docs"), ScanOptions::default())?;
//! for node in scanner.scan()? {
//!     println!("{}: {}", node.rel_path.display(), node.title);
//! }
//! ```

mod document;
pub mod markdown;
mod scanner;
mod title;

pub use document::{DocKind, DocumentNode, TitleSource};
pub use scanner::{ScanError, ScanOptions, Scanner};
pub use title::{DerivedTitle, Frontmatter, title_from_filename};
