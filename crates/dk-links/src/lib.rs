//! Markdown link extraction and validation for dk.
//!
//! Link checking is split into three steps that can be tested in isolation:
//!
//! 1. [`parse_links`] finds link occurrences in markdown text using an
//!    explicit line grammar (inline links, images, reference definitions,
//!    HTML anchors and bare file paths), skipping code.
//! 2. [`parse_target`] splits a target into path and anchor (`#page=N`),
//!    decodes it and classifies it as [`LinkKind`].
//! 3. [`LinkValidator`] resolves file targets against the filesystem and
//!    aggregates one [`ValidationResult`] per reference.
//!
//! External URLs are recognized and skipped; nothing is ever fetched.

mod parser;
mod reference;
mod target;
mod validator;

pub use parser::{LinkSyntax, RawLink, parse_links};
pub use reference::LinkReference;
pub use target::{Anchor, LinkKind, MalformedReason, Target, is_external, parse_target};
pub use validator::{
    LinkCheck, LinkValidator, Summary, UnreadableFile, ValidationReport, ValidationResult,
    ValidatorOptions,
};
