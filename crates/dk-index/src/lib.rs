//! Documentation index generation for dk.
//!
//! Files that belong together (`x.pdf`, `x.md`, `x-summary.md`) are paired
//! into one [`IndexEntry`], entries are grouped by folder into
//! [`IndexGroup`]s and rendered to a single markdown index.
//!
//! # Example
//!
//! ```
//! use std::path::Path;
//! use dk_index::{IndexEntry, IndexGroup, render};
//!
//! let groups = vec![IndexGroup {
//!     folder: "guides".to_owned(),
//!     entries: vec![IndexEntry::new("setup", "guides/setup.md", "Setup")],
//! }];
//!
//! let index = render(&groups, Path::new("/docs"), Path::new("/docs"));
//! assert_eq!(index, "# Documentation Index\n\n## guides\n\n- [Setup](guides/setup.md)\n");
//! ```

mod entry;
mod generator;
mod render;

pub use entry::{IndexEntry, IndexGroup, build_groups};
pub use generator::{IndexError, IndexGenerator, IndexOptions, IndexSummary};
pub use render::{relative_link, render};
