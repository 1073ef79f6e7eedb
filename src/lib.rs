//! Ruminate - shorten CSS class and id selectors across a whole site.
//!
//! Ruminate collects every class and id selector declared in a site's
//! stylesheets, assigns each a short generated name (`a`, `b`, ... `aa`), and
//! rewrites stylesheets, HTML views and JavaScript so that they all agree on
//! the new names. Everything that is not a renamed selector is kept byte for
//! byte.
//!
//! # Quick Start
//!
//! ```no_run
//! use ruminate::builder::Ruminate;
//!
//! let report = Ruminate::new()
//!     .css(["static/css"])
//!     .views(["templates"])
//!     .scripts(["static/js"])
//!     .run()
//!     .unwrap();
//!
//! for (from, to) in report.maps.classes.iter() {
//!     println!(".{from} -> .{to}");
//! }
//! ```
//!
//! # Modules
//!
//! - [`collect`] - Selector collection from stylesheets and inline styles
//! - [`allocate`] - Short-name assignment
//! - [`naming`] - The generated-name sequence
//! - [`rewrite`] - Tree-sitter based CSS, HTML and JavaScript rewriting
//! - [`walker`] - Source discovery with ignore-file support
//! - [`placement`] - In-place or mirrored output
//! - [`output`] - Run reports as text or JSON
//! - [`builder`] - Fluent API tying it together

pub mod filter;
pub mod errors;
pub mod naming;
pub mod selectors;
pub mod rewrite;
pub mod collect;
pub mod allocate;
pub mod walker;
pub mod placement;
pub mod output;
pub mod builder;

// Re-export key types at crate root for convenience
pub use allocate::{allocate, AllocateOptions};
pub use builder::{Ruminate, Scan};
pub use collect::{collect, Collector};
pub use errors::{ConfigError, RuminateError};
pub use filter::Syntax;
pub use output::{OutputError, OutputFormat, RunReport};
pub use placement::OutputTarget;
pub use rewrite::{rewrite_css, rewrite_html, rewrite_js, RewriteError};
pub use selectors::{RenameMap, RenameMaps, SelectorKind, SelectorSet, Unlinked};
pub use walker::WalkError;
