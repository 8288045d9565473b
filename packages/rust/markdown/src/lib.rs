//! Markdown building blocks for generated result pages.
//!
//! Two halves: CSV result sheets rendered as Markdown tables ([`Table`]),
//! and YAML front matter parsed from hand-written metadata files or written
//! for generated documents ([`parse_front_matter`], [`FrontMatterWriter`]).

mod front_matter;
mod table;

pub use front_matter::{FrontMatter, FrontMatterWriter, parse_front_matter, yaml_scalar};
pub use table::{NO_DATA_PLACEHOLDER, Table, escape_cell};
