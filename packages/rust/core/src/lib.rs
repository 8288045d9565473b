//! Core generation logic for resultgen.
//!
//! Ties together discovery, table rendering and front matter handling into
//! a single run that turns a directory of CSV result sheets into Jekyll
//! posts plus a results index ([`pipeline::generate`]).

pub mod emit;
pub mod index;
pub mod metadata;
pub mod pipeline;
pub mod record;

pub use pipeline::{GeneratedPost, RunReport, SkippedFile, generate, generate_with_progress};
