//! Shared types, error model, and configuration for resultgen.
//!
//! This crate is the foundation depended on by all other resultgen crates.
//! It provides:
//! - [`ResultgenError`], the unified error type
//! - Domain types ([`SourceFile`], [`PostDate`], [`MetaValue`], [`PublishableRecord`])
//! - Configuration ([`AppConfig`], [`GenerateConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CONFIG_FILE_NAME, GenerateConfig, IndexConfig, PathsConfig, PostConfig,
    load_config, load_config_from,
};
pub use error::{Result, ResultgenError};
pub use types::{MetaValue, PostDate, PublishableRecord, SourceFile};
