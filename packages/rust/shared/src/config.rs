//! Application configuration for resultgen.
//!
//! The optional config file lives at `resultgen.toml` in the site root.
//! CLI flags override config file values, which override defaults.
//! All paths in the file are relative to the site root.

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, ResultgenError};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "resultgen.toml";

/// Default upper bound for a single CSV file (10 MiB).
const DEFAULT_MAX_CSV_BYTES: u64 = 10 * 1024 * 1024;

// ---------------------------------------------------------------------------
// Config structs (matching resultgen.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Input and output locations.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Per-post settings.
    #[serde(default)]
    pub post: PostConfig,

    /// Results index page settings.
    #[serde(default)]
    pub index: IndexConfig,
}

/// `[paths]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathsConfig {
    /// Directory scanned for `*.csv` result files (and paired `*.md`).
    #[serde(default = "default_source_dir")]
    pub source_dir: String,

    /// Directory the generated posts are written to.
    #[serde(default = "default_posts_dir")]
    pub posts_dir: String,

    /// Path of the generated results index page.
    #[serde(default = "default_index_path")]
    pub index_path: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source_dir: default_source_dir(),
            posts_dir: default_posts_dir(),
            index_path: default_index_path(),
        }
    }
}

fn default_source_dir() -> String {
    "_fencing-results".into()
}
fn default_posts_dir() -> String {
    "_posts/results".into()
}
fn default_index_path() -> String {
    "results/index.md".into()
}

/// `[post]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostConfig {
    /// Jekyll layout for generated posts.
    #[serde(default = "default_post_layout")]
    pub layout: String,

    /// CSV files larger than this are skipped.
    #[serde(default = "default_max_csv_bytes")]
    pub max_csv_bytes: u64,
}

impl Default for PostConfig {
    fn default() -> Self {
        Self {
            layout: default_post_layout(),
            max_csv_bytes: default_max_csv_bytes(),
        }
    }
}

fn default_post_layout() -> String {
    "post".into()
}
fn default_max_csv_bytes() -> u64 {
    DEFAULT_MAX_CSV_BYTES
}

/// `[index]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexConfig {
    /// Jekyll layout for the index page.
    #[serde(default = "default_index_layout")]
    pub layout: String,

    /// Page title.
    #[serde(default = "default_index_title")]
    pub title: String,

    /// Permalink the index is published under.
    #[serde(default = "default_permalink")]
    pub permalink: String,

    /// Paragraph shown when there are no results.
    #[serde(default = "default_empty_message")]
    pub empty_message: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            layout: default_index_layout(),
            title: default_index_title(),
            permalink: default_permalink(),
            empty_message: default_empty_message(),
        }
    }
}

fn default_index_layout() -> String {
    "page".into()
}
fn default_index_title() -> String {
    "Tournament Results".into()
}
fn default_permalink() -> String {
    "/results/".into()
}
fn default_empty_message() -> String {
    "No tournament results have been posted yet. Check back soon!".into()
}

// ---------------------------------------------------------------------------
// Generate config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime generation settings, merged from the config file and CLI flags.
#[derive(Debug, Clone)]
pub struct GenerateConfig {
    /// Root of the Jekyll site; the relative paths below hang off it.
    pub site_root: PathBuf,
    /// Source directory, relative to `site_root`.
    pub source_dir: PathBuf,
    /// Posts directory, relative to `site_root`.
    pub posts_dir: PathBuf,
    /// Index page path, relative to `site_root`.
    pub index_path: PathBuf,
    /// Layout written into each post's front matter.
    pub post_layout: String,
    /// Size guard for CSV input.
    pub max_csv_bytes: u64,
    /// Index page settings.
    pub index: IndexConfig,
}

impl GenerateConfig {
    /// Build a config rooted at `site_root` from the loaded app config.
    pub fn new(config: &AppConfig, site_root: impl Into<PathBuf>) -> Self {
        Self {
            site_root: site_root.into(),
            source_dir: PathBuf::from(&config.paths.source_dir),
            posts_dir: PathBuf::from(&config.paths.posts_dir),
            index_path: PathBuf::from(&config.paths.index_path),
            post_layout: config.post.layout.clone(),
            max_csv_bytes: config.post.max_csv_bytes,
            index: config.index.clone(),
        }
    }

    /// Absolute (or cwd-relative) source directory.
    pub fn source_path(&self) -> PathBuf {
        self.site_root.join(&self.source_dir)
    }

    /// Absolute (or cwd-relative) posts directory.
    pub fn posts_path(&self) -> PathBuf {
        self.site_root.join(&self.posts_dir)
    }

    /// Absolute (or cwd-relative) index page path.
    pub fn index_file_path(&self) -> PathBuf {
        self.site_root.join(&self.index_path)
    }

    /// Posts directory relative to the site root, if it can be expressed as one.
    fn posts_relative(&self) -> &Path {
        self.posts_dir
            .strip_prefix(&self.site_root)
            .unwrap_or(&self.posts_dir)
    }

    /// Posts directory as Jekyll sees it: site-relative with `/` separators.
    ///
    /// Only plain name components are kept, so `./_posts/results` becomes
    /// `_posts/results`.
    pub fn posts_site_path(&self) -> String {
        self.posts_relative()
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Reject a posts directory Jekyll could not link to: one outside the
    /// site root or climbing out of it with `..`.
    pub fn validate(&self) -> Result<()> {
        let rel = self.posts_relative();
        let escapes = rel
            .components()
            .any(|c| matches!(c, Component::RootDir | Component::Prefix(_) | Component::ParentDir));
        if escapes {
            return Err(ResultgenError::config(format!(
                "posts directory {} must be inside the site root {}",
                self.posts_dir.display(),
                self.site_root.display()
            )));
        }
        Ok(())
    }
}

impl From<&AppConfig> for GenerateConfig {
    fn from(config: &AppConfig) -> Self {
        Self::new(config, ".")
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load `resultgen.toml` from `site_root`. Returns defaults if the file does not exist.
pub fn load_config(site_root: &Path) -> Result<AppConfig> {
    let path = site_root.join(CONFIG_FILE_NAME);

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ResultgenError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        ResultgenError::config(format!("failed to parse {}: {e}", path.display()))
    })?;

    tracing::debug!(?path, "loaded config file");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("source_dir"));
        assert!(toml_str.contains("_fencing-results"));
        assert!(toml_str.contains("Tournament Results"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.paths.posts_dir, "_posts/results");
        assert_eq!(parsed.post.max_csv_bytes, 10 * 1024 * 1024);
        assert_eq!(parsed.index, IndexConfig::default());
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let toml_str = r#"
[paths]
source_dir = "data/results"

[index]
title = "Results Archive"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.paths.source_dir, "data/results");
        assert_eq!(config.paths.posts_dir, "_posts/results");
        assert_eq!(config.index.title, "Results Archive");
        assert_eq!(config.index.layout, "page");
        assert_eq!(config.post.layout, "post");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result: std::result::Result<AppConfig, _> = toml::from_str("[paths]\nsource = \"x\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn missing_config_file_uses_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let config = load_config(tmp.path()).expect("defaults");
        assert_eq!(config.paths.index_path, "results/index.md");
    }

    #[test]
    fn malformed_config_file_is_config_error() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(CONFIG_FILE_NAME), "[paths\nbroken").unwrap();
        let err = load_config(tmp.path()).unwrap_err();
        assert!(matches!(err, ResultgenError::Config { .. }), "got {err:?}");
    }

    #[test]
    fn generate_config_paths() {
        let app = AppConfig::default();
        let generate = GenerateConfig::new(&app, "/site");
        assert_eq!(generate.source_path(), PathBuf::from("/site/_fencing-results"));
        assert_eq!(generate.posts_path(), PathBuf::from("/site/_posts/results"));
        assert_eq!(generate.index_file_path(), PathBuf::from("/site/results/index.md"));
        assert_eq!(generate.posts_site_path(), "_posts/results");
        assert_eq!(generate.post_layout, "post");
    }

    #[test]
    fn posts_site_path_drops_dot_components() {
        let mut app = AppConfig::default();
        app.paths.posts_dir = "./_posts/results/".into();
        let generate = GenerateConfig::new(&app, ".");
        assert_eq!(generate.posts_site_path(), "_posts/results");
        assert!(generate.validate().is_ok());

        app.paths.posts_dir = "/site/_posts".into();
        let generate = GenerateConfig::new(&app, "/site");
        assert_eq!(generate.posts_site_path(), "_posts");
        assert!(generate.validate().is_ok());
    }

    #[test]
    fn posts_outside_site_are_rejected() {
        for posts in ["/elsewhere/_posts", "../_posts", "_posts/../../out"] {
            let mut app = AppConfig::default();
            app.paths.posts_dir = posts.into();
            let err = GenerateConfig::new(&app, "/site").validate().unwrap_err();
            assert!(matches!(err, ResultgenError::Config { .. }), "{posts}: {err:?}");
        }
    }
}
