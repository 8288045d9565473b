//! Core domain types for generated result posts.

use std::cmp::Ordering;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Serialize;

// ---------------------------------------------------------------------------
// SourceFile
// ---------------------------------------------------------------------------

/// A discovered CSV result file and its optional paired metadata file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// File stem, used as the record slug (e.g. `turkey-tussle-2025`).
    pub stem: String,
    /// Path to the `.csv` file.
    pub csv_path: PathBuf,
    /// Path to the paired `.md` file, if one exists.
    pub metadata_path: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// PostDate
// ---------------------------------------------------------------------------

/// The date of a post.
///
/// `day` drives file naming and index ordering; `display` is the exact value
/// written to front matter (a plain `YYYY-MM-DD`, or the original datetime
/// string when the metadata carried a time).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostDate {
    pub day: NaiveDate,
    pub display: String,
}

impl PostDate {
    /// A date-only value.
    pub fn from_day(day: NaiveDate) -> Self {
        Self {
            day,
            display: day.format("%Y-%m-%d").to_string(),
        }
    }

    /// `YYYY-MM-DD` prefix used for post file names.
    pub fn file_prefix(&self) -> String {
        self.day.format("%Y-%m-%d").to_string()
    }

    /// Long human form, e.g. `November 22, 2025`.
    pub fn long_form(&self) -> String {
        self.day.format("%B %-d, %Y").to_string()
    }
}

// ---------------------------------------------------------------------------
// MetaValue
// ---------------------------------------------------------------------------

/// A front matter value taken from a metadata file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MetaValue {
    /// A plain scalar, already unquoted and unescaped.
    Text(String),
    /// A structured value (list or mapping) as single-line YAML flow text.
    Yaml(String),
}

impl MetaValue {
    /// The scalar text, if this is a plain value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Yaml(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// PublishableRecord
// ---------------------------------------------------------------------------

/// A fully resolved tournament result, ready to be written as a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishableRecord {
    /// URL slug, taken from the CSV file stem.
    pub slug: String,
    pub title: String,
    pub date: PostDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Additional front matter keys from the metadata file, in source order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<(String, MetaValue)>,
    /// Free-text body of the metadata file.
    #[serde(skip)]
    pub introduction: Option<String>,
    /// Rendered Markdown table.
    #[serde(skip)]
    pub table: String,
    /// CSV file the record was built from.
    pub source: PathBuf,
}

impl PublishableRecord {
    /// Jekyll post file name: `YYYY-MM-DD-<slug>.md`.
    pub fn file_name(&self) -> String {
        format!("{}-{}.md", self.date.file_prefix(), self.slug)
    }

    /// Index ordering: newest first, then slug ascending.
    pub fn index_order(a: &Self, b: &Self) -> Ordering {
        b.date.day.cmp(&a.date.day).then_with(|| a.slug.cmp(&b.slug))
    }
}
