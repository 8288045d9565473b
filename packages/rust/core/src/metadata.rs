//! Metadata resolution: front matter from the optional `.md` file merged
//! with defaults derived from the CSV file name and the run date.

use std::path::Path;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use tracing::debug;

use resultgen_markdown::{FrontMatter, parse_front_matter};
use resultgen_shared::{MetaValue, PostDate, Result, ResultgenError};

/// Keys with a dedicated meaning; everything else is passed through.
const KNOWN_KEYS: &[&str] = &["title", "date", "excerpt", "image", "author"];

/// Keys owned by the generator and dropped from metadata.
const RESERVED_KEYS: &[&str] = &["layout"];

/// Date-only forms, written back out as `YYYY-MM-DD`.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%B %d, %Y", "%b %d, %Y"];

/// Datetime forms with a UTC offset (Jekyll's own style first).
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S %z", "%Y-%m-%d %H:%M %z"];

/// Naive datetime forms.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Metadata for one record after defaults have been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub title: String,
    pub date: PostDate,
    pub excerpt: Option<String>,
    pub image: Option<String>,
    pub author: Option<String>,
    pub extra: Vec<(String, MetaValue)>,
    pub introduction: Option<String>,
}

/// Resolve metadata for the CSV with file stem `stem`.
///
/// Without a metadata file every field takes its default. With one, each
/// missing field falls back individually.
pub fn resolve_metadata(
    stem: &str,
    metadata_path: Option<&Path>,
    today: NaiveDate,
) -> Result<Metadata> {
    let Some(path) = metadata_path else {
        debug!(stem, "no metadata file, using defaults");
        return merge_metadata(FrontMatter::default(), stem, today, Path::new(stem));
    };

    let text = std::fs::read_to_string(path).map_err(|e| ResultgenError::io(path, e))?;
    let front = parse_front_matter(&text, path)?;
    debug!(
        path = %path.display(),
        fields = front.fields.len(),
        has_body = !front.body.is_empty(),
        "parsed metadata file"
    );
    merge_metadata(front, stem, today, path)
}

/// Merge parsed front matter with defaults. `path` is used in errors only.
pub fn merge_metadata(
    front: FrontMatter,
    stem: &str,
    today: NaiveDate,
    path: &Path,
) -> Result<Metadata> {
    let text_field = |key: &str| -> Result<Option<String>> {
        match front.get(key) {
            None => Ok(None),
            Some(MetaValue::Text(text)) if text.trim().is_empty() => Ok(None),
            Some(MetaValue::Text(text)) => Ok(Some(text.clone())),
            Some(MetaValue::Yaml(_)) => Err(ResultgenError::metadata(
                path,
                key,
                "expected a plain value, found a list or mapping",
            )),
        }
    };

    let title = text_field("title")?.unwrap_or_else(|| title_from_stem(stem));

    let date = match text_field("date")? {
        None => PostDate::from_day(today),
        Some(raw) => parse_post_date(&raw).ok_or_else(|| {
            ResultgenError::metadata(
                path,
                "date",
                format!(
                    "unrecognised date {raw:?}; use YYYY-MM-DD or YYYY-MM-DD HH:MM:SS"
                ),
            )
        })?,
    };

    let excerpt = text_field("excerpt")?;
    let image = text_field("image")?;
    let author = text_field("author")?;

    let extra = front
        .fields
        .iter()
        .filter(|(key, _)| {
            let reserved = RESERVED_KEYS.contains(&key.as_str());
            if reserved {
                debug!(key = %key, "ignoring generator-owned metadata key");
            }
            !KNOWN_KEYS.contains(&key.as_str()) && !reserved
        })
        .cloned()
        .collect();

    let introduction = (!front.body.is_empty()).then(|| front.body.clone());

    Ok(Metadata {
        title,
        date,
        excerpt,
        image,
        author,
        extra,
        introduction,
    })
}

/// Human title from a file stem: `turkey-tussle-2025` becomes `Turkey Tussle 2025`.
pub fn title_from_stem(stem: &str) -> String {
    static SEPARATOR_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[-_\s]+").expect("valid regex"));

    let title = SEPARATOR_RE
        .split(stem)
        .filter(|word| !word.is_empty())
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ");

    if title.is_empty() {
        stem.to_string()
    } else {
        title
    }
}

/// Title-case one word: a letter following a non-letter starts a new run
/// and is upper-cased, the rest of the run is lower-cased (`o'brien` becomes
/// `O'Brien`).
fn title_case(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    let mut in_run = false;
    for ch in word.chars() {
        if ch.is_alphabetic() {
            if in_run {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            in_run = true;
        } else {
            out.push(ch);
            in_run = false;
        }
    }
    out
}

/// Parse a metadata date.
///
/// Date-only values are normalised to `YYYY-MM-DD`; values carrying a time
/// are kept exactly as written.
pub fn parse_post_date(raw: &str) -> Option<PostDate> {
    let raw = raw.trim();

    if let Some(day) = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
    {
        return Some(PostDate::from_day(day));
    }

    let day = DateTime::parse_from_rfc3339(raw)
        .ok()
        .or_else(|| {
            OFFSET_FORMATS
                .iter()
                .find_map(|fmt| DateTime::parse_from_str(raw, fmt).ok())
        })
        .map(|dt| dt.date_naive())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })?;

    Some(PostDate {
        day,
        display: raw.to_string(),
    })
}
