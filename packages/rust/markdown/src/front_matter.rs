//! YAML front matter.
//!
//! Metadata files are written by hand, so parsing is lenient: each top-level
//! `key: value` line is split at its first colon and the value kept verbatim
//! unless it is a quoted YAML scalar. Lines without a key are ignored. Only
//! indented continuation blocks and flow collections go through `serde_yaml`. Emission is deterministic and
//! quotes anything YAML could misread.

use std::borrow::Cow;
use std::path::Path;

use serde_yaml::Value;
use tracing::warn;

use resultgen_shared::{MetaValue, Result, ResultgenError};

/// Front matter delimiter line.
const DELIMITER: &str = "---";

/// UTF-8 byte-order mark as it appears once decoded.
const BOM: char = '\u{feff}';

/// Field name reported for structural problems in the header block.
const HEADER_FIELD: &str = "front matter";

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parsed metadata file: header fields plus trailing body text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontMatter {
    /// Header fields in source order. Empty values are omitted.
    pub fields: Vec<(String, MetaValue)>,
    /// Text after the header block, trimmed.
    pub body: String,
}

impl FrontMatter {
    /// Look up a field by key.
    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

/// Parse a metadata document. `path` is only used for error reporting.
///
/// Without a leading `---` line (or without a closing one) the whole text is
/// the body and there are no fields.
pub fn parse_front_matter(text: &str, path: &Path) -> Result<FrontMatter> {
    let text = text.strip_prefix(BOM).unwrap_or(text);

    let Some((header, body)) = split_front_matter(text) else {
        return Ok(FrontMatter {
            fields: Vec::new(),
            body: text.trim().to_string(),
        });
    };

    Ok(FrontMatter {
        fields: parse_header(header, path)?,
        body: body.trim().to_string(),
    })
}

/// Split `text` into (header block, body) on the `---` delimiter lines.
fn split_front_matter(text: &str) -> Option<(&str, &str)> {
    let mut lines = text.split_inclusive('\n');
    let first = lines.next()?;
    if first.trim_end() != DELIMITER {
        return None;
    }

    let header_start = first.len();
    let mut offset = header_start;
    for line in lines {
        if line.trim_end() == DELIMITER {
            return Some((&text[header_start..offset], &text[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

/// One top-level key with its inline value and any continuation lines.
struct Entry<'a> {
    key: &'a str,
    inline: &'a str,
    continuation: Vec<&'a str>,
}

fn parse_header(header: &str, path: &Path) -> Result<Vec<(String, MetaValue)>> {
    let mut entries: Vec<Entry<'_>> = Vec::new();
    // Set after a line we could not read as `key: value`; its continuation
    // lines are dropped with it.
    let mut skipping = false;

    for line in header.lines() {
        if line.trim().is_empty() {
            if let Some(entry) = entries.last_mut().filter(|_| !skipping) {
                entry.continuation.push(line);
            }
            continue;
        }

        let continues = line.starts_with([' ', '\t']) || line.starts_with("- ") || line == "-";
        if continues {
            if skipping {
                continue;
            }
            let Some(entry) = entries.last_mut() else {
                return Err(ResultgenError::metadata(
                    path,
                    HEADER_FIELD,
                    format!("unexpected indented line `{}`", line.trim()),
                ));
            };
            entry.continuation.push(line);
            continue;
        }

        if line.starts_with('#') {
            continue;
        }

        let Some((key, rest)) = line
            .split_once(':')
            .map(|(key, rest)| (key.trim(), rest))
            .filter(|(key, _)| !key.is_empty())
        else {
            warn!(path = %path.display(), line, "ignoring front matter line without a key");
            skipping = true;
            continue;
        };
        skipping = false;

        entries.push(Entry {
            key,
            inline: rest.trim(),
            continuation: Vec::new(),
        });
    }

    let mut fields: Vec<(String, MetaValue)> = Vec::new();
    for entry in &entries {
        let Some(value) = entry_value(entry, path)? else {
            continue;
        };
        // Later duplicates win but keep the first position.
        match fields.iter_mut().find(|(k, _)| k == entry.key) {
            Some(slot) => slot.1 = value,
            None => fields.push((entry.key.to_string(), value)),
        }
    }

    Ok(fields)
}

fn entry_value(entry: &Entry<'_>, path: &Path) -> Result<Option<MetaValue>> {
    if entry.continuation.iter().all(|l| l.trim().is_empty()) {
        return Ok(inline_value(entry.inline));
    }

    let chunk = format!("value: {}\n{}\n", entry.inline, entry.continuation.join("\n"));
    let parsed: Value = serde_yaml::from_str(&chunk).map_err(|e| {
        ResultgenError::metadata(path, entry.key, format!("invalid YAML value: {e}"))
    })?;

    Ok(parsed.get("value").and_then(from_yaml))
}

/// Interpret a single-line value.
fn inline_value(raw: &str) -> Option<MetaValue> {
    if raw.is_empty() || raw == "|" || raw == ">" {
        return None;
    }

    if let Some(inner) = raw.strip_prefix('"').and_then(|r| r.strip_suffix('"')) {
        let text = match serde_yaml::from_str::<String>(raw) {
            Ok(text) => text,
            Err(_) if !inner.contains('"') => inner.to_string(),
            Err(_) => raw.to_string(),
        };
        return non_empty(text);
    }

    if let Some(inner) = raw.strip_prefix('\'').and_then(|r| r.strip_suffix('\'')) {
        return non_empty(inner.replace("''", "'"));
    }

    if raw.starts_with(['[', '{']) {
        if let Ok(value @ (Value::Sequence(_) | Value::Mapping(_))) =
            serde_yaml::from_str::<Value>(raw)
        {
            return serde_json::to_string(&value).ok().map(MetaValue::Yaml);
        }
    }

    Some(MetaValue::Text(raw.to_string()))
}

fn from_yaml(value: &Value) -> Option<MetaValue> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(MetaValue::Text(b.to_string())),
        Value::Number(n) => Some(MetaValue::Text(n.to_string())),
        Value::String(s) => non_empty(s.trim_end().to_string()),
        Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_) => {
            // JSON is valid YAML flow syntax and always fits on one line.
            serde_json::to_string(value).ok().map(MetaValue::Yaml)
        }
    }
}

fn non_empty(text: String) -> Option<MetaValue> {
    (!text.is_empty()).then_some(MetaValue::Text(text))
}

// ---------------------------------------------------------------------------
// Emission
// ---------------------------------------------------------------------------

/// Builds a front matter block, one `key: value` line per call.
#[derive(Debug)]
pub struct FrontMatterWriter {
    out: String,
}

impl Default for FrontMatterWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl FrontMatterWriter {
    pub fn new() -> Self {
        Self {
            out: format!("{DELIMITER}\n"),
        }
    }

    /// Write a scalar, quoting it if needed.
    pub fn text(&mut self, key: &str, value: &str) -> &mut Self {
        self.out.push_str(key);
        self.out.push_str(": ");
        self.out.push_str(&yaml_scalar(value));
        self.out.push('\n');
        self
    }

    /// Write a scalar only when present.
    pub fn optional(&mut self, key: &str, value: Option<&str>) -> &mut Self {
        if let Some(value) = value {
            self.text(key, value);
        }
        self
    }

    /// Write a metadata value; structured values are emitted verbatim.
    pub fn value(&mut self, key: &str, value: &MetaValue) -> &mut Self {
        match value {
            MetaValue::Text(text) => self.text(key, text),
            MetaValue::Yaml(flow) => {
                self.out.push_str(&format!("{key}: {flow}\n"));
                self
            }
        }
    }

    /// Close the block.
    pub fn finish(mut self) -> String {
        self.out.push_str(DELIMITER);
        self.out.push('\n');
        self.out
    }
}

/// Render `value` as a YAML scalar: bare when unambiguous, double-quoted otherwise.
pub fn yaml_scalar(value: &str) -> Cow<'_, str> {
    if needs_quotes(value) {
        Cow::Owned(format!("\"{}\"", escape_yaml_string(value)))
    } else {
        Cow::Borrowed(value)
    }
}

fn needs_quotes(value: &str) -> bool {
    const SPECIAL: &[char] = &[':', '#', '"', '\'', '\\', '\n', '\r', '\t', ' '];
    const INDICATORS: &[char] = &[
        '-', '?', '[', ']', '{', '}', ',', '&', '*', '!', '|', '>', '%', '@', '`',
    ];
    const RESERVED: &[&str] = &["true", "false", "yes", "no", "on", "off", "null", "~"];

    value.is_empty()
        || value.contains(SPECIAL)
        || value.starts_with(INDICATORS)
        || RESERVED.contains(&value.to_ascii_lowercase().as_str())
        || value.parse::<f64>().is_ok()
}

/// Escape special characters in a double-quoted YAML string value.
fn escape_yaml_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> FrontMatter {
        parse_front_matter(text, Path::new("test.md")).unwrap()
    }

    fn text(fm: &FrontMatter, key: &str) -> Option<String> {
        fm.get(key).and_then(MetaValue::as_text).map(str::to_owned)
    }

    #[test]
    fn parses_fields_and_body() {
        let fm = parse(
            "---\ntitle: Turkey Tussle\ndate: 2025-11-22\nauthor: Coach Lee\n---\n\nGreat turnout this year.\n",
        );
        assert_eq!(text(&fm, "title").as_deref(), Some("Turkey Tussle"));
        assert_eq!(text(&fm, "date").as_deref(), Some("2025-11-22"));
        assert_eq!(text(&fm, "author").as_deref(), Some("Coach Lee"));
        assert_eq!(fm.body, "Great turnout this year.");
    }

    #[test]
    fn no_front_matter_is_all_body() {
        let fm = parse("  Just an intro paragraph.\n\n");
        assert!(fm.fields.is_empty());
        assert_eq!(fm.body, "Just an intro paragraph.");
    }

    #[test]
    fn unterminated_front_matter_is_all_body() {
        let fm = parse("---\ntitle: Oops\nno closing line\n");
        assert!(fm.fields.is_empty());
        assert!(fm.body.starts_with("---"));
    }

    #[test]
    fn bom_and_crlf_are_tolerated() {
        let fm = parse("\u{feff}---\r\ntitle: Winter Open\r\n---\r\nBody\r\n");
        assert_eq!(text(&fm, "title").as_deref(), Some("Winter Open"));
        assert_eq!(fm.body, "Body");
    }

    #[test]
    fn colons_and_quotes_survive() {
        let fm = parse(concat!(
            "---\n",
            "title: Round 2: Finals\n",
            "excerpt: \"She said \\\"en garde\\\" twice\"\n",
            "author: 'O''Brien'\n",
            "image: https://example.org/img/podium.jpg\n",
            "---\n",
        ));
        assert_eq!(text(&fm, "title").as_deref(), Some("Round 2: Finals"));
        assert_eq!(
            text(&fm, "excerpt").as_deref(),
            Some("She said \"en garde\" twice")
        );
        assert_eq!(text(&fm, "author").as_deref(), Some("O'Brien"));
        assert_eq!(
            text(&fm, "image").as_deref(),
            Some("https://example.org/img/podium.jpg")
        );
    }

    #[test]
    fn unbalanced_quotes_are_kept_verbatim() {
        let fm = parse("---\ntitle: \"Foil\" and \"Epee\"\nnote: \"C:\\path\"\n---\n");
        assert_eq!(text(&fm, "title").as_deref(), Some("\"Foil\" and \"Epee\""));
        assert_eq!(text(&fm, "note").as_deref(), Some("C:\\path"));
    }

    #[test]
    fn structured_values_become_flow_yaml() {
        let fm = parse("---\ntags: [foil, varsity]\ncategories:\n  - results\n  - 2025\n---\n");
        assert_eq!(
            fm.get("tags"),
            Some(&MetaValue::Yaml("[\"foil\",\"varsity\"]".into()))
        );
        assert_eq!(
            fm.get("categories"),
            Some(&MetaValue::Yaml("[\"results\",2025]".into()))
        );
    }

    #[test]
    fn empty_values_and_comments_are_skipped() {
        let fm = parse("---\n# drafted by the board\ntitle:\nauthor: Sam\n---\n");
        assert!(fm.get("title").is_none());
        assert_eq!(fm.fields.len(), 1);
    }

    #[test]
    fn lines_without_a_key_are_ignored() {
        let fm = parse("---\ntitle: Winter Open\nSee results below\n: orphan value\nauthor: Sam\n---\nBody\n");
        assert_eq!(text(&fm, "title").as_deref(), Some("Winter Open"));
        assert_eq!(text(&fm, "author").as_deref(), Some("Sam"));
        assert_eq!(fm.fields.len(), 2);
        assert_eq!(fm.body, "Body");
    }

    #[test]
    fn continuation_of_ignored_line_is_dropped() {
        let fm = parse("---\ntags:\n  - foil\nnotes for later\n  - not a tag\ndate: 2025-01-04\n---\n");
        assert_eq!(fm.get("tags"), Some(&MetaValue::Yaml("[\"foil\"]".into())));
        assert_eq!(text(&fm, "date").as_deref(), Some("2025-01-04"));
    }

    #[test]
    fn leading_indented_line_is_malformed() {
        let err = parse_front_matter("---\n  stray: indent\ntitle: X\n---\n", Path::new("winter.md"))
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("winter.md"), "{msg}");
        assert!(msg.contains("unexpected indented line"), "{msg}");
    }

    #[test]
    fn duplicate_keys_keep_last_value() {
        let fm = parse("---\ntitle: First\nauthor: A\ntitle: Second\n---\n");
        assert_eq!(fm.fields[0].0, "title");
        assert_eq!(text(&fm, "title").as_deref(), Some("Second"));
    }

    #[test]
    fn writer_quotes_only_when_needed() {
        let mut w = FrontMatterWriter::new();
        w.text("layout", "post")
            .text("title", "Smith Jane")
            .text("date", "2025-11-22")
            .optional("image", None)
            .text("excerpt", "yes")
            .value("tags", &MetaValue::Yaml("[\"foil\"]".into()));
        assert_eq!(
            w.finish(),
            concat!(
                "---\n",
                "layout: post\n",
                "title: \"Smith Jane\"\n",
                "date: 2025-11-22\n",
                "excerpt: \"yes\"\n",
                "tags: [\"foil\"]\n",
                "---\n",
            )
        );
    }

    #[test]
    fn written_values_parse_back_unchanged() {
        let tricky = "Round 2: \"Finals\" \\ #1\tseed";
        let mut w = FrontMatterWriter::new();
        w.text("title", tricky);
        let fm = parse(&w.finish());
        assert_eq!(text(&fm, "title").as_deref(), Some(tricky));
    }

    #[test]
    fn numeric_and_indicator_values_are_quoted() {
        assert_eq!(yaml_scalar("2025"), "\"2025\"");
        assert_eq!(yaml_scalar("- first"), "\"- first\"");
        assert_eq!(yaml_scalar("Foil"), "Foil");
    }
}
