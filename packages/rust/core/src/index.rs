//! The results index page: one list entry per published record.

use std::path::Path;

use tracing::{info, instrument};

use resultgen_markdown::FrontMatterWriter;
use resultgen_shared::{IndexConfig, PublishableRecord, Result, ResultgenError};

use crate::emit::write_atomic;

/// Render the index document.
///
/// Records are listed newest first, ties broken by slug. `posts_site_path`
/// is the posts directory relative to the site root, used in `{% link %}`
/// tags so Jekyll resolves the final URLs.
pub fn render_index(
    records: &[PublishableRecord],
    settings: &IndexConfig,
    posts_site_path: &str,
) -> String {
    let mut fm = FrontMatterWriter::new();
    fm.text("layout", &settings.layout)
        .text("title", &settings.title)
        .text("permalink", &settings.permalink);

    let mut out = fm.finish();
    out.push('\n');

    if records.is_empty() {
        out.push_str(&settings.empty_message);
        out.push('\n');
        return out;
    }

    let mut sorted: Vec<&PublishableRecord> = records.iter().collect();
    sorted.sort_by(|a, b| PublishableRecord::index_order(a, b));

    for record in sorted {
        let target = if posts_site_path.is_empty() {
            record.file_name()
        } else {
            format!("{posts_site_path}/{}", record.file_name())
        };
        out.push_str(&format!(
            "- [{}]({{% link {target} %}}) - {}\n",
            escape_link_text(&record.title),
            record.date.long_form()
        ));
        if let Some(excerpt) = &record.excerpt {
            out.push_str("  ");
            out.push_str(&excerpt.replace(['\r', '\n'], " "));
            out.push('\n');
        }
    }
    out
}

/// Write the index page, creating parent directories as needed.
#[instrument(skip_all, fields(path = %path.display(), records = records.len()))]
pub fn write_index(
    path: &Path,
    records: &[PublishableRecord],
    settings: &IndexConfig,
    posts_site_path: &str,
) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ResultgenError::io(parent, e))?;
    }
    write_atomic(path, &render_index(records, settings, posts_site_path))?;
    info!("wrote results index");
    Ok(())
}

fn escape_link_text(text: &str) -> String {
    text.replace('[', "\\[").replace(']', "\\]")
}
