//! Post emission.
//!
//! The posts directory belongs to the generator: stale `.md` files are
//! removed at the start of every run and each post is rewritten in full.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use resultgen_markdown::FrontMatterWriter;
use resultgen_shared::{PublishableRecord, Result, ResultgenError};

/// Render the complete post document for `record`.
///
/// Front matter keys come in a fixed order (`layout`, `title`, `date`,
/// `excerpt`, `image`, `author`, then extra keys in source order), followed
/// by the introduction and the results table.
pub fn render_post(record: &PublishableRecord, layout: &str) -> String {
    let mut fm = FrontMatterWriter::new();
    fm.text("layout", layout)
        .text("title", &record.title)
        .text("date", &record.date.display)
        .optional("excerpt", record.excerpt.as_deref())
        .optional("image", record.image.as_deref())
        .optional("author", record.author.as_deref());
    for (key, value) in &record.extra {
        fm.value(key, value);
    }

    let mut out = fm.finish();
    out.push('\n');
    if let Some(intro) = &record.introduction {
        out.push_str(intro);
        out.push_str("\n\n");
    }
    out.push_str(&record.table);
    out
}

/// Create the posts directory if needed and remove previously generated posts.
///
/// Returns the number of files removed. Only top-level `.md` files are touched.
#[instrument(skip_all, fields(dir = %dir.display()))]
pub fn prepare_posts_dir(dir: &Path) -> Result<usize> {
    std::fs::create_dir_all(dir).map_err(|e| ResultgenError::io(dir, e))?;

    let mut removed = 0;
    for entry in std::fs::read_dir(dir).map_err(|e| ResultgenError::io(dir, e))? {
        let entry = entry.map_err(|e| ResultgenError::io(dir, e))?;
        let path = entry.path();
        let is_md = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("md"));
        let is_file = entry
            .file_type()
            .map_err(|e| ResultgenError::io(&path, e))?
            .is_file();

        if is_md && is_file {
            std::fs::remove_file(&path).map_err(|e| ResultgenError::io(&path, e))?;
            debug!(path = %path.display(), "removed stale post");
            removed += 1;
        }
    }

    info!(removed, "posts directory ready");
    Ok(removed)
}

/// Write one post into `dir`. Returns the path written.
pub fn write_post(dir: &Path, record: &PublishableRecord, layout: &str) -> Result<PathBuf> {
    let path = dir.join(record.file_name());
    write_atomic(&path, &render_post(record, layout))?;
    debug!(path = %path.display(), title = %record.title, "wrote post");
    Ok(path)
}

/// Write a file via a temporary sibling and a rename.
pub(crate) fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = path.with_file_name(format!(".{file_name}.tmp"));

    std::fs::write(&temp, content).map_err(|e| ResultgenError::io(&temp, e))?;
    std::fs::rename(&temp, path).map_err(|e| ResultgenError::io(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use resultgen_shared::{MetaValue, PostDate};
    use std::fs;

    fn record() -> PublishableRecord {
        PublishableRecord {
            slug: "turkey-tussle-2025".into(),
            title: "Turkey Tussle 2025".into(),
            date: PostDate::from_day(NaiveDate::from_ymd_opt(2025, 11, 22).unwrap()),
            excerpt: None,
            image: None,
            author: None,
            extra: vec![],
            introduction: None,
            table: "| A |\n| --- |\n| 1 |\n".into(),
            source: "turkey-tussle-2025.csv".into(),
        }
    }

    #[test]
    fn minimal_post_layout() {
        assert_eq!(
            render_post(&record(), "post"),
            concat!(
                "---\n",
                "layout: post\n",
                "title: \"Turkey Tussle 2025\"\n",
                "date: 2025-11-22\n",
                "---\n",
                "\n",
                "| A |\n| --- |\n| 1 |\n",
            )
        );
    }

    #[test]
    fn full_post_keeps_key_order_and_intro() {
        let mut rec = record();
        rec.author = Some("Coach Lee".into());
        rec.excerpt = Some("Pools: 6 strips".into());
        rec.image = Some("/assets/img/tussle.jpg".into());
        rec.extra = vec![("tags".into(), MetaValue::Yaml("[\"foil\"]".into()))];
        rec.introduction = Some("Thanks to all volunteers.".into());

        let post = render_post(&rec, "post");
        let keys: Vec<&str> = post
            .lines()
            .skip(1)
            .take_while(|l| *l != "---")
            .filter_map(|l| l.split_once(':').map(|(k, _)| k))
            .collect();
        assert_eq!(keys, ["layout", "title", "date", "excerpt", "image", "author", "tags"]);
        assert!(post.contains("---\n\nThanks to all volunteers.\n\n| A |"));
    }

    #[test]
    fn prepare_removes_only_top_level_markdown() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("posts");
        fs::create_dir_all(dir.join("keep")).unwrap();
        fs::write(dir.join("2024-01-01-old.md"), "old").unwrap();
        fs::write(dir.join("notes.txt"), "keep").unwrap();
        fs::write(dir.join("keep").join("nested.md"), "keep").unwrap();

        let removed = prepare_posts_dir(&dir).unwrap();
        assert_eq!(removed, 1);
        assert!(!dir.join("2024-01-01-old.md").exists());
        assert!(dir.join("notes.txt").exists());
        assert!(dir.join("keep").join("nested.md").exists());
    }

    #[test]
    fn prepare_creates_missing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("_posts").join("results");
        assert_eq!(prepare_posts_dir(&dir).unwrap(), 0);
        assert!(dir.is_dir());
    }

    #[test]
    fn write_post_uses_dated_file_name() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_post(tmp.path(), &record(), "post").unwrap();
        assert_eq!(path, tmp.path().join("2025-11-22-turkey-tussle-2025.md"));
        assert_eq!(fs::read_to_string(&path).unwrap(), render_post(&record(), "post"));
        assert!(!tmp.path().join(".2025-11-22-turkey-tussle-2025.md.tmp").exists());
    }
}
