//! End-to-end run: discover → build records → clear posts → write posts → write index.

use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, instrument, warn};

use resultgen_discovery::discover;
use resultgen_shared::{GenerateConfig, PublishableRecord, Result};

use crate::emit::{prepare_posts_dir, write_post};
use crate::index::write_index;
use crate::record::build_record;

/// A post written during the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedPost {
    pub slug: String,
    pub title: String,
    /// Front matter date as written.
    pub date: String,
    pub path: PathBuf,
}

/// A CSV file that produced no post, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub source: PathBuf,
    pub reason: String,
}

/// Outcome of one run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub generated: Vec<GeneratedPost>,
    pub skipped: Vec<SkippedFile>,
    pub warnings: Vec<String>,
    /// Stale posts removed before writing.
    pub removed_stale: usize,
    pub index_path: PathBuf,
}

impl RunReport {
    pub fn generated_count(&self) -> usize {
        self.generated.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }
}

/// Progress callback for reporting run status.
pub trait ProgressReporter {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each post is written.
    fn post_written(&self, post: &GeneratedPost, current: usize, total: usize);
    /// Called when a source file is skipped.
    fn skipped(&self, skipped: &SkippedFile);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn post_written(&self, _post: &GeneratedPost, _current: usize, _total: usize) {}
    fn skipped(&self, _skipped: &SkippedFile) {}
}

/// Run the generator with no progress reporting.
pub fn generate(config: &GenerateConfig, today: NaiveDate) -> Result<RunReport> {
    generate_with_progress(config, today, &SilentProgress)
}

/// Run the generator.
///
/// Problems with an individual source file skip that file and are listed in
/// the report. Only an unusable configuration or a filesystem failure on
/// the output side is returned as an error.
#[instrument(skip_all, fields(site = %config.site_root.display(), today = %today))]
pub fn generate_with_progress(
    config: &GenerateConfig,
    today: NaiveDate,
    progress: &dyn ProgressReporter,
) -> Result<RunReport> {
    config.validate()?;

    let mut report = RunReport {
        index_path: config.index_file_path(),
        ..RunReport::default()
    };

    // --- Phase 1: Discovery ---
    progress.phase("Discovering result files");
    let source_dir = config.source_path();
    let discovery = discover(&source_dir)?;
    report
        .warnings
        .extend(discovery.warnings.iter().map(ToString::to_string));
    info!(
        sources = discovery.sources.len(),
        source_dir = %source_dir.display(),
        "discovery complete"
    );

    // --- Phase 2: Build records ---
    progress.phase("Reading results");
    let mut records: Vec<PublishableRecord> = Vec::with_capacity(discovery.sources.len());
    for source in &discovery.sources {
        match build_record(source, config, today) {
            Ok(built) => {
                for warning in &built.warnings {
                    warn!(stem = %source.stem, "{warning}");
                }
                report.warnings.extend(built.warnings);
                records.push(built.record);
            }
            Err(e) => {
                warn!(source = %source.csv_path.display(), error = %e, "skipping result file");
                let skipped = SkippedFile {
                    source: source.csv_path.clone(),
                    reason: e.to_string(),
                };
                progress.skipped(&skipped);
                report.skipped.push(skipped);
            }
        }
    }

    // --- Phase 3: Posts ---
    progress.phase("Writing posts");
    let posts_dir = config.posts_path();
    report.removed_stale = prepare_posts_dir(&posts_dir)?;

    let total = records.len();
    for (i, record) in records.iter().enumerate() {
        let path = write_post(&posts_dir, record, &config.post_layout)?;
        let post = GeneratedPost {
            slug: record.slug.clone(),
            title: record.title.clone(),
            date: record.date.display.clone(),
            path,
        };
        progress.post_written(&post, i + 1, total);
        report.generated.push(post);
    }

    // --- Phase 4: Index ---
    progress.phase("Writing index");
    write_index(
        &report.index_path,
        &records,
        &config.index,
        &config.posts_site_path(),
    )?;

    info!(
        generated = report.generated_count(),
        skipped = report.skipped_count(),
        warnings = report.warning_count(),
        removed_stale = report.removed_stale,
        "run complete"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use resultgen_shared::AppConfig;
    use std::cell::RefCell;
    use std::fs;

    #[derive(Default)]
    struct Recorder {
        phases: RefCell<Vec<String>>,
        written: RefCell<Vec<(usize, usize)>>,
        skipped: RefCell<usize>,
    }

    impl ProgressReporter for Recorder {
        fn phase(&self, name: &str) {
            self.phases.borrow_mut().push(name.to_string());
        }
        fn post_written(&self, _post: &GeneratedPost, current: usize, total: usize) {
            self.written.borrow_mut().push((current, total));
        }
        fn skipped(&self, _skipped: &SkippedFile) {
            *self.skipped.borrow_mut() += 1;
        }
    }

    #[test]
    fn progress_sees_every_phase_and_post() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("_fencing-results");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("a.csv"), "X\n1\n").unwrap();
        fs::write(src.join("b.csv"), "X\n2\n").unwrap();
        fs::write(src.join("c.csv"), "X\n3\n").unwrap();
        fs::write(src.join("c.md"), "---\ndate: someday\n---\n").unwrap();

        let config = GenerateConfig::new(&AppConfig::default(), tmp.path());
        let recorder = Recorder::default();
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let report = generate_with_progress(&config, today, &recorder).unwrap();

        assert_eq!(recorder.phases.borrow().len(), 4);
        assert_eq!(*recorder.written.borrow(), [(1, 2), (2, 2)]);
        assert_eq!(*recorder.skipped.borrow(), 1);
        assert_eq!(report.generated_count(), 2);
        assert_eq!(report.skipped_count(), 1);
    }

    #[test]
    fn report_serializes_to_json() {
        let report = RunReport {
            generated: vec![GeneratedPost {
                slug: "x".into(),
                title: "X".into(),
                date: "2025-01-01".into(),
                path: "_posts/results/2025-01-01-x.md".into(),
            }],
            ..RunReport::default()
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["generated"][0]["title"], "X");
        assert_eq!(json["skipped"].as_array().map(Vec::len), Some(0));
    }
}
