use crate::{
    chapter::SourceFile,
    config::Config,
    error::{Error, Result},
    grouping::{Group, group_files},
    render::{GenpdfRenderer, Manuscript, PdfRenderer},
    scanner::Scanner,
    text::{clean_fragment, read_chapter},
    writer::Writer,
};
use serde::Serialize;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// Statistics collected during a conversion run.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionStats {
    /// Regular files visited during the scan
    pub total_files: usize,

    /// Files recognised as chapters
    pub chapter_files: usize,

    /// Files that didn't follow the chapter naming convention
    pub ignored_files: usize,

    /// Directory entries the walk couldn't read
    pub scan_errors: usize,

    /// Chapters skipped because they couldn't be read
    pub skipped_chapters: usize,

    /// Number of groups formed
    pub total_groups: usize,

    /// Groups that failed to render or write
    pub failed_groups: usize,

    /// PDFs written, in group key order
    pub outputs: Vec<PathBuf>,

    /// Group level used, 1 to 3
    pub group_level: u8,

    /// Whether this was a dry run
    pub dry_run: bool,

    /// Total execution time
    pub duration: Duration,

    /// Time spent scanning and grouping
    pub scan_duration: Duration,

    /// Time spent reading, rendering and writing
    pub render_duration: Duration,

    /// Output directory path
    pub output_directory: String,
}

impl ConversionStats {
    /// Returns the number of PDFs written.
    #[must_use]
    pub fn files_written(&self) -> usize {
        self.outputs.len()
    }

    /// Prints a human-readable summary to stdout.
    pub fn print_summary(&self) {
        println!("\n╔═══════════════════════════════════════════════════════╗");
        println!("║            Conversion Summary                         ║");
        println!("╠═══════════════════════════════════════════════════════╣");
        println!(
            "║ Files Scanned:        {:>8}                        ║",
            self.total_files
        );
        println!(
            "║   - Chapters:         {:>8}                        ║",
            self.chapter_files
        );
        println!(
            "║   - Ignored:          {:>8}                        ║",
            self.ignored_files
        );
        println!(
            "║   - Scan Errors:      {:>8}                        ║",
            self.scan_errors
        );
        println!(
            "║   - Skipped:          {:>8}                        ║",
            self.skipped_chapters
        );
        println!("║                                                       ║");
        println!(
            "║ Group Level:          {:>8}                        ║",
            self.group_level
        );
        println!(
            "║ Groups:               {:>8}                        ║",
            self.total_groups
        );
        println!(
            "║ Failed Groups:        {:>8}                        ║",
            self.failed_groups
        );
        println!(
            "║ PDFs Written:         {:>8}                        ║",
            self.files_written()
        );
        println!("║ Output Directory:                                     ║");
        println!(
            "║   {}                                              ║",
            self.output_directory
        );
        println!("║                                                       ║");
        println!("║ Timing Breakdown:                                     ║");
        println!(
            "║   - Scanning:         {:>8.2}s                     ║",
            self.scan_duration.as_secs_f64()
        );
        println!(
            "║   - Rendering:        {:>8.2}s                     ║",
            self.render_duration.as_secs_f64()
        );
        println!(
            "║   - Total:            {:>8.2}s                     ║",
            self.duration.as_secs_f64()
        );
        println!("╚═══════════════════════════════════════════════════════╝\n");
    }
}

/// Orchestrates scan, grouping, rendering and writing.
pub struct Pipeline {
    config: Config,
    scanner: Scanner,
    renderer: Option<Box<dyn PdfRenderer>>,
    writer: Writer,
}

impl Pipeline {
    /// Creates a pipeline rendering through `genpdf`.
    ///
    /// The font is resolved and loaded here so a missing font fails the run
    /// before anything is written. Dry runs skip font loading.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration validation fails
    /// - No usable font is available
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let renderer: Option<Box<dyn PdfRenderer>> = if config.dry_run {
            None
        } else {
            Some(Box::new(GenpdfRenderer::new(&config)?))
        };

        Ok(Self::assemble(config, renderer))
    }

    /// Creates a pipeline with a caller-supplied renderer.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration validation fails.
    pub fn with_renderer(config: Config, renderer: Box<dyn PdfRenderer>) -> Result<Self> {
        config.validate()?;
        Ok(Self::assemble(config, Some(renderer)))
    }

    fn assemble(config: Config, renderer: Option<Box<dyn PdfRenderer>>) -> Self {
        let scanner = Scanner::new(&config);
        let writer = Writer::new(&config);

        Self {
            config,
            scanner,
            renderer,
            writer,
        }
    }

    /// Executes the conversion and returns statistics.
    ///
    /// # Process
    ///
    /// 1. **Scan**: discovers chapter files under the root directory
    /// 2. **Group**: merges chapters by the configured group level
    /// 3. **Render**: builds and writes one PDF per group
    ///
    /// Unreadable chapters and failing groups are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error only if the output directory cannot be created.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use novel_pdf::{Config, Pipeline};
    ///
    /// # fn main() -> anyhow::Result<()> {
    /// let config = Config::builder()
    ///     .root_dir("./novel")
    ///     .output_dir("./pdf")
    ///     .build()?;
    ///
    /// let stats = Pipeline::new(config)?.run()?;
    /// stats.print_summary();
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(skip(self), fields(root_dir = %self.config.root_dir.display()))]
    pub fn run(self) -> Result<ConversionStats> {
        let start_time = Instant::now();
        info!("Starting conversion at group level {}", self.config.group_level);

        info!("Stage 1/2: Scanning chapters...");
        let scan_start = Instant::now();
        let (files, scan_stats) = self.scanner.scan();
        let chapter_files = scan_stats.chapter_files;
        let groups = group_files(files, self.config.group_level);
        let scan_duration = scan_start.elapsed();

        info!(
            "✓ Found {} chapters in {} groups in {:.2}s",
            chapter_files,
            groups.len(),
            scan_duration.as_secs_f64()
        );

        if groups.is_empty() {
            warn!(
                "No chapter files found in {}",
                self.config.root_dir.display()
            );
        }

        let render_start = Instant::now();
        let mut outputs = Vec::new();
        let mut skipped_chapters = 0;
        let mut failed_groups = 0;

        match self.renderer {
            Some(ref renderer) if !self.config.dry_run => {
                info!("Stage 2/2: Rendering {} PDFs...", groups.len());
                self.writer.prepare()?;

                for group in &groups {
                    match self.convert_group(&**renderer, group, &mut skipped_chapters) {
                        Ok(path) => outputs.push(path),
                        Err(e) => {
                            warn!("Skipping group {}: {}", group.key, e);
                            failed_groups += 1;
                        }
                    }
                }

                info!(
                    "✓ Wrote {} PDFs in {:.2}s",
                    outputs.len(),
                    render_start.elapsed().as_secs_f64()
                );
            }
            _ => {
                warn!("Dry run mode enabled - skipping rendering");
                self.print_dry_run_summary(&groups);
            }
        }
        let render_duration = render_start.elapsed();

        if failed_groups > 0 {
            warn!("{} group(s) failed and produced no PDF", failed_groups);
        }

        let total_duration = start_time.elapsed();
        info!(
            "✓ Conversion finished in {:.2}s",
            total_duration.as_secs_f64()
        );

        Ok(ConversionStats {
            total_files: scan_stats.total_files,
            chapter_files,
            ignored_files: scan_stats.ignored_files,
            scan_errors: scan_stats.errors,
            skipped_chapters,
            total_groups: groups.len(),
            failed_groups,
            outputs,
            group_level: self.config.group_level.as_u8(),
            dry_run: self.config.dry_run,
            duration: total_duration,
            scan_duration,
            render_duration,
            output_directory: self.config.output_dir.display().to_string(),
        })
    }

    /// Reads, renders and writes one group, counting skipped chapters into
    /// `skipped` even when the group itself fails.
    fn convert_group(
        &self,
        renderer: &dyn PdfRenderer,
        group: &Group,
        skipped: &mut usize,
    ) -> Result<PathBuf> {
        let (manuscript, skipped_chapters) = self.build_manuscript(group);
        *skipped += skipped_chapters;

        if manuscript.is_empty() {
            return Err(Error::empty_document(&group.key));
        }

        let bytes = renderer.render(&manuscript)?;
        let path = self.writer.write_pdf(&group.key, &bytes)?;

        debug!(
            "Group {}: {} chapters -> {}",
            group.key,
            manuscript.chapters.len(),
            path.display()
        );

        Ok(path)
    }

    /// Concatenates a group's chapters in order, skipping unreadable files.
    fn build_manuscript(&self, group: &Group) -> (Manuscript, usize) {
        let mut manuscript = Manuscript::new(group.key.clone());
        let mut skipped = 0;

        for file in &group.files {
            match self.load_chapter(file) {
                Ok(body) => {
                    let heading = self.config.chapter_headings.then(|| file.heading());
                    manuscript.push(heading, body);
                }
                Err(e) => {
                    warn!("Skipping chapter {}: {}", file.relative_path, e);
                    skipped += 1;
                }
            }
        }

        (manuscript, skipped)
    }

    fn load_chapter(&self, file: &SourceFile) -> Result<String> {
        let raw = read_chapter(&file.absolute_path)?;
        Ok(clean_fragment(&raw))
    }

    /// Prints the grouping plan for dry run mode.
    fn print_dry_run_summary(&self, groups: &[Group]) {
        println!("\n╔═══════════════════════════════════════════════════════╗");
        println!("║                 Dry Run Summary                       ║");
        println!("╠═══════════════════════════════════════════════════════╣");
        for group in groups {
            println!(
                "║ {:<32} {:>6} chapter(s)        ║",
                format!("{}.pdf", group.key),
                group.file_count()
            );
        }
        println!("║                                                       ║");
        println!(
            "║ Total groups:         {:>8}                        ║",
            groups.len()
        );
        println!("║ Output directory:                                     ║");
        println!(
            "║   {}                                              ║",
            self.config.output_dir.display()
        );
        println!("║                                                       ║");
        println!("║ ⚠ No files were written (dry run mode)               ║");
        println!("╚═══════════════════════════════════════════════════════╝\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GroupLevel;
    use assert_fs::prelude::*;
    use std::fs;
    use std::path::Path;

    /// Writes the manuscript as plain text so tests can inspect chapter order.
    struct StubRenderer;

    impl PdfRenderer for StubRenderer {
        fn render(&self, manuscript: &Manuscript) -> Result<Vec<u8>> {
            let mut out = format!("%STUB {}\n", manuscript.title);
            for chapter in &manuscript.chapters {
                if let Some(ref heading) = chapter.heading {
                    out.push_str(&format!("# {heading}\n"));
                }
                out.push_str(&chapter.body);
                out.push('\n');
            }
            Ok(out.into_bytes())
        }
    }

    /// Fails for one document title, succeeds for the rest.
    struct FailingRenderer(&'static str);

    impl PdfRenderer for FailingRenderer {
        fn render(&self, manuscript: &Manuscript) -> Result<Vec<u8>> {
            if manuscript.title == self.0 {
                return Err(Error::Render {
                    document: manuscript.title.clone(),
                    message: "page overflow".to_string(),
                });
            }
            StubRenderer.render(manuscript)
        }
    }

    fn library(temp: &assert_fs::TempDir) {
        temp.child("novel/3084_11641/52311.txt").write_str("second").unwrap();
        temp.child("novel/3084_11641/52310.txt").write_str("first<br />line").unwrap();
        temp.child("novel/3084_11700/52400.txt").write_str("fourth").unwrap();
        temp.child("novel/3084_11700/52399.txt").write_str("third").unwrap();
        temp.child("novel/5120_20001/60001.txt").write_str("other novel").unwrap();
        temp.child("novel/cover.jpg").write_binary(&[0xFF, 0xD8]).unwrap();
    }

    fn run_level(temp: &assert_fs::TempDir, level: GroupLevel) -> ConversionStats {
        let config = Config::builder()
            .root_dir(temp.path().join("novel"))
            .output_dir(temp.path().join("pdf"))
            .group_level(level)
            .build()
            .unwrap();

        Pipeline::with_renderer(config, Box::new(StubRenderer))
            .unwrap()
            .run()
            .unwrap()
    }

    fn output_names(stats: &ConversionStats) -> Vec<String> {
        stats
            .outputs
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_level_novel() {
        let temp = assert_fs::TempDir::new().unwrap();
        library(&temp);

        let stats = run_level(&temp, GroupLevel::Novel);

        assert_eq!(output_names(&stats), vec!["3084.pdf", "5120.pdf"]);
        assert_eq!(stats.total_groups, 2);
        assert_eq!(stats.chapter_files, 5);
        assert_eq!(stats.total_files, 6);
        assert_eq!(stats.ignored_files, 1);
        assert_eq!(stats.scan_errors, 0);
    }

    #[test]
    fn test_level_volume() {
        let temp = assert_fs::TempDir::new().unwrap();
        library(&temp);

        let stats = run_level(&temp, GroupLevel::Volume);

        assert_eq!(
            output_names(&stats),
            vec!["3084_11641.pdf", "3084_11700.pdf", "5120_20001.pdf"]
        );
    }

    #[test]
    fn test_level_volume_merges_flat_chapters() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("novel/3084_11641.txt").write_str("first").unwrap();
        temp.child("novel/3084_11642.txt").write_str("second").unwrap();

        let stats = run_level(&temp, GroupLevel::Volume);

        assert_eq!(output_names(&stats), vec!["3084_11641.pdf"]);
        let text = fs::read_to_string(temp.path().join("pdf/3084_11641.pdf")).unwrap();
        assert!(text.find("first").unwrap() < text.find("second").unwrap());
    }

    #[test]
    fn test_level_chapter_one_pdf_per_file() {
        let temp = assert_fs::TempDir::new().unwrap();
        library(&temp);

        let stats = run_level(&temp, GroupLevel::Chapter);

        assert_eq!(stats.files_written(), stats.chapter_files);
        assert!(temp.child("pdf/3084_11641_52310.pdf").exists());
    }

    #[test]
    fn test_chapters_in_ascending_order() {
        let temp = assert_fs::TempDir::new().unwrap();
        library(&temp);

        run_level(&temp, GroupLevel::Novel);

        let text = fs::read_to_string(temp.path().join("pdf/3084.pdf")).unwrap();
        let positions: Vec<usize> = ["52310", "52311", "52399", "52400"]
            .iter()
            .map(|id| text.find(id).unwrap())
            .collect();

        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(text.contains("first\nline"));
    }

    #[test]
    fn test_unreadable_chapter_is_skipped() {
        let temp = assert_fs::TempDir::new().unwrap();
        library(&temp);
        temp.child("novel/3084_11641/52312.txt")
            .write_binary(&[0xC4, 0xE3, 0xBA, 0xC3])
            .unwrap();

        let stats = run_level(&temp, GroupLevel::Volume);

        assert_eq!(stats.skipped_chapters, 1);
        assert_eq!(stats.files_written(), 3);
        assert_eq!(stats.failed_groups, 0);
    }

    #[test]
    fn test_group_with_only_unreadable_chapters_fails_alone() {
        let temp = assert_fs::TempDir::new().unwrap();
        library(&temp);
        temp.child("novel/7777_1/1.txt").write_binary(&[0xFF, 0xFE, 0xFD]).unwrap();

        let stats = run_level(&temp, GroupLevel::Novel);

        assert_eq!(stats.failed_groups, 1);
        assert_eq!(stats.skipped_chapters, 1);
        assert_eq!(output_names(&stats), vec!["3084.pdf", "5120.pdf"]);
        assert!(!temp.child("pdf/7777.pdf").exists());
    }

    #[test]
    fn test_render_failure_does_not_abort_other_groups() {
        let temp = assert_fs::TempDir::new().unwrap();
        library(&temp);

        let config = Config::builder()
            .root_dir(temp.path().join("novel"))
            .output_dir(temp.path().join("pdf"))
            .group_level(GroupLevel::Volume)
            .build()
            .unwrap();

        let stats = Pipeline::with_renderer(config, Box::new(FailingRenderer("3084_11641")))
            .unwrap()
            .run()
            .unwrap();

        assert_eq!(stats.failed_groups, 1);
        assert_eq!(
            output_names(&stats),
            vec!["3084_11700.pdf", "5120_20001.pdf"]
        );
    }

    #[test]
    fn test_headings_can_be_disabled() {
        let temp = assert_fs::TempDir::new().unwrap();
        library(&temp);

        let config = Config::builder()
            .root_dir(temp.path().join("novel"))
            .output_dir(temp.path().join("pdf"))
            .group_level(GroupLevel::Novel)
            .chapter_headings(false)
            .build()
            .unwrap();

        Pipeline::with_renderer(config, Box::new(StubRenderer))
            .unwrap()
            .run()
            .unwrap();

        let text = fs::read_to_string(temp.path().join("pdf/5120.pdf")).unwrap();
        assert!(!text.contains("# "));
        assert!(text.contains("other novel"));
    }

    #[test]
    fn test_pipeline_dry_run() {
        let temp = assert_fs::TempDir::new().unwrap();
        library(&temp);

        let config = Config::builder()
            .root_dir(temp.path().join("novel"))
            .output_dir(temp.path().join("pdf"))
            .dry_run(true)
            .build()
            .unwrap();

        let stats = Pipeline::new(config).unwrap().run().unwrap();

        assert!(stats.dry_run);
        assert_eq!(stats.total_groups, 3);
        assert_eq!(stats.files_written(), 0);
        assert!(!temp.child("pdf").exists());
    }

    #[test]
    fn test_empty_root_is_not_fatal() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("novel/readme.md").write_str("nothing here").unwrap();

        let stats = run_level(&temp, GroupLevel::Volume);

        assert_eq!(stats.total_groups, 0);
        assert!(stats.outputs.is_empty());
        assert!(Path::new(&stats.output_directory).is_dir());
    }
}
