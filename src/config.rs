use crate::error::{Error, Result};
use std::fmt;
use std::path::PathBuf;

const DEFAULT_FONT_SIZE: u8 = 12;
const DEFAULT_HEADING_FONT_SIZE: u8 = 16;
const DEFAULT_LINE_SPACING: f64 = 1.25;
const DEFAULT_MARGIN_MM: f64 = 15.0;

const A4_WIDTH_MM: f64 = 210.0;
const MM_PER_POINT: f64 = 0.352_8;
const MIN_LINE_BUDGET: usize = 10;

/// Merge granularity of the generated PDFs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GroupLevel {
    /// One PDF per novel (level 1)
    Novel,
    /// One PDF per volume (level 2)
    #[default]
    Volume,
    /// One PDF per chapter file (level 3)
    Chapter,
}

impl GroupLevel {
    /// Returns the numeric level used on the command line.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Novel => 1,
            Self::Volume => 2,
            Self::Chapter => 3,
        }
    }
}

impl TryFrom<u8> for GroupLevel {
    type Error = Error;

    fn try_from(level: u8) -> Result<Self> {
        match level {
            1 => Ok(Self::Novel),
            2 => Ok(Self::Volume),
            3 => Ok(Self::Chapter),
            _ => Err(Error::InvalidGroupLevel { level }),
        }
    }
}

impl fmt::Display for GroupLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Novel => "novel",
            Self::Volume => "volume",
            Self::Chapter => "chapter",
        };
        write!(f, "{} ({name})", self.as_u8())
    }
}

/// Page geometry and typography for rendered PDFs.
///
/// Paper is always A4.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageLayout {
    /// Body text size in points
    pub font_size: u8,

    /// Chapter heading size in points
    pub heading_font_size: u8,

    /// Line spacing factor
    pub line_spacing: f64,

    /// Page margin on every side, in millimetres
    pub margin_mm: f64,
}

impl PageLayout {
    /// Returns how many half-em units fit on one line of body text.
    ///
    /// A wide (CJK) glyph takes two units, anything else one.
    #[must_use]
    pub fn line_budget(&self) -> usize {
        let usable = A4_WIDTH_MM - 2.0 * self.margin_mm;
        let half_em = f64::from(self.font_size) * MM_PER_POINT / 2.0;
        if usable <= 0.0 || half_em <= 0.0 {
            return MIN_LINE_BUDGET;
        }
        ((usable / half_em).floor() as usize).max(MIN_LINE_BUDGET)
    }

    fn validate(&self) -> Result<()> {
        if self.font_size == 0 || self.heading_font_size == 0 {
            return Err(Error::config("font sizes must be greater than 0"));
        }

        if !(self.line_spacing > 0.0) {
            return Err(Error::config(format!(
                "line_spacing ({}) must be positive",
                self.line_spacing
            )));
        }

        if !(0.0..A4_WIDTH_MM / 2.0).contains(&self.margin_mm) {
            return Err(Error::config(format!(
                "margin ({} mm) must be between 0 and {} mm",
                self.margin_mm,
                A4_WIDTH_MM / 2.0
            )));
        }

        Ok(())
    }
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            font_size: DEFAULT_FONT_SIZE,
            heading_font_size: DEFAULT_HEADING_FONT_SIZE,
            line_spacing: DEFAULT_LINE_SPACING,
            margin_mm: DEFAULT_MARGIN_MM,
        }
    }
}

/// Configuration for a conversion run.
///
/// Use [`Config::builder()`] to construct a new configuration.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Config {
    /// Root directory holding the downloaded chapter files
    pub root_dir: PathBuf,

    /// Output directory for generated PDFs
    pub output_dir: PathBuf,

    /// Merge granularity
    pub group_level: GroupLevel,

    /// TrueType font used for rendering; probed from well-known paths when unset
    pub font_path: Option<PathBuf>,

    /// Page geometry and typography
    pub layout: PageLayout,

    /// Emit a heading line at the start of every chapter
    pub chapter_headings: bool,

    /// Start every chapter on a new page
    pub page_break_per_chapter: bool,

    /// Dry run mode (no file writes)
    pub dry_run: bool,

    /// Create backups of existing PDFs before overwriting them
    pub backup_existing: bool,
}

impl Config {
    /// Creates a new configuration builder.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use novel_pdf::{Config, GroupLevel};
    ///
    /// let config = Config::builder()
    ///     .root_dir("./novel")
    ///     .output_dir("./pdf")
    ///     .group_level(GroupLevel::Novel)
    ///     .build()
    ///     .expect("valid configuration");
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Root directory doesn't exist or is not a directory
    /// - An explicit font path doesn't point to a file
    /// - Page layout values are out of range
    pub fn validate(&self) -> Result<()> {
        if !self.root_dir.exists() {
            return Err(Error::config(format!(
                "Root directory does not exist: {}",
                self.root_dir.display()
            )));
        }

        if !self.root_dir.is_dir() {
            return Err(Error::config(format!(
                "Root path is not a directory: {}",
                self.root_dir.display()
            )));
        }

        if self.output_dir.is_file() {
            return Err(Error::config(format!(
                "Output path is a file: {}",
                self.output_dir.display()
            )));
        }

        if let Some(ref font) = self.font_path {
            if !font.is_file() {
                return Err(Error::font(font, "file does not exist"));
            }
        }

        self.layout.validate()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("."),
            output_dir: PathBuf::from("out"),
            group_level: GroupLevel::default(),
            font_path: None,
            layout: PageLayout::default(),
            chapter_headings: true,
            page_break_per_chapter: true,
            dry_run: false,
            backup_existing: false,
        }
    }
}

/// Builder for creating a [`Config`].
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    root_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    group_level: Option<GroupLevel>,
    font_path: Option<PathBuf>,
    layout: Option<PageLayout>,
    chapter_headings: Option<bool>,
    page_break_per_chapter: Option<bool>,
    dry_run: bool,
    backup_existing: bool,
}

impl ConfigBuilder {
    /// Sets the root directory to scan.
    #[must_use]
    pub fn root_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.root_dir = Some(path.into());
        self
    }

    /// Sets the output directory for generated PDFs.
    #[must_use]
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Sets the merge granularity.
    #[must_use]
    pub fn group_level(mut self, level: GroupLevel) -> Self {
        self.group_level = Some(level);
        self
    }

    /// Sets the font file used for rendering.
    #[must_use]
    pub fn font_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.font_path = Some(path.into());
        self
    }

    /// Sets the page layout.
    #[must_use]
    pub fn layout(mut self, layout: PageLayout) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Enables or disables per-chapter heading lines.
    #[must_use]
    pub fn chapter_headings(mut self, enabled: bool) -> Self {
        self.chapter_headings = Some(enabled);
        self
    }

    /// Enables or disables starting each chapter on a new page.
    #[must_use]
    pub fn page_break_per_chapter(mut self, enabled: bool) -> Self {
        self.page_break_per_chapter = Some(enabled);
        self
    }

    /// Enables dry run mode (no file writes).
    #[must_use]
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Enables or disables backup creation.
    #[must_use]
    pub fn backup_existing(mut self, enabled: bool) -> Self {
        self.backup_existing = enabled;
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn build(self) -> Result<Config> {
        let config = Config {
            root_dir: self.root_dir.unwrap_or_else(|| PathBuf::from(".")),
            output_dir: self.output_dir.unwrap_or_else(|| PathBuf::from("out")),
            group_level: self.group_level.unwrap_or_default(),
            font_path: self.font_path,
            layout: self.layout.unwrap_or_default(),
            chapter_headings: self.chapter_headings.unwrap_or(true),
            page_break_per_chapter: self.page_break_per_chapter.unwrap_or(true),
            dry_run: self.dry_run,
            backup_existing: self.backup_existing,
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[test]
    fn test_default_config() {
        let temp = assert_fs::TempDir::new().unwrap();
        let config = Config::builder().root_dir(temp.path()).build().unwrap();

        assert_eq!(config.group_level, GroupLevel::Volume);
        assert!(config.chapter_headings);
        assert!(config.page_break_per_chapter);
        assert!(!config.backup_existing);
    }

    #[test]
    fn test_invalid_root_dir() {
        let result = Config::builder()
            .root_dir("/nonexistent/path/that/should/not/exist")
            .build();

        assert!(result.unwrap_err().is_config());
    }

    #[test]
    fn test_root_must_be_directory() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("3084_11641.txt");
        file.write_str("text").unwrap();

        let result = Config::builder().root_dir(file.path()).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_font_rejected() {
        let temp = assert_fs::TempDir::new().unwrap();
        let result = Config::builder()
            .root_dir(temp.path())
            .font_path(temp.path().join("nope.ttf"))
            .build();

        assert!(matches!(result, Err(Error::Font { .. })));
    }

    #[test]
    fn test_invalid_layout() {
        let temp = assert_fs::TempDir::new().unwrap();
        let result = Config::builder()
            .root_dir(temp.path())
            .layout(PageLayout {
                margin_mm: 120.0,
                ..PageLayout::default()
            })
            .build();

        assert!(result.is_err());
    }

    #[test]
    fn test_group_level_from_u8() {
        assert_eq!(GroupLevel::try_from(1).unwrap(), GroupLevel::Novel);
        assert_eq!(GroupLevel::try_from(2).unwrap(), GroupLevel::Volume);
        assert_eq!(GroupLevel::try_from(3).unwrap(), GroupLevel::Chapter);
        assert!(GroupLevel::try_from(0).is_err());
        assert!(GroupLevel::try_from(4).is_err());
    }

    #[test]
    fn test_line_budget() {
        assert_eq!(PageLayout::default().line_budget(), 85);

        let tiny = PageLayout {
            margin_mm: 100.0,
            ..PageLayout::default()
        };
        assert_eq!(tiny.line_budget(), MIN_LINE_BUDGET);
    }
}
