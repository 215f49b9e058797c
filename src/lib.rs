//! # novel-pdf
//!
//! Converts downloaded plain-text novel chapters into PDF files, merged per
//! novel, per volume or kept one per chapter.
//!
//! ## Quick Start
//!
//! ```no_run
//! # fn main() -> novel_pdf::Result<()> {
//! // 1 = novel, 2 = volume, 3 = chapter
//! let written = novel_pdf::convert("./novel", "./pdf", 2)?;
//! println!("{} PDFs written", written.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! The library follows a pipeline architecture:
//! 1. **Scanner**: walks the root directory for `<novel>_<volume>/<chapter>.txt`
//!    style chapter files
//! 2. **Grouping**: merges chapters by novel, volume or chapter
//! 3. **Text**: cleans the pseudo-HTML of each chapter
//! 4. **Renderer**: lays the text out as a PDF
//! 5. **Writer**: persists each PDF atomically

#![warn(
    missing_docs,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
#![allow(clippy::module_name_repetitions)]

mod chapter;
mod config;
mod error;
mod grouping;
mod pipeline;
mod render;
mod scanner;
mod text;
mod writer;

pub use chapter::{ChapterId, SourceFile};
pub use config::{Config, ConfigBuilder, GroupLevel, PageLayout};
pub use error::{Error, Result};
pub use grouping::{Group, group_files, group_key};
pub use pipeline::{ConversionStats, Pipeline};
pub use render::{
    FONT_ENV_VAR, GenpdfRenderer, Manuscript, ManuscriptChapter, PdfRenderer, resolve_font,
};
pub use text::{clean_fragment, read_chapter, wrap_line};

use std::path::{Path, PathBuf};

/// Converts every chapter under `root_dir` into PDFs in `output_dir` and
/// returns the paths written.
///
/// `group_level` is 1 (one PDF per novel), 2 (per volume) or 3 (per
/// chapter). Unreadable chapters and groups that fail to render are skipped
/// with a warning.
///
/// # Errors
///
/// Returns an error if:
/// - `group_level` is not 1, 2 or 3
/// - Root directory doesn't exist or is not a directory
/// - No usable font is found
/// - Output directory cannot be created
///
/// # Examples
///
/// ```no_run
/// use novel_pdf::convert;
///
/// # fn main() -> anyhow::Result<()> {
/// for pdf in convert("./novel", "./pdf", 1)? {
///     println!("{}", pdf.display());
/// }
/// # Ok(())
/// # }
/// ```
pub fn convert(
    root_dir: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    group_level: u8,
) -> Result<Vec<PathBuf>> {
    let config = Config::builder()
        .root_dir(root_dir.as_ref())
        .output_dir(output_dir.as_ref())
        .group_level(GroupLevel::try_from(group_level)?)
        .build()?;

    Ok(run(config)?.outputs)
}

/// Runs the complete conversion pipeline with the given configuration.
///
/// # Errors
///
/// See [`Pipeline::new`] and [`Pipeline::run`].
pub fn run(config: Config) -> Result<ConversionStats> {
    Pipeline::new(config)?.run()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_rejects_bad_group_level() {
        let temp = assert_fs::TempDir::new().unwrap();
        let err = convert(temp.path(), temp.path().join("out"), 4).unwrap_err();

        assert!(matches!(err, Error::InvalidGroupLevel { level: 4 }));
        assert!(!temp.path().join("out").exists());
    }

    #[test]
    fn test_convert_rejects_missing_root() {
        let temp = assert_fs::TempDir::new().unwrap();
        let err = convert(temp.path().join("missing"), temp.path().join("out"), 2).unwrap_err();

        assert!(err.is_config());
    }
}
