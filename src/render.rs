use crate::{
    config::{Config, PageLayout},
    error::{Error, Result},
    text::wrap_line,
};
use genpdf::{Element as _, elements, fonts, style};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Environment variable consulted for the font when none is configured.
pub const FONT_ENV_VAR: &str = "NOVEL_PDF_FONT";

/// Fonts probed, in order, when no font is configured. All of them cover
/// CJK except the DejaVu fallback.
const FONT_CANDIDATES: &[&str] = &[
    "C:\\Windows\\Fonts\\simhei.ttf",
    "C:\\Windows\\Fonts\\simsun.ttc",
    "C:\\Windows\\Fonts\\msyh.ttc",
    "/System/Library/Fonts/STHeiti Light.ttc",
    "/System/Library/Fonts/PingFang.ttc",
    "/usr/share/fonts/truetype/wqy/wqy-microhei.ttc",
    "/usr/share/fonts/truetype/wqy/wqy-zenhei.ttc",
    "/usr/share/fonts/wenquanyi/wqy-microhei/wqy-microhei.ttc",
    "/usr/share/fonts/truetype/arphic/uming.ttc",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
];

/// One chapter inside a [`Manuscript`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManuscriptChapter {
    /// Heading line, if headings are enabled
    pub heading: Option<String>,

    /// Cleaned chapter text
    pub body: String,
}

/// The text of one output document, in reading order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manuscript {
    /// Document title (the group key)
    pub title: String,

    /// Chapters in reading order
    pub chapters: Vec<ManuscriptChapter>,
}

impl Manuscript {
    /// Creates an empty manuscript with the given title.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            chapters: Vec::new(),
        }
    }

    /// Appends a chapter.
    pub fn push(&mut self, heading: Option<String>, body: String) {
        self.chapters.push(ManuscriptChapter { heading, body });
    }

    /// Returns true if no chapter has been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }
}

/// Turns a manuscript into PDF bytes.
///
/// Implementations only produce bytes; writing them is the writer's job.
pub trait PdfRenderer {
    /// Renders the manuscript.
    ///
    /// # Errors
    ///
    /// Returns an error if the PDF library fails to lay out or serialize
    /// the document.
    fn render(&self, manuscript: &Manuscript) -> Result<Vec<u8>>;
}

/// [`PdfRenderer`] backed by `genpdf` with a single embedded TrueType font.
pub struct GenpdfRenderer {
    fonts: fonts::FontFamily<fonts::FontData>,
    font_path: PathBuf,
    layout: PageLayout,
    page_break_per_chapter: bool,
}

impl GenpdfRenderer {
    /// Creates a renderer from configuration, loading the font eagerly.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Font`] if no font is found or it can't be parsed.
    pub fn new(config: &Config) -> Result<Self> {
        let env_font = std::env::var_os(FONT_ENV_VAR).map(PathBuf::from);
        let font_path = resolve_font(config.font_path.as_deref(), env_font.as_deref())?;
        let fonts = load_font_family(&font_path)?;

        debug!("Using font {}", font_path.display());

        Ok(Self {
            fonts,
            font_path,
            layout: config.layout,
            page_break_per_chapter: config.page_break_per_chapter,
        })
    }

    /// Returns the font file in use.
    #[must_use]
    pub fn font_path(&self) -> &Path {
        &self.font_path
    }

    fn push_body(&self, doc: &mut genpdf::Document, body: &str) {
        let budget = self.layout.line_budget();

        for line in body.lines() {
            if line.trim().is_empty() {
                doc.push(elements::Break::new(1));
                continue;
            }
            for piece in wrap_line(line, budget) {
                doc.push(elements::Paragraph::new(piece));
            }
        }
    }
}

impl PdfRenderer for GenpdfRenderer {
    fn render(&self, manuscript: &Manuscript) -> Result<Vec<u8>> {
        let mut doc = genpdf::Document::new(self.fonts.clone());
        doc.set_title(manuscript.title.clone());
        doc.set_paper_size(genpdf::PaperSize::A4);
        doc.set_font_size(self.layout.font_size);
        doc.set_line_spacing(self.layout.line_spacing);

        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(self.layout.margin_mm);
        doc.set_page_decorator(decorator);

        for (index, chapter) in manuscript.chapters.iter().enumerate() {
            if index > 0 {
                if self.page_break_per_chapter {
                    doc.push(elements::PageBreak::new());
                } else {
                    doc.push(elements::Break::new(2));
                }
            }

            if let Some(ref heading) = chapter.heading {
                let heading_style = style::Style::new()
                    .bold()
                    .with_font_size(self.layout.heading_font_size);
                doc.push(elements::Paragraph::new(heading.clone()).styled(heading_style));
                doc.push(elements::Break::new(1));
            }

            self.push_body(&mut doc, &chapter.body);
        }

        let mut bytes = Vec::new();
        doc.render(&mut bytes)
            .map_err(|e| Error::render(&manuscript.title, e))?;

        trace!(
            "Rendered '{}' ({} chapters, {} bytes)",
            manuscript.title,
            manuscript.chapters.len(),
            bytes.len()
        );

        Ok(bytes)
    }
}

/// Picks the font file: explicit path, then environment, then the first
/// existing well-known system font.
///
/// # Errors
///
/// Returns [`Error::Font`] if an explicit choice doesn't exist or no
/// candidate is installed.
pub fn resolve_font(explicit: Option<&Path>, from_env: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit.or(from_env) {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        return Err(Error::font(path, "file does not exist"));
    }

    FONT_CANDIDATES
        .iter()
        .map(Path::new)
        .find(|p| p.is_file())
        .map(Path::to_path_buf)
        .ok_or_else(|| {
            Error::font(
                "<none>",
                format!("no system font found; pass --font or set {FONT_ENV_VAR}"),
            )
        })
}

fn load_font_family(path: &Path) -> Result<fonts::FontFamily<fonts::FontData>> {
    let bytes = std::fs::read(path).map_err(|e| Error::font(path, e))?;
    let font = fonts::FontData::new(bytes, None).map_err(|e| Error::font(path, e))?;

    Ok(fonts::FontFamily {
        regular: font.clone(),
        bold: font.clone(),
        italic: font.clone(),
        bold_italic: font,
    })
}
