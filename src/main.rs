use anyhow::Context;
use clap::Parser;
use novel_pdf::{Config, FONT_ENV_VAR, GroupLevel, PageLayout, Pipeline};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "novel-pdf",
    version,
    about = "Convert downloaded .txt novel chapters into PDF files",
    long_about = "Convert downloaded .txt novel chapters into PDF files.\n\n\
    Chapter files are recognised by name: `<novel>_<volume>/<chapter>.txt` or \
    `<novel>_<chapter>[_...].txt`. Chapters are merged per novel, per volume \
    or kept one PDF per chapter.\n\n\
    USAGE EXAMPLES:\n  \
      # One PDF per volume\n  \
      novel-pdf --root ./novel --out ./pdf\n\n  \
      # Whole novels, with an explicit CJK font\n  \
      novel-pdf --root ./novel --out ./pdf --group-level 1 --font ./NotoSansSC.ttf\n\n  \
      # Show what would be produced\n  \
      novel-pdf --root ./novel --out ./pdf --group-level 3 --dry-run"
)]
struct Cli {
    /// Novel download root directory
    #[arg(long, value_name = "DIR")]
    root: PathBuf,

    /// Destination directory for PDFs
    #[arg(long, value_name = "DIR")]
    out: PathBuf,

    /// Merge granularity: 1 = novel, 2 = volume, 3 = one PDF per chapter
    #[arg(
        long,
        default_value_t = 2,
        value_parser = clap::value_parser!(u8).range(1..=3)
    )]
    group_level: u8,

    /// TrueType font used for rendering (must cover the text's script)
    #[arg(long, value_name = "FILE", env = FONT_ENV_VAR)]
    font: Option<PathBuf>,

    /// Body font size in points
    #[arg(long, default_value_t = 12, value_name = "PT")]
    font_size: u8,

    /// Page margin in millimetres
    #[arg(long, default_value_t = 15.0, value_name = "MM")]
    margin: f64,

    /// Don't start each chapter on a new page
    #[arg(long)]
    continuous: bool,

    /// Omit the heading line before each chapter
    #[arg(long)]
    no_headings: bool,

    /// Back up PDFs that would be overwritten
    #[arg(long)]
    backup: bool,

    /// Dry run (scan and group only, write nothing)
    #[arg(long)]
    dry_run: bool,

    /// Print run statistics as JSON
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_tracing(cli.verbose)?;

    let layout = PageLayout {
        font_size: cli.font_size,
        heading_font_size: cli.font_size.saturating_add(4),
        margin_mm: cli.margin,
        ..PageLayout::default()
    };

    let mut builder = Config::builder()
        .root_dir(cli.root)
        .output_dir(cli.out)
        .group_level(GroupLevel::try_from(cli.group_level)?)
        .layout(layout)
        .chapter_headings(!cli.no_headings)
        .page_break_per_chapter(!cli.continuous)
        .backup_existing(cli.backup)
        .dry_run(cli.dry_run);

    if let Some(font) = cli.font {
        builder = builder.font_path(font);
    }

    let config = builder.build().context("Failed to build configuration")?;

    let stats = Pipeline::new(config)
        .context("Failed to create pipeline")?
        .run()
        .context("Conversion failed")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&stats).context("Failed to serialize statistics")?
        );
    } else {
        stats.print_summary();
        println!("Created {} PDF files:", stats.files_written());
        for path in &stats.outputs {
            println!(" • {}", path.display());
        }
    }

    Ok(())
}

fn setup_tracing(verbosity: u8) -> anyhow::Result<()> {
    let filter = match verbosity {
        0 => EnvFilter::new("novel_pdf=info"),
        1 => EnvFilter::new("novel_pdf=debug"),
        _ => EnvFilter::new("novel_pdf=trace"),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_writer(std::io::stderr),
        )
        .init();

    Ok(())
}
