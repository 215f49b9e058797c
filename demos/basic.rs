//! Basic example of using novel-pdf as a library
//!
//! Converts a DMZJ download folder into one PDF per volume.

use novel_pdf::{Config, GroupLevel, Pipeline};

fn main() -> anyhow::Result<()> {
    let config = Config::builder()
        .root_dir("./novel")
        .output_dir("./pdf")
        .group_level(GroupLevel::Volume)
        .build()?;

    let stats = Pipeline::new(config)?.run()?;

    stats.print_summary();

    println!(
        "\n✓ Converted {} chapters into {} PDFs",
        stats.chapter_files,
        stats.files_written()
    );
    println!("✓ Output written to: {}", stats.output_directory);

    Ok(())
}
