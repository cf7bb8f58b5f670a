use std::path::{Path, PathBuf};

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use shelfshot_lib::mapping::{merge_files, write_rows};

use crate::error::CliError;

/// Run `mappings merge`.
pub(crate) fn run_merge(inputs: &[PathBuf], output: &Path) -> Result<(), CliError> {
    let paths: Vec<&Path> = inputs.iter().map(PathBuf::as_path).collect();
    let rows = merge_files(&paths)?;
    write_rows(output, &rows)?;
    log::info!(
        "{} Merged {} files into {} rows: {}",
        "\u{2714}".if_supports_color(Stdout, |t| t.green()),
        inputs.len(),
        rows.len(),
        output.display().if_supports_color(Stdout, |t| t.cyan()),
    );
    Ok(())
}
