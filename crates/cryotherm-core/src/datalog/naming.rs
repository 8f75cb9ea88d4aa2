//! Save file names

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use super::SaveFormat;

/// Stem of manual saves, `Temp_evo_save_YYYY_MM_DD`
pub fn default_stem(date: NaiveDate) -> String {
    date.format("Temp_evo_save_%Y_%m_%d").to_string()
}

/// Stem of automatic saves, `auto_save_YYYY-MM-DD`
pub fn autosave_stem(date: NaiveDate) -> String {
    date.format("auto_save_%Y-%m-%d").to_string()
}

/// File name and path for a save in `directory`
///
/// When files whose names contain `stem` already exist, their count is
/// appended as `_{count}`. An automatic save with no such file gets `_0`.
pub fn resolve_file_name(
    directory: &Path,
    stem: &str,
    autosave: bool,
    format: SaveFormat,
) -> io::Result<(String, PathBuf)> {
    let mut same = 0usize;
    for entry in fs::read_dir(directory)? {
        if entry?.file_name().to_string_lossy().contains(stem) {
            same += 1;
        }
    }

    let name = if same > 0 {
        format!("{stem}_{same}")
    } else if autosave {
        format!("{stem}_0")
    } else {
        stem.to_string()
    };
    let path = directory.join(format!("{name}.{}", format.extension()));
    Ok((name, path))
}
