//! Save file writer

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{Local, TimeZone, Utc};
use tracing::info;

use super::format::{write_header, write_rows};
use super::naming::{autosave_stem, default_stem, resolve_file_name};
use super::{DatalogError, SaveFormat};
use crate::monitor::Monitor;

/// Who asked for the save
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveKind {
    /// Requested by the user
    Manual,
    /// Triggered after a full buffer of ticks
    Auto,
}

/// Writes monitor histories into a directory
#[derive(Debug, Clone)]
pub struct SaveWriter {
    directory: PathBuf,
    format: SaveFormat,
}

impl SaveWriter {
    /// Writer for `directory`, created on first save if missing
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            format: SaveFormat::default(),
        }
    }

    pub fn with_format(mut self, format: SaveFormat) -> Self {
        self.format = format;
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Save with today's stem, dates in local time
    pub fn save_now(&self, monitor: &Monitor, kind: SaveKind) -> Result<PathBuf, DatalogError> {
        let today = Local::now().date_naive();
        let stem = match kind {
            SaveKind::Manual => default_stem(today),
            SaveKind::Auto => autosave_stem(today),
        };
        self.save(monitor, &stem, kind, &Local)
    }

    /// Save under `stem`, dates rendered in `tz`
    ///
    /// A new file gets the header; an existing one only gets the rows.
    /// Returns the path written.
    pub fn save<Tz>(
        &self,
        monitor: &Monitor,
        stem: &str,
        kind: SaveKind,
        tz: &Tz,
    ) -> Result<PathBuf, DatalogError>
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        if self.directory.exists() && !self.directory.is_dir() {
            return Err(DatalogError::NotADirectory(
                self.directory.display().to_string(),
            ));
        }
        fs::create_dir_all(&self.directory)?;

        let (file_name, path) =
            resolve_file_name(&self.directory, stem, kind == SaveKind::Auto, self.format)?;
        let is_new = !path.is_file();

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut out = BufWriter::new(file);
        if is_new {
            let started_at = monitor.started_at().unwrap_or_else(Utc::now);
            write_header(&mut out, &file_name, started_at, tz, monitor.probes())?;
        }
        write_rows(&mut out, tz, monitor.probes())?;
        out.flush()?;

        info!(path = %path.display(), ?kind, "samples saved");
        Ok(path)
    }
}
