//! File-level operations behind each CLI subcommand.

use crate::error::AppError;
use crate::replay::{ReplayReport, parse_script, replay};
use drawbot_core::{
    DrawbotConfig, DrawingData, FileStorage, Session, Storage, StoredDrawing, normalize,
};
use drawbot_render::{Renderer, render_png};
use std::path::{Path, PathBuf};

fn read(path: &Path) -> Result<String, AppError> {
    std::fs::read_to_string(path).map_err(|source| AppError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn write(path: &Path, bytes: &[u8]) -> Result<(), AppError> {
    std::fs::write(path, bytes).map_err(|source| AppError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Configuration, renderer and storage shared by the subcommands.
pub struct Shell {
    config: DrawbotConfig,
    renderer: Renderer,
    storage_dir: Option<PathBuf>,
}

impl Shell {
    pub fn new(config: DrawbotConfig) -> Self {
        let renderer = Renderer::new()
            .with_default_font(&config.default_font)
            .with_max_pixels(config.max_pixels);
        let storage_dir = config.storage_dir.clone();
        Self {
            config,
            renderer,
            storage_dir,
        }
    }

    /// Override the configured storage directory.
    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = Some(dir.into());
        self
    }

    pub fn config(&self) -> &DrawbotConfig {
        &self.config
    }

    fn storage(&self) -> Result<FileStorage, AppError> {
        let storage = match &self.storage_dir {
            Some(dir) => FileStorage::new(dir.clone())?,
            None => FileStorage::default_location()?,
        };
        log::debug!("using storage at {}", storage.base_path().display());
        Ok(storage)
    }

    /// Read and normalize a drawing document.
    pub fn read_drawing(&self, path: &Path) -> Result<DrawingData, AppError> {
        let value: serde_json::Value = serde_json::from_str(&read(path)?)?;
        Ok(normalize(&value))
    }

    /// Canonical JSON for the document at `path`.
    pub fn normalize_file(&self, path: &Path) -> Result<String, AppError> {
        let drawing = self.read_drawing(path)?;
        Ok(serde_json::to_string_pretty(&drawing)?)
    }

    /// Paint `drawing` into a PNG file at `output`.
    pub fn write_png(&self, drawing: &DrawingData, output: &Path) -> Result<(), AppError> {
        let png = render_png(&self.renderer, drawing)?;
        write(output, &png)?;
        log::info!(
            "wrote {}x{} image to {}",
            drawing.width,
            drawing.height,
            output.display()
        );
        Ok(())
    }

    /// Normalize the document at `input` and paint it into `output`.
    pub fn render_file(&self, input: &Path, output: &Path) -> Result<(), AppError> {
        let drawing = self.read_drawing(input)?;
        self.write_png(&drawing, output)
    }

    /// Run the script at `script` on a fresh session and paint the final
    /// drawing into `output`.
    pub fn replay_file(&self, script: &Path, output: &Path) -> Result<ReplayReport, AppError> {
        let actions = parse_script(&read(script)?)?;
        let mut session = Session::new(&self.config);
        let report = replay(&mut session, &actions);
        self.write_png(session.present(), output)?;
        Ok(report)
    }

    /// Save the document at `input` under `title`, returning its ID.
    pub fn save_file(&self, input: &Path, title: &str) -> Result<String, AppError> {
        let drawing = self.read_drawing(input)?;
        let stored = StoredDrawing::new(title, &drawing)?;
        let storage = self.storage()?;
        Ok(pollster::block_on(storage.save(&stored))?)
    }

    /// Load a saved drawing through a session and paint it into `output`.
    pub fn load_to_png(&self, id: &str, output: &Path) -> Result<(), AppError> {
        let storage = self.storage()?;
        let mut session = Session::new(&self.config);
        pollster::block_on(session.load_from(&storage, id))?;
        self.write_png(session.present(), output)
    }

    /// Saved drawings as `(id, title)` pairs, sorted by ID.
    ///
    /// Entries that cannot be read are logged and left out.
    pub fn list(&self) -> Result<Vec<(String, String)>, AppError> {
        let storage = self.storage()?;
        let ids = pollster::block_on(storage.list())?;
        let mut entries = Vec::with_capacity(ids.len());
        for id in ids {
            match pollster::block_on(storage.load(&id)) {
                Ok(stored) => entries.push((id, stored.title)),
                Err(e) => log::warn!("skipping saved drawing {id}: {e}"),
            }
        }
        Ok(entries)
    }
}
