use std::path::{Path, PathBuf};

use image::{GrayImage, RgbImage};
use tracing::debug;

use crate::error::Result;

/// Intermediate images a run can hand to a diagnostic sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticStage {
    /// Blurred intensity image
    Gray,
    /// Binary foreground mask after morphology
    Mask,
    /// Original image with the selected boxes drawn on it
    Overlay,
}

impl DiagnosticStage {
    pub fn file_name(&self) -> &'static str {
        match self {
            DiagnosticStage::Gray => "gray.png",
            DiagnosticStage::Mask => "filter.png",
            DiagnosticStage::Overlay => "boundaries.png",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum DiagnosticImage<'a> {
    Gray(&'a GrayImage),
    Color(&'a RgbImage),
}

/// Receives intermediate images while a run progresses
pub trait DiagnosticSink {
    fn record(&mut self, stage: DiagnosticStage, image: DiagnosticImage<'_>) -> Result<()>;
}

/// Discards everything
#[derive(Debug, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn record(&mut self, _stage: DiagnosticStage, _image: DiagnosticImage<'_>) -> Result<()> {
        Ok(())
    }
}

/// Writes each stage as a PNG into a directory
#[derive(Debug)]
pub struct DirectorySink {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl DirectorySink {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        std::fs::create_dir_all(dir.as_ref())?;
        Ok(Self {
            dir: dir.as_ref().to_path_buf(),
            written: Vec::new(),
        })
    }

    /// Files written so far
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl DiagnosticSink for DirectorySink {
    fn record(&mut self, stage: DiagnosticStage, image: DiagnosticImage<'_>) -> Result<()> {
        let path = self.dir.join(stage.file_name());
        match image {
            DiagnosticImage::Gray(img) => img.save(&path)?,
            DiagnosticImage::Color(img) => img.save(&path)?,
        }
        debug!(path = %path.display(), "Wrote diagnostic image");
        self.written.push(path);
        Ok(())
    }
}
