use std::path::Path;

use image::{DynamicImage, GrayImage, RgbImage};
use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::contours::{extract_contours, Contour};
use crate::diagnostics::{DiagnosticImage, DiagnosticSink, DiagnosticStage, NullSink};
use crate::error::{CropError, Result};
use crate::preprocess::preprocess;
use crate::selection::{draw_overlay, select_boundaries, BoundaryDescriptor};
use crate::transform::{rectify, CropResult};

/// Splits one photo into per-object crops.
///
/// Holds only the decoded image and its configuration; every call to
/// [`Cropper::process`] computes a fresh [`CropRun`], so a shared `Cropper`
/// can serve concurrent runs.
#[derive(Debug, Clone)]
pub struct Cropper {
    image: RgbImage,
    config: PipelineConfig,
}

/// Everything one run produced, from mask to crops
#[derive(Debug, Clone)]
pub struct CropRun {
    gray: GrayImage,
    mask: GrayImage,
    contours: Vec<Contour>,
    boundaries: Vec<BoundaryDescriptor>,
    overlay: RgbImage,
    crops: Vec<CropResult>,
    skipped: Vec<usize>,
}

impl CropRun {
    pub fn gray(&self) -> &GrayImage {
        &self.gray
    }

    pub fn mask(&self) -> &GrayImage {
        &self.mask
    }

    pub fn contours(&self) -> &[Contour] {
        &self.contours
    }

    pub fn boundaries(&self) -> &[BoundaryDescriptor] {
        &self.boundaries
    }

    pub fn overlay(&self) -> &RgbImage {
        &self.overlay
    }

    /// One crop pair per rectified boundary, in boundary order
    pub fn crops(&self) -> &[CropResult] {
        &self.crops
    }

    /// Indices into [`CropRun::boundaries`] that could not be rectified
    pub fn skipped(&self) -> &[usize] {
        &self.skipped
    }

    pub fn into_crops(self) -> Vec<CropResult> {
        self.crops
    }
}

impl Cropper {
    pub fn new(image: DynamicImage, config: PipelineConfig) -> Result<Self> {
        if image.width() == 0 || image.height() == 0 {
            return Err(CropError::InvalidImage(format!(
                "image has no pixels ({}x{})",
                image.width(),
                image.height()
            )));
        }

        Ok(Self {
            image: image.to_rgb8(),
            config,
        })
    }

    /// Decode an encoded image buffer (PNG, JPEG, ...)
    pub fn from_bytes(bytes: &[u8], config: PipelineConfig) -> Result<Self> {
        if bytes.is_empty() {
            return Err(CropError::InvalidImage("empty buffer".to_string()));
        }
        let image = image::load_from_memory(bytes)?;
        Self::new(image, config)
    }

    pub fn open(path: impl AsRef<Path>, config: PipelineConfig) -> Result<Self> {
        let image = image::open(path.as_ref())?;
        Self::new(image, config)
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the whole pipeline and return just the crops
    pub fn run(&self, object_count: usize) -> Result<Vec<CropResult>> {
        self.process(object_count).map(CropRun::into_crops)
    }

    /// Run the whole pipeline, keeping every intermediate
    pub fn process(&self, object_count: usize) -> Result<CropRun> {
        self.process_with_sink(object_count, &mut NullSink)
    }

    /// Run the whole pipeline, handing intermediate images to `sink` as they are produced
    pub fn process_with_sink(
        &self,
        object_count: usize,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<CropRun> {
        if object_count == 0 {
            return Err(CropError::InvalidObjectCount(object_count));
        }

        let preprocessed = preprocess(&self.image, self.config.threshold);
        sink.record(DiagnosticStage::Gray, DiagnosticImage::Gray(&preprocessed.gray))?;
        sink.record(DiagnosticStage::Mask, DiagnosticImage::Gray(&preprocessed.mask))?;

        let contours = extract_contours(&preprocessed.mask);
        debug!(count = contours.len(), "Extracted contours");

        let boundaries = select_boundaries(&contours, object_count, self.config.selection)?;
        let overlay = draw_overlay(&self.image, &boundaries);
        sink.record(DiagnosticStage::Overlay, DiagnosticImage::Color(&overlay))?;

        let mut crops = Vec::with_capacity(boundaries.len());
        let mut skipped = Vec::new();

        for (index, boundary) in boundaries.iter().enumerate() {
            match rectify(&self.image, boundary, index) {
                Ok(crop) => crops.push(crop),
                Err(err) => {
                    warn!(index, error = %err, "Skipping boundary");
                    skipped.push(index);
                }
            }
        }

        info!(
            requested = object_count,
            contours = contours.len(),
            boundaries = boundaries.len(),
            crops = crops.len(),
            "Cropping finished"
        );

        Ok(CropRun {
            gray: preprocessed.gray,
            mask: preprocessed.mask,
            contours,
            boundaries,
            overlay,
            crops,
            skipped,
        })
    }
}
