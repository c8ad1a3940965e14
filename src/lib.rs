pub mod cli;
pub mod config;
pub mod contours;
pub mod diagnostics;
pub mod error;
pub mod geometry;
pub mod output;
pub mod pipeline;
pub mod preprocess;
pub mod selection;
pub mod transform;

pub use cli::Cli;
pub use config::{PipelineConfig, SelectionPolicy};
pub use diagnostics::{DiagnosticImage, DiagnosticSink, DiagnosticStage, DirectorySink};
pub use error::{CropError, Result};
pub use geometry::{AxisAlignedBox, RotatedBox};
pub use output::{archive_directory, is_supported_input, write_crops};
pub use pipeline::{CropRun, Cropper};
pub use selection::BoundaryDescriptor;
pub use transform::CropResult;
