use thiserror::Error;

#[derive(Error, Debug)]
pub enum CropError {
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Image codec error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Object count must be at least 1, got {0}")]
    InvalidObjectCount(usize),

    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),

    #[error("Boundary {index} is degenerate: {reason}")]
    DegenerateBoundary { index: usize, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CropError>;
