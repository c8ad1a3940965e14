use crate::error::{CropError, Result};

/// Environment variable that overrides the binarization threshold
pub const THRESHOLD_ENV: &str = "THRESHOLD";

/// Default binarization threshold: pixels darker than this become foreground
pub const DEFAULT_THRESHOLD: u8 = 200;

/// How contours tied with the cutoff area are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionPolicy {
    /// Keep every contour whose area reaches the cutoff, even if that yields more than N
    #[default]
    CutoffInclusive,
    /// Keep exactly N contours, dropping the last-encountered ones tied at the cutoff
    StrictTopN,
}

/// Tunables for one pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    pub threshold: u8,
    pub selection: SelectionPolicy,
}

impl PipelineConfig {
    pub fn new(threshold: u8) -> Self {
        Self {
            threshold,
            selection: SelectionPolicy::default(),
        }
    }

    pub fn with_selection(mut self, selection: SelectionPolicy) -> Self {
        self.selection = selection;
        self
    }

    /// Build a config from the process environment, falling back to the default threshold
    /// when `THRESHOLD` is unset.
    pub fn from_env() -> Result<Self> {
        match std::env::var(THRESHOLD_ENV) {
            Ok(value) => Ok(Self::new(parse_threshold(&value)?)),
            Err(std::env::VarError::NotPresent) => Ok(Self::default()),
            Err(err) => Err(CropError::InvalidThreshold(err.to_string())),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

/// Parse a threshold value in 0..=255
pub fn parse_threshold(s: &str) -> Result<u8> {
    let value: i64 = s
        .trim()
        .parse()
        .map_err(|_| CropError::InvalidThreshold(format!("'{}' is not an integer", s)))?;

    u8::try_from(value)
        .map_err(|_| CropError::InvalidThreshold(format!("{} is outside 0..=255", value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_threshold() {
        let config = PipelineConfig::default();
        assert_eq!(config.threshold, 200);
        assert_eq!(config.selection, SelectionPolicy::CutoffInclusive);
    }

    #[test]
    fn test_parse_threshold() {
        assert_eq!(parse_threshold("0").unwrap(), 0);
        assert_eq!(parse_threshold(" 128 ").unwrap(), 128);
        assert_eq!(parse_threshold("255").unwrap(), 255);
    }

    #[test]
    fn test_parse_threshold_rejects_out_of_range() {
        assert!(matches!(parse_threshold("256"), Err(CropError::InvalidThreshold(_))));
        assert!(matches!(parse_threshold("-1"), Err(CropError::InvalidThreshold(_))));
        assert!(matches!(parse_threshold("dark"), Err(CropError::InvalidThreshold(_))));
    }

    #[test]
    fn test_from_env() {
        std::env::set_var(THRESHOLD_ENV, "90");
        assert_eq!(PipelineConfig::from_env().unwrap().threshold, 90);

        std::env::set_var(THRESHOLD_ENV, "300");
        assert!(PipelineConfig::from_env().is_err());

        std::env::remove_var(THRESHOLD_ENV);
        assert_eq!(PipelineConfig::from_env().unwrap(), PipelineConfig::default());
    }
}
