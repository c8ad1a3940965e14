use clap::Parser;
use std::path::PathBuf;

use crate::config::{PipelineConfig, SelectionPolicy, DEFAULT_THRESHOLD};

#[derive(Parser, Debug)]
#[command(name = "multicrop")]
#[command(version, about = "Split a photo of several objects into individual upright crops")]
pub struct Cli {
    /// Input image path (jpg, jpeg or png)
    #[arg(required = true)]
    pub input: PathBuf,

    /// Number of objects to extract (largest first)
    #[arg(short = 'n', long, default_value = "1", value_parser = parse_count)]
    pub count: usize,

    /// Binarization threshold: darker pixels are treated as objects
    #[arg(short, long, env = "THRESHOLD", default_value_t = DEFAULT_THRESHOLD)]
    pub threshold: u8,

    /// Output directory [default: <input>_crops]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also write the axis-aligned crops
    #[arg(long)]
    pub straight: bool,

    /// Write the gray, mask and boundary overlay images
    #[arg(long)]
    pub diagnostics: bool,

    /// Pack the output directory into a tar archive
    #[arg(long)]
    pub archive: bool,

    /// Never return more objects than requested, even when areas tie
    #[arg(long)]
    pub strict: bool,

    /// Show pipeline details
    #[arg(long)]
    pub verbose: bool,
}

impl Cli {
    pub fn output_dir(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| {
            let stem = self.input.file_stem().unwrap_or_default().to_string_lossy();
            let parent = self.input.parent().unwrap_or(std::path::Path::new("."));
            parent.join(format!("{}_crops", stem))
        })
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        let selection = if self.strict {
            SelectionPolicy::StrictTopN
        } else {
            SelectionPolicy::CutoffInclusive
        };
        PipelineConfig::new(self.threshold).with_selection(selection)
    }
}

fn parse_count(s: &str) -> Result<usize, String> {
    let count: usize = s
        .parse()
        .map_err(|_| format!("Invalid object count: {}", s))?;

    if count == 0 {
        return Err("Object count must be at least 1".to_string());
    }

    Ok(count)
}
