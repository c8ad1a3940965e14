use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use multicrop::{archive_directory, is_supported_input, write_crops, Cli, Cropper, DirectorySink};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if !is_supported_input(&cli.input) {
        bail!("Unsupported input file {:?}: expected jpg, jpeg or png", cli.input);
    }

    let config = cli.pipeline_config();
    let cropper = Cropper::open(&cli.input, config)
        .with_context(|| format!("Failed to load input image: {:?}", cli.input))?;

    if cli.verbose {
        let (width, height) = cropper.image().dimensions();
        eprintln!("Loaded image: {:?} ({}x{})", cli.input, width, height);
        eprintln!("Threshold: {}", config.threshold);
        eprintln!("Requested objects: {}", cli.count);
        eprintln!();
    }

    let output_dir = cli.output_dir();

    let run = if cli.diagnostics {
        let mut sink = DirectorySink::new(&output_dir)
            .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;
        cropper.process_with_sink(cli.count, &mut sink)
    } else {
        cropper.process(cli.count)
    };
    let run = run.context("Failed to crop objects")?;

    if run.crops().is_empty() {
        eprintln!(
            "No objects found (try a different --threshold than {})",
            config.threshold
        );
        return Ok(());
    }

    if cli.verbose {
        for (i, boundary) in run.boundaries().iter().enumerate() {
            let b = boundary.straight();
            let r = boundary.rotated();
            eprintln!(
                "Object {}: area={:.0}, box={}x{} at ({}, {}), rotated={:.1}x{:.1} at {:.2}°",
                i + 1,
                boundary.area(),
                b.width,
                b.height,
                b.x,
                b.y,
                r.size.0,
                r.size.1,
                r.angle
            );
        }
        eprintln!();
    }

    for index in run.skipped() {
        eprintln!("Skipped object {}: degenerate boundary", index + 1);
    }

    let written = write_crops(&output_dir, run.crops(), cli.straight)
        .with_context(|| format!("Failed to write crops to {:?}", output_dir))?;

    if cli.archive {
        let archive = archive_directory(&output_dir)
            .with_context(|| format!("Failed to archive {:?}", output_dir))?;
        eprintln!("Saved {} crops to archive: {:?}", run.crops().len(), archive);
    } else {
        eprintln!("Saved {} crops to {:?}", run.crops().len(), output_dir);
        if cli.verbose {
            for path in &written {
                eprintln!("  {:?}", path);
            }
        }
    }

    Ok(())
}
