use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::Result;
use crate::transform::CropResult;

/// Input formats accepted from the command line
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

pub fn is_supported_input(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
        .unwrap_or(false)
}

/// Write each crop pair as `<n>-rotated.png` (and `<n>-straight.png` when
/// requested), where `n` is the crop's boundary index plus one. Skipped
/// boundaries leave a gap in the numbering. Returns the written paths.
pub fn write_crops(
    dir: &Path,
    crops: &[CropResult],
    include_straight: bool,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::new();

    for crop in crops {
        let number = crop.index + 1;
        let rotated_path = dir.join(format!("{}-rotated.png", number));
        crop.rotated.save(&rotated_path)?;
        written.push(rotated_path);

        if include_straight {
            let straight_path = dir.join(format!("{}-straight.png", number));
            crop.straight.save(&straight_path)?;
            written.push(straight_path);
        }
    }

    debug!(dir = %dir.display(), files = written.len(), "Wrote crops");
    Ok(written)
}

/// Pack a directory into `<dir>-output.tar` beside it, then remove the directory
pub fn archive_directory(dir: &Path) -> Result<PathBuf> {
    let name = dir.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("cannot archive {:?}: no directory name", dir),
        )
    })?;

    let archive_path = dir.with_file_name(format!("{}-output.tar", name.to_string_lossy()));
    let file = File::create(&archive_path)?;

    let mut builder = tar::Builder::new(file);
    builder.append_dir_all(".", dir)?;
    builder.into_inner()?;

    fs::remove_dir_all(dir)?;

    info!(archive = %archive_path.display(), "Archived crops");
    Ok(archive_path)
}
