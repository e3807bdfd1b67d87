use std::fs::File;
use std::path::Path;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tracing::debug;

use crate::domain::{Ed2kHash, HashedFile};
use crate::error::Result;

/// Hashes one file, drawing a byte progress bar on stderr while attached
/// to a terminal.
pub fn hash_file(path: &Path) -> Result<HashedFile> {
    let file = File::open(path)?;
    let size = file.metadata()?.len();

    let bar = ProgressBar::with_draw_target(Some(size), ProgressDrawTarget::stderr());
    bar.set_style(
        ProgressStyle::with_template("{msg} [{bar:30}] {bytes}/{total_bytes} ({bytes_per_sec})")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar.set_message(
        path.file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned()),
    );

    let ed2k = Ed2kHash::from_reader(bar.wrap_read(file))?;
    bar.finish_and_clear();
    debug!(path = %path.display(), size, %ed2k, "hashed file");

    Ok(HashedFile {
        path: path.to_path_buf(),
        size,
        ed2k,
    })
}
