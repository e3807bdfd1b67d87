use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::error::Result;

/// Result sink: stdout, or the file named by `--out-file`. Diagnostics and
/// progress never go through here.
pub enum Output {
    Stdout(io::Stdout),
    File(BufWriter<File>),
}

impl Output {
    pub fn create(out_file: Option<&Path>) -> Result<Self> {
        match out_file {
            Some(path) => Ok(Self::File(BufWriter::new(File::create(path)?))),
            None => Ok(Self::Stdout(io::stdout())),
        }
    }
}

impl Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Stdout(w) => w.write(buf),
            Self::File(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}
