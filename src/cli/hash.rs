use std::io::Write;
use std::path::PathBuf;

use crate::error::Result;
use crate::services;

pub fn run<W: Write>(files: &[PathBuf], out: &mut W) -> Result<()> {
    for path in files {
        match services::hash::hash_file(path) {
            Ok(file) => writeln!(out, "{}", file.link())?,
            Err(e) => super::fail(path, &e),
        }
    }
    Ok(())
}
