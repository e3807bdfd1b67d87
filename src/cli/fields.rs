use std::io::Write;
use std::path::PathBuf;

use crate::domain::{FieldSet, FieldValue};
use crate::error::Result;
use crate::ports::Catalog;
use crate::services;

pub async fn get<C: Catalog, W: Write>(
    catalog: &C,
    files: &[PathBuf],
    fields: &FieldSet,
    out: &mut W,
) -> Result<()> {
    for path in files {
        let hashed = match services::hash::hash_file(path) {
            Ok(file) => file,
            Err(e) => {
                super::fail(path, &e);
                continue;
            }
        };
        match catalog.file_fields(&hashed, fields).await {
            Ok(values) => {
                writeln!(out, "{}", path.display())?;
                write_values(out, &values)?;
            }
            Err(e) => super::fail(path, &e),
        }
    }
    Ok(())
}

pub(crate) fn write_values<W: Write>(out: &mut W, values: &[FieldValue]) -> Result<()> {
    for value in values {
        writeln!(out, "  {}: {}", value.name, value.value)?;
    }
    Ok(())
}

pub fn list<W: Write>(out: &mut W) -> Result<()> {
    let names: Vec<&str> = FieldSet::all_names().collect();
    writeln!(out, "{}", names.join("\t"))?;
    Ok(())
}
