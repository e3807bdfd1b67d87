use std::io::Write;
use std::path::{Path, PathBuf};

use crate::domain::{FieldSet, HashedFile, MylistUpdate};
use crate::error::Result;
use crate::ports::{AddOutcome, Catalog, DelOutcome};
use crate::services;

pub async fn add<C: Catalog, W: Write>(
    catalog: &C,
    files: &[PathBuf],
    update: &MylistUpdate,
    out: &mut W,
) -> Result<()> {
    for path in files {
        let Some(hashed) = hash_or_report(path) else {
            continue;
        };
        match catalog.mylist_add(&hashed, update).await {
            Ok(outcome) => write_add_outcome(out, path, outcome)?,
            Err(e) => super::fail(path, &e),
        }
    }
    Ok(())
}

pub async fn del<C: Catalog, W: Write>(
    catalog: &C,
    files: &[PathBuf],
    out: &mut W,
) -> Result<()> {
    for path in files {
        let Some(hashed) = hash_or_report(path) else {
            continue;
        };
        match catalog.mylist_del(&hashed).await {
            Ok(DelOutcome::Deleted) => writeln!(out, "removed {}", path.display())?,
            Ok(DelOutcome::NotListed) => {
                writeln!(out, "{} is not in mylist", path.display())?;
            }
            Err(e) => super::fail(path, &e),
        }
    }
    Ok(())
}

pub async fn add_with_fields<C: Catalog, W: Write>(
    catalog: &C,
    files: &[PathBuf],
    update: &MylistUpdate,
    fields: &FieldSet,
    out: &mut W,
) -> Result<()> {
    for path in files {
        let Some(hashed) = hash_or_report(path) else {
            continue;
        };
        match catalog.mylist_add(&hashed, update).await {
            Ok(outcome) => write_add_outcome(out, path, outcome)?,
            Err(e) => {
                super::fail(path, &e);
                continue;
            }
        }
        match catalog.file_fields(&hashed, fields).await {
            Ok(values) => super::fields::write_values(out, &values)?,
            Err(e) => super::fail(path, &e),
        }
    }
    Ok(())
}

fn write_add_outcome<W: Write>(out: &mut W, path: &Path, outcome: AddOutcome) -> Result<()> {
    match outcome {
        AddOutcome::Added => writeln!(out, "added {}", path.display())?,
        AddOutcome::Updated => writeln!(out, "updated {}", path.display())?,
    }
    Ok(())
}

fn hash_or_report(path: &Path) -> Option<HashedFile> {
    match services::hash::hash_file(path) {
        Ok(file) => Some(file),
        Err(e) => {
            super::fail(path, &e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::domain::FieldValue;
    use crate::error::AnicatError;
    use crate::ports::LogoutOutcome;

    /// Catalog double that pops scripted outcomes in call order.
    #[derive(Default)]
    struct ScriptedCatalog {
        adds: Mutex<VecDeque<Result<AddOutcome>>>,
        dels: Mutex<VecDeque<Result<DelOutcome>>>,
        fields: Mutex<VecDeque<Result<Vec<FieldValue>>>>,
    }

    #[async_trait]
    impl Catalog for ScriptedCatalog {
        async fn mylist_add(
            &self,
            _file: &HashedFile,
            _update: &MylistUpdate,
        ) -> Result<AddOutcome> {
            self.adds.lock().unwrap().pop_front().unwrap()
        }

        async fn mylist_del(&self, _file: &HashedFile) -> Result<DelOutcome> {
            self.dels.lock().unwrap().pop_front().unwrap()
        }

        async fn file_fields(
            &self,
            _file: &HashedFile,
            _fields: &FieldSet,
        ) -> Result<Vec<FieldValue>> {
            self.fields.lock().unwrap().pop_front().unwrap()
        }

        async fn logout(&self) -> Result<LogoutOutcome> {
            Ok(LogoutOutcome::NoSession)
        }
    }

    fn media_files(dir: &tempfile::TempDir, names: &[&str]) -> Vec<PathBuf> {
        names
            .iter()
            .map(|name| {
                let path = dir.path().join(name);
                std::fs::write(&path, b"abc").unwrap();
                path
            })
            .collect()
    }

    #[tokio::test]
    async fn add_reports_each_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let files = media_files(&dir, &["a.avi", "b.avi"]);
        let catalog = ScriptedCatalog::default();
        catalog
            .adds
            .lock()
            .unwrap()
            .extend([Ok(AddOutcome::Added), Ok(AddOutcome::Updated)]);

        let mut out = Vec::new();
        add(&catalog, &files, &MylistUpdate::default(), &mut out)
            .await
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            format!(
                "added {}\nupdated {}\n",
                files[0].display(),
                files[1].display()
            )
        );
    }

    #[tokio::test]
    async fn add_keeps_going_after_a_failed_file() {
        let dir = tempfile::tempdir().unwrap();
        let files = media_files(&dir, &["a.avi", "b.avi"]);
        let catalog = ScriptedCatalog::default();
        catalog.adds.lock().unwrap().extend([
            Err(AnicatError::Service {
                code: 320,
                message: "NO SUCH FILE".to_string(),
            }),
            Ok(AddOutcome::Added),
        ]);

        let mut out = Vec::new();
        add(&catalog, &files, &MylistUpdate::default(), &mut out)
            .await
            .unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!("added {}\n", files[1].display())
        );
    }

    #[tokio::test]
    async fn del_distinguishes_unlisted_files() {
        let dir = tempfile::tempdir().unwrap();
        let files = media_files(&dir, &["a.avi", "b.avi"]);
        let catalog = ScriptedCatalog::default();
        catalog
            .dels
            .lock()
            .unwrap()
            .extend([Ok(DelOutcome::Deleted), Ok(DelOutcome::NotListed)]);

        let mut out = Vec::new();
        del(&catalog, &files, &mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains(&format!("removed {}", files[0].display())));
        assert!(text.contains(&format!("{} is not in mylist", files[1].display())));
    }

    #[tokio::test]
    async fn add_with_fields_appends_the_field_block() {
        let dir = tempfile::tempdir().unwrap();
        let files = media_files(&dir, &["a.avi"]);
        let catalog = ScriptedCatalog::default();
        catalog.adds.lock().unwrap().push_back(Ok(AddOutcome::Added));
        catalog.fields.lock().unwrap().push_back(Ok(vec![
            FieldValue {
                name: "fid",
                value: "912".to_string(),
            },
            FieldValue {
                name: "epno",
                value: "05".to_string(),
            },
        ]));

        let fields = FieldSet::parse("epno").unwrap();
        let mut out = Vec::new();
        add_with_fields(&catalog, &files, &MylistUpdate::default(), &fields, &mut out)
            .await
            .unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!("added {}\n  fid: 912\n  epno: 05\n", files[0].display())
        );
    }
}
