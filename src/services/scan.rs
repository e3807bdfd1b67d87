use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

/// Case-insensitive extension filter built from a comma-delimited list
/// such as `.avi,.mp4,.mkv`. Leading dots are optional.
#[derive(Debug, Clone)]
pub struct ExtensionFilter {
    extensions: Vec<String>,
}

impl ExtensionFilter {
    pub fn parse(spec: &str) -> Self {
        let extensions = spec
            .split(',')
            .map(|s| s.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
        Self { extensions }
    }

    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|x| x.eq_ignore_ascii_case(ext)))
    }
}

#[derive(Debug, Default)]
pub struct ScanReport {
    pub files: Vec<PathBuf>,
    pub warnings: Vec<String>,
}

/// Resolves the positional arguments into a file list: files are kept when
/// they pass the filter, directories are walked recursively in sorted
/// order. Problems become warnings, never failures.
pub fn collect(inputs: &[PathBuf], filter: &ExtensionFilter) -> ScanReport {
    let mut report = ScanReport::default();
    for input in inputs {
        if input.is_file() {
            if filter.matches(input) {
                report.files.push(input.clone());
            } else {
                report.warnings.push(format!(
                    "{}: extension not in --file-types, skipped",
                    input.display()
                ));
            }
        } else if input.is_dir() {
            for entry in WalkDir::new(input).sort_by_file_name() {
                match entry {
                    Ok(entry) if entry.file_type().is_file() && filter.matches(entry.path()) => {
                        report.files.push(entry.into_path());
                    }
                    Ok(entry) => debug!("skipping {}", entry.path().display()),
                    Err(e) => report.warnings.push(e.to_string()),
                }
            }
        } else {
            report
                .warnings
                .push(format!("{}: no such file or directory", input.display()));
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn touch(path: &Path) {
        std::fs::write(path, b"x").unwrap();
    }

    #[test]
    fn filter_ignores_case_and_leading_dots() {
        let filter = ExtensionFilter::parse(".avi,MKV, .Mp4 ,");
        assert!(filter.matches(Path::new("a.avi")));
        assert!(filter.matches(Path::new("a.AVI")));
        assert!(filter.matches(Path::new("a.mkv")));
        assert!(filter.matches(Path::new("a.mp4")));
        assert!(!filter.matches(Path::new("a.txt")));
        assert!(!filter.matches(Path::new("avi")));
    }

    #[test]
    fn walks_directories_recursively_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        touch(&dir.path().join("b.mkv"));
        touch(&dir.path().join("a.MKV"));
        touch(&dir.path().join("notes.txt"));
        touch(&dir.path().join("sub").join("c.avi"));

        let filter = ExtensionFilter::parse(".avi,.mkv");
        let report = collect(&[dir.path().to_path_buf()], &filter);

        assert_eq!(
            report.files,
            vec![
                dir.path().join("a.MKV"),
                dir.path().join("b.mkv"),
                dir.path().join("sub").join("c.avi"),
            ]
        );
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn explicit_files_still_pass_through_the_filter() {
        let dir = tempfile::tempdir().unwrap();
        let kept = dir.path().join("keep.avi");
        let skipped = dir.path().join("skip.txt");
        touch(&kept);
        touch(&skipped);

        let filter = ExtensionFilter::parse(".avi");
        let report = collect(&[kept.clone(), skipped], &filter);

        assert_eq!(report.files, vec![kept]);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("skip.txt"));
    }

    #[test]
    fn missing_inputs_become_warnings() {
        let filter = ExtensionFilter::parse(".avi");
        let report = collect(&[PathBuf::from("/no/such/path.avi")], &filter);

        assert!(report.files.is_empty());
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("no such file or directory"));
    }
}
