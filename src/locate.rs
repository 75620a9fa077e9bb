use crate::error::{ReportError, Result};
use itertools::Itertools;
use log::debug;
use std::convert::Infallible;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::SystemTime;

pub const RESULTS_MARKER: &str = "test_results";
const RESULTS_SUFFIX: &str = "_test_results.csv";

/// Which results file a report should chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultSelector {
    /// The most recently modified results file (`y` or `Y`).
    MostRecent,
    /// An explicit csv path.
    Path(PathBuf),
    /// A results file whose name contains this timestamp.
    Timestamp(String),
}

impl FromStr for ResultSelector {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        Ok(match s {
            "y" | "Y" => ResultSelector::MostRecent,
            _ if s.ends_with(".csv") => ResultSelector::Path(PathBuf::from(s)),
            _ => ResultSelector::Timestamp(s.to_string()),
        })
    }
}

fn results_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| ReportError::io(dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| ReportError::io(dir, e))?.path();
        let is_results = path
            .file_name()
            .map(|n| n.to_string_lossy().contains(RESULTS_MARKER))
            .unwrap_or(false);
        if path.is_file() && is_results {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn modified(path: &Path) -> SystemTime {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .unwrap_or(SystemTime::UNIX_EPOCH)
}

/// Resolve a selector to a results file inside `dir`.
pub fn locate_results(dir: &Path, selector: &ResultSelector) -> Result<PathBuf> {
    let found = match selector {
        ResultSelector::Path(path) => {
            let candidates = [path.clone(), dir.join(path)];
            candidates.into_iter().find(|p| p.is_file())
        }
        ResultSelector::MostRecent => results_files(dir)?
            .into_iter()
            .max_by_key(|p| modified(p)),
        ResultSelector::Timestamp(stamp) => results_files(dir)?
            .into_iter()
            .filter(|p| {
                p.file_name()
                    .map(|n| n.to_string_lossy().contains(stamp.as_str()))
                    .unwrap_or(false)
            })
            .sorted()
            .next(),
    };
    match found {
        Some(path) => {
            debug!("using results file {}", path.display());
            Ok(path)
        }
        None => Err(ReportError::NoResultFile(format!(
            "nothing matching {selector:?} in {}",
            dir.display()
        ))),
    }
}

/// File name without the trailing `_test_results.csv`, used to prefix
/// chart names.
pub fn results_name(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match name.strip_suffix(RESULTS_SUFFIX) {
        Some(stem) => stem.to_string(),
        None => path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::fs::File;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn parses_selectors() {
        assert_eq!("Y".parse::<ResultSelector>().unwrap(), ResultSelector::MostRecent);
        assert_eq!(
            "20250706T220000".parse::<ResultSelector>().unwrap(),
            ResultSelector::Timestamp("20250706T220000".to_string())
        );
        assert_matches!("a/b.csv".parse::<ResultSelector>().unwrap(), ResultSelector::Path(_));
    }

    #[test]
    fn most_recent_uses_modification_time() {
        let dir = tempdir().unwrap();
        let older = dir.path().join("20250101T000000_CMR_test_results.csv");
        let newer = dir.path().join("20240101T000000_CMR_test_results.csv");
        File::create(&older).unwrap();
        File::create(&newer).unwrap();
        File::create(dir.path().join("notes.csv")).unwrap();
        let base = SystemTime::now();
        File::options()
            .write(true)
            .open(&older)
            .unwrap()
            .set_modified(base - Duration::from_secs(3600))
            .unwrap();
        File::options().write(true).open(&newer).unwrap().set_modified(base).unwrap();

        assert_eq!(locate_results(dir.path(), &ResultSelector::MostRecent).unwrap(), newer);
    }

    #[test]
    fn timestamp_matches_file_name() {
        let dir = tempdir().unwrap();
        let wanted = dir.path().join("20250706T220000_CMR_test_results.csv");
        File::create(&wanted).unwrap();
        File::create(dir.path().join("20250707T080000_CMR_test_results.csv")).unwrap();

        let selector = ResultSelector::Timestamp("20250706T22".to_string());
        assert_eq!(locate_results(dir.path(), &selector).unwrap(), wanted);

        let missing = ResultSelector::Timestamp("1999".to_string());
        assert_matches!(
            locate_results(dir.path(), &missing),
            Err(ReportError::NoResultFile(_))
        );
    }

    #[test]
    fn empty_directory_has_no_most_recent() {
        let dir = tempdir().unwrap();
        assert_matches!(
            locate_results(dir.path(), &ResultSelector::MostRecent),
            Err(ReportError::NoResultFile(_))
        );
    }

    #[test]
    fn results_name_strips_suffix() {
        assert_eq!(
            results_name(Path::new("Files/20250706T220000_CMR_test_results.csv")),
            "20250706T220000_CMR"
        );
        assert_eq!(results_name(Path::new("other.csv")), "other");
    }
}
