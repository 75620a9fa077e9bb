use crate::error::{ReportError, Result};
use directories::ProjectDirs;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReportConfig {
    /// Where result files live; relative paths resolve against the
    /// working directory.
    pub files_dir: PathBuf,
    pub visualizations_dir: PathBuf,
    /// Subdirectory of `files_dir` holding per-player files to combine.
    pub combine_dir_name: String,
    pub multiplayer_dir_name: String,
    pub single_player_dir_name: String,
    /// Single-player inputs, relative to `files_dir`.
    pub test_results_file: String,
    pub word_results_file: String,
    pub verse_catalog_file: String,
    pub word_stoplist: Vec<String>,
    pub min_word_count: usize,
    pub rolling_windows: Vec<usize>,
    pub top_n: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            files_dir: PathBuf::from("Files"),
            visualizations_dir: PathBuf::from("Visualizations"),
            combine_dir_name: "MP_Test_Result_Files_To_Combine".to_string(),
            multiplayer_dir_name: "Multiplayer".to_string(),
            single_player_dir_name: "Single_Player".to_string(),
            test_results_file: "test_results.csv".to_string(),
            word_results_file: "word_results.csv".to_string(),
            verse_catalog_file: "CPDB_for_TTTB.csv".to_string(),
            word_stoplist: vec!["s".to_string()],
            min_word_count: 10,
            rolling_windows: vec![10, 50, 100, 1000],
            top_n: 50,
        }
    }
}

impl ReportConfig {
    pub fn combine_dir(&self) -> PathBuf {
        self.files_dir.join(&self.combine_dir_name)
    }

    /// Combined and native multiplayer results files.
    pub fn multiplayer_results_dir(&self) -> PathBuf {
        self.files_dir.join(&self.multiplayer_dir_name)
    }

    pub fn test_results_path(&self) -> PathBuf {
        self.files_dir.join(&self.test_results_file)
    }

    pub fn word_results_path(&self) -> PathBuf {
        self.files_dir.join(&self.word_results_file)
    }

    pub fn verse_catalog_path(&self) -> PathBuf {
        self.files_dir.join(&self.verse_catalog_file)
    }

    pub fn multiplayer_visualizations_dir(&self) -> PathBuf {
        self.visualizations_dir.join(&self.multiplayer_dir_name)
    }

    pub fn single_player_visualizations_dir(&self) -> PathBuf {
        self.visualizations_dir.join(&self.single_player_dir_name)
    }
}

pub trait ConfigStore {
    fn load(&self) -> ReportConfig;
    fn save(&self, cfg: &ReportConfig) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "tttb-reports") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("tttb_reports_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    /// A missing file means defaults; an unreadable one is reported and
    /// also falls back to defaults.
    fn load(&self) -> ReportConfig {
        let Ok(bytes) = fs::read(&self.path) else {
            return ReportConfig::default();
        };
        match serde_json::from_slice::<ReportConfig>(&bytes) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("ignoring config {}: {e}", self.path.display());
                ReportConfig::default()
            }
        }
    }

    fn save(&self, cfg: &ReportConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| ReportError::io(parent, e))?;
        }
        let data = serde_json::to_vec_pretty(cfg).map_err(|e| ReportError::json(&self.path, e))?;
        fs::write(&self.path, data).map_err(|e| ReportError::io(&self.path, e))
    }
}
