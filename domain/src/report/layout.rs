//! On-disk layout of a case directory.
//!
//! ```text
//! <case_dir>/
//!   <YYYYMMDD>_<token>/
//!     analysis_cache.json
//!     document_analysis_<token>.json
//!     document_analysis_<token>.md
//!     pipeline.jsonl
//!     defense_materials/
//!       defense_strategy.md
//!       action_items.md
//!       case_timeline.md
//!   <YYYYMMDD>_<token>.md
//!   model_comparison_<YYYYMMDD>.md
//! ```

use crate::cache::CacheScope;
use crate::core::model::Model;
use crate::defense::DefenseKind;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

pub const CACHE_FILE_NAME: &str = "analysis_cache.json";
pub const RUN_LOG_FILE_NAME: &str = "pipeline.jsonl";
pub const DEFENSE_DIR_NAME: &str = "defense_materials";

/// Paths for one (case directory, model, date) run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLayout {
    case_dir: PathBuf,
    model: Model,
    token: String,
    date: NaiveDate,
}

impl RunLayout {
    pub fn new(case_dir: impl Into<PathBuf>, model: &Model, date: NaiveDate) -> Self {
        Self {
            case_dir: case_dir.into(),
            model: model.clone(),
            token: model.token(),
            date,
        }
    }

    pub fn case_dir(&self) -> &Path {
        &self.case_dir
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn date_stamp(&self) -> String {
        date_stamp(self.date)
    }

    /// `<YYYYMMDD>_<token>`
    pub fn run_dir_name(&self) -> String {
        format!("{}_{}", self.date_stamp(), self.token)
    }

    pub fn run_dir(&self) -> PathBuf {
        self.case_dir.join(self.run_dir_name())
    }

    pub fn cache_file(&self) -> PathBuf {
        self.run_dir().join(CACHE_FILE_NAME)
    }

    pub fn run_log(&self) -> PathBuf {
        self.run_dir().join(RUN_LOG_FILE_NAME)
    }

    pub fn analysis_json_name(&self) -> String {
        format!("document_analysis_{}.json", self.token)
    }

    pub fn analysis_markdown_name(&self) -> String {
        format!("document_analysis_{}.md", self.token)
    }

    pub fn analysis_json(&self) -> PathBuf {
        self.run_dir().join(self.analysis_json_name())
    }

    pub fn analysis_markdown(&self) -> PathBuf {
        self.run_dir().join(self.analysis_markdown_name())
    }

    /// Analysis JSON placed directly in the case directory by older runs
    pub fn case_root_analysis_json(&self) -> PathBuf {
        self.case_dir.join(self.analysis_json_name())
    }

    pub fn defense_dir(&self) -> PathBuf {
        self.run_dir().join(DEFENSE_DIR_NAME)
    }

    pub fn defense_file(&self, kind: DefenseKind) -> PathBuf {
        self.defense_dir().join(kind.file_name())
    }

    pub fn combined_report(&self) -> PathBuf {
        self.case_dir.join(format!("{}.md", self.run_dir_name()))
    }

    /// Links relative to the case directory, as used from the combined
    /// report and the comparison summary.
    pub fn relative_analysis_markdown(&self) -> String {
        format!("{}/{}", self.run_dir_name(), self.analysis_markdown_name())
    }

    pub fn relative_defense_file(&self, kind: DefenseKind) -> String {
        format!(
            "{}/{}/{}",
            self.run_dir_name(),
            DEFENSE_DIR_NAME,
            kind.file_name()
        )
    }

    pub fn relative_combined_report(&self) -> String {
        format!("{}.md", self.run_dir_name())
    }

    pub fn cache_scope(&self) -> CacheScope {
        CacheScope::new(&self.case_dir, self.model.clone(), self.cache_file())
    }
}

/// `YYYYMMDD`
pub fn date_stamp(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Split a run directory name into its date and model token.
///
/// Only names of the exact form `<YYYYMMDD>_<token>` are accepted.
pub fn parse_run_dir_name(name: &str) -> Option<(NaiveDate, &str)> {
    let (stamp, token) = name.split_once('_')?;
    if stamp.len() != 8 || token.is_empty() {
        return None;
    }
    let date = NaiveDate::parse_from_str(stamp, "%Y%m%d").ok()?;
    Some((date, token))
}

/// `<case_dir>/model_comparison_<YYYYMMDD>.md`
pub fn comparison_summary_path(case_dir: &Path, date: NaiveDate) -> PathBuf {
    case_dir.join(format!("model_comparison_{}.md", date_stamp(date)))
}
