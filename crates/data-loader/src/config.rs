//! File locations for every input and store.
//!
//! All paths derive from a data directory and a models directory, which
//! the binaries take from command line arguments.

use std::path::{Path, PathBuf};

pub const INTERACTIONS_FILE: &str = "Electronics.csv.gz";
pub const TITLES_FILE: &str = "asin_title_map.csv";
pub const IMAGES_FILE: &str = "asin_image_map.csv";
pub const USERS_FILE: &str = "users.csv";
pub const FEEDBACK_FILE: &str = "user_feedback.csv";
pub const MODEL_FILE: &str = "factor_model.json";

/// Release location of the prepared catalog files.
const RELEASE_BASE_URL: &str =
    "https://github.com/kaveeshaDivyanjalee/Smart-Recommender/releases/download/v1.0";

/// Resolved paths of all data files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub interactions: PathBuf,
    pub titles: PathBuf,
    pub images: PathBuf,
    pub model: PathBuf,
    pub users: PathBuf,
    pub feedback: PathBuf,
}

impl DataPaths {
    /// Standard layout: catalog and stores under `data_dir`, the model
    /// artifact under `models_dir`.
    pub fn new(data_dir: &Path, models_dir: &Path) -> Self {
        Self {
            interactions: data_dir.join(INTERACTIONS_FILE),
            titles: data_dir.join(TITLES_FILE),
            images: data_dir.join(IMAGES_FILE),
            model: models_dir.join(MODEL_FILE),
            users: data_dir.join(USERS_FILE),
            feedback: data_dir.join(FEEDBACK_FILE),
        }
    }

    /// Replace the model artifact location
    pub fn with_model(mut self, model: PathBuf) -> Self {
        self.model = model;
        self
    }

    /// Files that can be fetched from the release when missing.
    ///
    /// The model artifact is only included when a URL is supplied, since
    /// the published release carries the model in a format this loader
    /// does not read.
    pub fn remote_files(&self, model_url: Option<&str>) -> Vec<RemoteFile> {
        let mut files = vec![
            RemoteFile::new(&self.interactions, format!("{}/{}", RELEASE_BASE_URL, INTERACTIONS_FILE)),
            RemoteFile::new(&self.titles, format!("{}/{}", RELEASE_BASE_URL, TITLES_FILE)),
            RemoteFile::new(&self.images, format!("{}/{}", RELEASE_BASE_URL, IMAGES_FILE)),
        ];
        if let Some(url) = model_url {
            files.push(RemoteFile::new(&self.model, url.to_string()));
        }
        files
    }
}

impl Default for DataPaths {
    fn default() -> Self {
        Self::new(Path::new("data"), Path::new("models"))
    }
}

/// A local file paired with the URL it can be downloaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub path: PathBuf,
    pub url: String,
}

impl RemoteFile {
    pub fn new(path: &Path, url: String) -> Self {
        Self {
            path: path.to_path_buf(),
            url,
        }
    }
}
