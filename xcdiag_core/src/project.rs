use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot of one project directory under the DerivedData root.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectRecord {
    /// Project name with Xcode's `-<hash>` suffix removed.
    pub name: String,
    /// Directory name as it appears on disk; pass this to the extractor.
    pub directory_name: String,
    pub directory_path: String,
    pub has_build_logs: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_log: Option<String>,
    /// Modification time of the newest build log, or of the directory itself.
    pub last_modified: DateTime<Utc>,
}

impl ProjectRecord {
    /// Derive the display name from a DerivedData directory name.
    ///
    /// Xcode appends a 28 character lowercase hash (`MyApp-bqzxkmf...`). The
    /// suffix is only stripped when it looks like such a hash so names that
    /// merely contain a dash survive.
    #[must_use]
    pub fn name_from_directory(directory_name: &str) -> String {
        match directory_name.rsplit_once('-') {
            Some((name, hash))
                if !name.is_empty()
                    && hash.len() >= 16
                    && hash.chars().all(|c| c.is_ascii_lowercase()) =>
            {
                name.to_string()
            }
            _ => directory_name.to_string(),
        }
    }
}
