use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Project not found in DerivedData: {0}")]
    ProjectNotFound(String),

    #[error("No build logs found for project {0}")]
    NoBuildLogs(String),

    #[error("Invalid project directory name: {0:?}")]
    InvalidProject(String),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decompress {}: {source}", path.display())]
    Decompress {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid pattern rule '{name}': {reason}")]
    InvalidRule { name: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Stable machine-readable tag, used in structured tool results.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ProjectNotFound(_) | Self::NoBuildLogs(_) => "not_found",
            Self::InvalidProject(_) => "invalid_project",
            Self::Io { .. } => "io",
            Self::Decompress { .. } => "decompress",
            Self::InvalidRule { .. } => "invalid_rule",
            Self::InvalidConfig(_) => "invalid_config",
        }
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::ProjectNotFound(_) | Self::NoBuildLogs(_))
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_variants_share_kind() {
        assert_eq!(Error::ProjectNotFound("A-x".into()).kind(), "not_found");
        assert_eq!(Error::NoBuildLogs("A-x".into()).kind(), "not_found");
        assert!(Error::NoBuildLogs("A-x".into()).is_not_found());
    }

    #[test]
    fn io_error_message_names_path() {
        let err = Error::io(
            "/tmp/missing.xcactivitylog",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.kind(), "io");
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("/tmp/missing.xcactivitylog"));
    }
}
