//! Crate-level error types.

use std::fmt;

/// Errors produced by the sandbox-preview crate.
///
/// Build and runtime failures inside the bundler are not errors in this
/// sense; they arrive as [`ModuleError`](crate::state::ModuleError) entries
/// on the message channel and are accumulated in the store.
#[derive(Debug)]
pub enum PreviewError {
    /// No `/package.json` in the file set and no dependency map to
    /// synthesize one from.
    MissingDependencies,
    /// No `/package.json` in the file set and no entry path to synthesize
    /// one from.
    MissingEntry,
    /// The configured opened path does not name a file in the set.
    UnknownOpenedPath(String),
    /// A `/package.json` could not be generated.
    PackageJson(serde_json::Error),
    /// TOML configuration parsing/serialization failure.
    OptionsParse(String),
    /// Generic I/O failure.
    Io(std::io::Error),
    /// The hidden frame or its host could not be set up.
    Frame(String),
    /// Viewer event-loop failure.
    Viewer(String),
}

impl PreviewError {
    /// Whether this error is a configuration error (raised synchronously
    /// while building or updating the file set).
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MissingDependencies
                | Self::MissingEntry
                | Self::UnknownOpenedPath(_)
        )
    }
}

impl fmt::Display for PreviewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingDependencies => write!(
                f,
                "no dependencies specified, please specify either a \
                 package.json or dependencies"
            ),
            Self::MissingEntry => write!(
                f,
                "no entry specified, please specify either a package.json \
                 with 'main' field or dependencies"
            ),
            Self::UnknownOpenedPath(path) => {
                write!(f, "opened path '{path}' is not in the file set")
            }
            Self::PackageJson(e) => {
                write!(f, "failed to generate package.json: {e}")
            }
            Self::OptionsParse(msg) => {
                write!(f, "options parse error: {msg}")
            }
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Frame(msg) => write!(f, "frame error: {msg}"),
            Self::Viewer(msg) => write!(f, "viewer error: {msg}"),
        }
    }
}

impl std::error::Error for PreviewError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::PackageJson(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PreviewError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for PreviewError {
    fn from(e: serde_json::Error) -> Self {
        Self::PackageJson(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_errors_are_flagged() {
        assert!(PreviewError::MissingDependencies.is_configuration());
        assert!(PreviewError::MissingEntry.is_configuration());
        assert!(PreviewError::UnknownOpenedPath("/a.js".into())
            .is_configuration());
        assert!(!PreviewError::Frame("gone".into()).is_configuration());
    }

    #[test]
    fn display_names_the_missing_path() {
        let msg = PreviewError::UnknownOpenedPath("/App.js".into()).to_string();
        assert!(msg.contains("/App.js"));
    }
}
