//! File sets handed to the bundler, plus `/package.json` synthesis.
//!
//! A file set is keyed by absolute path (`/src/App.js`). The bundler needs a
//! package descriptor to resolve the entry point and npm dependencies; when
//! the caller does not supply one it is generated from the dependency map
//! and entry path.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::PreviewError;

/// Path of the package descriptor inside every file set.
pub const PACKAGE_JSON_PATH: &str = "/package.json";

/// `name` written into synthesized descriptors.
const PROJECT_NAME: &str = "preview-project";

/// File set: absolute path → file.
pub type Files = BTreeMap<String, SandboxFile>;

/// npm dependency map: package name → version range.
pub type Dependencies = BTreeMap<String, String>;

/// One source file plus editor metadata.
///
/// Deserializes from either a bare string (the code) or a table with
/// `code` and optional flags, so config files can stay terse.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Default, JsonSchema)]
pub struct SandboxFile {
    /// File contents.
    pub code: String,
    /// Hide the file from file explorers.
    #[serde(default, skip_serializing_if = "is_false")]
    pub hidden: bool,
    /// Open this file first in editor views.
    #[serde(default, skip_serializing_if = "is_false")]
    pub active: bool,
    /// Editors must not modify this file.
    #[serde(default, skip_serializing_if = "is_false")]
    pub read_only: bool,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(v: &bool) -> bool {
    !*v
}

impl SandboxFile {
    /// A plain file with no metadata.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            ..Self::default()
        }
    }
}

impl<'de> Deserialize<'de> for SandboxFile {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Code(String),
            Full {
                code: String,
                #[serde(default)]
                hidden: bool,
                #[serde(default)]
                active: bool,
                #[serde(default)]
                read_only: bool,
            },
        }

        Ok(match Repr::deserialize(d)? {
            Repr::Code(code) => Self::new(code),
            Repr::Full {
                code,
                hidden,
                active,
                read_only,
            } => Self {
                code,
                hidden,
                active,
                read_only,
            },
        })
    }
}

/// Prefix `path` with `/` when it is relative.
#[must_use]
pub fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_owned()
    } else {
        format!("/{path}")
    }
}

/// Re-key a file set so every path is absolute.
#[must_use]
pub fn normalize_files(files: Files) -> Files {
    files
        .into_iter()
        .map(|(path, file)| (normalize_path(&path), file))
        .collect()
}

/// Build a file set from `(path, code)` pairs.
#[must_use]
pub fn files_from_code<I, P, C>(entries: I) -> Files
where
    I: IntoIterator<Item = (P, C)>,
    P: AsRef<str>,
    C: Into<String>,
{
    entries
        .into_iter()
        .map(|(path, code)| (normalize_path(path.as_ref()), SandboxFile::new(code)))
        .collect()
}

/// Render a `package.json` body for the given dependencies and entry.
///
/// # Errors
///
/// [`PreviewError::PackageJson`] if serialization fails.
pub fn create_package_json(
    dependencies: &Dependencies,
    entry: &str,
) -> Result<String, PreviewError> {
    let descriptor = serde_json::json!({
        "name": PROJECT_NAME,
        "main": entry,
        "dependencies": dependencies,
    });
    Ok(serde_json::to_string_pretty(&descriptor)?)
}

/// Return `files` with a synthesized `/package.json` when it lacks one.
///
/// # Errors
///
/// [`PreviewError::MissingDependencies`] or [`PreviewError::MissingEntry`]
/// when no descriptor exists and it cannot be generated.
pub fn create_missing_package_json(
    mut files: Files,
    dependencies: Option<&Dependencies>,
    entry: Option<&str>,
) -> Result<Files, PreviewError> {
    if files.contains_key(PACKAGE_JSON_PATH) {
        return Ok(files);
    }
    let dependencies = dependencies.ok_or(PreviewError::MissingDependencies)?;
    let entry = entry.ok_or(PreviewError::MissingEntry)?;

    log::debug!("synthesizing {PACKAGE_JSON_PATH} with entry {entry}");
    let code = create_package_json(dependencies, &normalize_path(entry))?;
    let _ = files.insert(PACKAGE_JSON_PATH.to_owned(), SandboxFile::new(code));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deps() -> Dependencies {
        [("react".to_owned(), "^18.2.0".to_owned())].into_iter().collect()
    }

    #[test]
    fn synthesized_descriptor_uses_entry_and_dependencies() {
        let files = files_from_code([("/index.js", "console.log(1)")]);
        let files =
            create_missing_package_json(files, Some(&deps()), Some("/index.js"))
                .unwrap();

        let pkg: serde_json::Value =
            serde_json::from_str(&files[PACKAGE_JSON_PATH].code).unwrap();
        assert_eq!(pkg["main"], "/index.js");
        assert_eq!(pkg["dependencies"], serde_json::to_value(deps()).unwrap());
    }

    #[test]
    fn missing_dependencies_is_a_configuration_error() {
        let files = files_from_code([("/index.js", "")]);
        let err = create_missing_package_json(files, None, Some("/index.js"))
            .unwrap_err();
        assert!(matches!(err, PreviewError::MissingDependencies));
    }

    #[test]
    fn missing_entry_is_a_configuration_error() {
        let files = files_from_code([("/index.js", "")]);
        let err =
            create_missing_package_json(files, Some(&deps()), None).unwrap_err();
        assert!(matches!(err, PreviewError::MissingEntry));
    }

    #[test]
    fn existing_descriptor_is_kept_verbatim() {
        let files = files_from_code([
            ("/index.js", ""),
            ("/package.json", "{\"main\":\"/index.js\"}"),
        ]);
        let out = create_missing_package_json(files.clone(), None, None).unwrap();
        assert_eq!(out, files);
    }

    #[test]
    fn empty_dependency_map_still_counts() {
        let files = files_from_code([("src/main.js", "")]);
        let out = create_missing_package_json(
            files,
            Some(&Dependencies::new()),
            Some("src/main.js"),
        )
        .unwrap();
        assert!(out.contains_key("/src/main.js"));
        let pkg: serde_json::Value =
            serde_json::from_str(&out[PACKAGE_JSON_PATH].code).unwrap();
        assert_eq!(pkg["main"], "/src/main.js");
    }

    #[test]
    fn file_deserializes_from_string_or_table() {
        let files: Files = serde_json::from_str(
            r#"{"/a.js": "let a;", "/b.js": {"code": "let b;", "hidden": true}}"#,
        )
        .unwrap();
        assert_eq!(files["/a.js"], SandboxFile::new("let a;"));
        assert!(files["/b.js"].hidden);
        assert!(!files["/b.js"].read_only);
    }
}
