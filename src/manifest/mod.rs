//! Application manifest (`package.json`) discovery.
//!
//! The packaged application directory is expected to follow the Electron
//! layout, where the app sources live either in `resources/app.asar` or,
//! unpacked, in `resources/app/`.

pub mod asar;

use crate::error::ManifestError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Subset of `package.json` used to derive nuspec metadata.
///
/// Every field accepts any JSON value, so one oddly typed entry never
/// discards the rest of the manifest.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AppManifest {
    /// Package name
    #[serde(default)]
    pub name: Option<ManifestValue>,
    /// Package version
    #[serde(default)]
    pub version: Option<ManifestValue>,
    /// Package description
    #[serde(default)]
    pub description: Option<ManifestValue>,
    /// Project homepage
    #[serde(default)]
    pub homepage: Option<ManifestValue>,
    /// Package author, a string, a person object or a list of either
    #[serde(default)]
    pub author: Option<ManifestValue>,
    /// Package keywords
    #[serde(default)]
    pub keywords: Option<ManifestValue>,
}

/// A manifest value as written in `package.json`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ManifestValue {
    /// `"Jane Doe <jane@example.com>"`
    Text(String),
    /// `1.2`
    Number(serde_json::Number),
    /// `true`
    Flag(bool),
    /// `{ "name": "Jane Doe", "email": "jane@example.com" }`
    Person {
        /// Person name
        name: String,
        /// Person email
        #[serde(default)]
        email: Option<String>,
        /// Person homepage
        #[serde(default)]
        url: Option<String>,
    },
    /// `["Jane", { "name": "Joe" }]`
    List(Vec<ManifestValue>),
    /// Anything else; ignored when mapping metadata
    Other(serde_json::Value),
}

impl ManifestValue {
    /// Scalar text of this value; a person contributes its name
    pub fn as_text(&self) -> Option<String> {
        match self {
            ManifestValue::Text(text) => Some(text.clone()),
            ManifestValue::Number(number) => Some(number.to_string()),
            ManifestValue::Flag(flag) => Some(flag.to_string()),
            ManifestValue::Person { name, .. } => Some(name.clone()),
            ManifestValue::List(_) | ManifestValue::Other(_) => None,
        }
    }
}

/// Where to obtain manifest data from
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ManifestSource {
    /// Probe `resources/app.asar`, then `resources/app/package.json`
    #[default]
    Auto,
    /// Read this file
    Path(PathBuf),
    /// Use this data as is
    Inline(AppManifest),
    /// Do not use a manifest
    Disabled,
}

/// Manifest path inside the packed archive
const ASAR_MANIFEST: &str = "package.json";

/// Packed archive location relative to the application directory
pub fn asar_path(src: &Path) -> PathBuf {
    src.join("resources").join("app.asar")
}

/// Unpacked manifest location relative to the application directory
pub fn unpacked_manifest_path(src: &Path) -> PathBuf {
    src.join("resources").join("app").join("package.json")
}

/// Resolve manifest data for the application in `src`.
///
/// In [`ManifestSource::Auto`] mode every failure falls through to the next
/// candidate and finally to `Ok(None)`. An explicit path that cannot be read
/// or parsed is an error.
pub async fn discover(
    src: &Path,
    source: &ManifestSource,
) -> Result<Option<AppManifest>, ManifestError> {
    match source {
        ManifestSource::Auto => Ok(probe(src).await),
        ManifestSource::Path(path) => read_manifest(path).await.map(Some),
        ManifestSource::Inline(manifest) => Ok(Some(manifest.clone())),
        ManifestSource::Disabled => Ok(None),
    }
}

async fn probe(src: &Path) -> Option<AppManifest> {
    let archive = asar_path(src);
    match read_from_asar(&archive).await {
        Ok(manifest) => {
            log::debug!("Using package.json from {}", archive.display());
            return Some(manifest);
        }
        Err(e) => log::debug!("No packed manifest: {e}"),
    }

    let unpacked = unpacked_manifest_path(src);
    match read_manifest(&unpacked).await {
        Ok(manifest) => {
            log::debug!("Using {}", unpacked.display());
            Some(manifest)
        }
        Err(e) => {
            log::debug!("No unpacked manifest: {e}");
            None
        }
    }
}

async fn read_from_asar(archive: &Path) -> Result<AppManifest, ManifestError> {
    let bytes = asar::extract_file(archive, ASAR_MANIFEST).await?;
    serde_json::from_slice(&bytes).map_err(|source| ManifestError::Parse {
        path: archive.join(ASAR_MANIFEST),
        source,
    })
}

/// Read and parse a `package.json` file
pub async fn read_manifest(path: &Path) -> Result<AppManifest, ManifestError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    serde_json::from_slice(&bytes).map_err(|source| ManifestError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_unpacked(src: &Path, json: &str) {
        let path = unpacked_manifest_path(src);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, json).unwrap();
    }

    fn write_asar(src: &Path, json: &str) {
        let path = asar_path(src);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, asar::build_archive(&[("package.json", json.as_bytes())])).unwrap();
    }

    #[tokio::test]
    async fn test_auto_uses_unpacked_when_no_archive() {
        let dir = tempfile::tempdir().unwrap();
        write_unpacked(dir.path(), r#"{"name": "unpacked", "version": "1.0.0"}"#);

        let manifest = discover(dir.path(), &ManifestSource::Auto).await.unwrap();
        assert_eq!(manifest.unwrap().name, Some(ManifestValue::Text("unpacked".into())));
    }

    #[tokio::test]
    async fn test_auto_prefers_archive() {
        let dir = tempfile::tempdir().unwrap();
        write_unpacked(dir.path(), r#"{"name": "unpacked"}"#);
        write_asar(dir.path(), r#"{"name": "packed"}"#);

        let manifest = discover(dir.path(), &ManifestSource::Auto).await.unwrap();
        assert_eq!(manifest.unwrap().name, Some(ManifestValue::Text("packed".into())));
    }

    #[tokio::test]
    async fn test_auto_falls_through_broken_archive() {
        let dir = tempfile::tempdir().unwrap();
        write_unpacked(dir.path(), r#"{"name": "unpacked"}"#);
        write_asar(dir.path(), "{ not json");

        let manifest = discover(dir.path(), &ManifestSource::Auto).await.unwrap();
        assert_eq!(manifest.unwrap().name, Some(ManifestValue::Text("unpacked".into())));
    }

    #[tokio::test]
    async fn test_auto_without_manifest_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = discover(dir.path(), &ManifestSource::Auto).await.unwrap();
        assert!(manifest.is_none());
    }

    #[tokio::test]
    async fn test_explicit_path_errors_are_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("package.json");
        let err = discover(dir.path(), &ManifestSource::Path(missing))
            .await
            .unwrap_err();
        assert!(matches!(err, ManifestError::Read { .. }));
    }

    #[tokio::test]
    async fn test_inline_and_disabled() {
        let dir = tempfile::tempdir().unwrap();
        write_unpacked(dir.path(), r#"{"name": "unpacked"}"#);

        let inline = AppManifest {
            name: Some(ManifestValue::Text("inline".into())),
            ..Default::default()
        };
        let found = discover(dir.path(), &ManifestSource::Inline(inline.clone()))
            .await
            .unwrap();
        assert_eq!(found, Some(inline));

        let found = discover(dir.path(), &ManifestSource::Disabled).await.unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn test_author_shapes() {
        let manifest: AppManifest =
            serde_json::from_str(r#"{"author": "Jane <jane@example.com>"}"#).unwrap();
        assert_eq!(
            manifest.author,
            Some(ManifestValue::Text("Jane <jane@example.com>".into()))
        );

        let manifest: AppManifest = serde_json::from_str(r#"{"author": {"name": "Jane"}}"#).unwrap();
        assert!(
            matches!(manifest.author, Some(ManifestValue::Person { ref name, .. }) if name == "Jane")
        );

        let manifest: AppManifest =
            serde_json::from_str(r#"{"author": ["Jane", {"name": "Joe"}]}"#).unwrap();
        let Some(ManifestValue::List(items)) = manifest.author else {
            panic!("author list not recognised");
        };
        let names: Vec<_> = items.iter().filter_map(ManifestValue::as_text).collect();
        assert_eq!(names, vec!["Jane", "Joe"]);
    }

    #[test]
    fn test_odd_field_types_keep_manifest() {
        let manifest: AppManifest = serde_json::from_str(
            r#"{"name": "foo", "version": "1.0.0", "keywords": "a b", "homepage": {"url": "x"}}"#,
        )
        .unwrap();
        assert_eq!(manifest.name, Some(ManifestValue::Text("foo".into())));
        assert_eq!(manifest.version, Some(ManifestValue::Text("1.0.0".into())));
        assert_eq!(manifest.keywords, Some(ManifestValue::Text("a b".into())));
        assert!(matches!(manifest.homepage, Some(ManifestValue::Other(_))));
    }

    #[tokio::test]
    async fn test_auto_falls_through_oversized_archive_entry() {
        let dir = tempfile::tempdir().unwrap();
        write_unpacked(dir.path(), r#"{"name": "unpacked"}"#);
        let path = asar_path(dir.path());
        std::fs::write(
            path,
            asar::build_raw_archive(
                br#"{"files":{"package.json":{"size":18446744073709551615,"offset":"0"}}}"#,
                b"{}",
            ),
        )
        .unwrap();

        let manifest = discover(dir.path(), &ManifestSource::Auto).await.unwrap();
        assert_eq!(
            manifest.unwrap().name,
            Some(ManifestValue::Text("unpacked".into()))
        );
    }
}
