//! Options files.
//!
//! Options can be kept in a JSON or TOML file using the same keys the
//! JavaScript tooling used:
//!
//! ```toml
//! src = "out/MyApp-win32-x64"
//! dest = "out/installer"
//! exe = "MyApp.exe"
//! setupExe = "MyApp-Setup.exe"
//! manifest = true
//!
//! [metadata]
//! authors = "My Company"
//! ```
//!
//! Values are loosely typed in the file, so every key is checked here and a
//! wrong type is reported with the key name.

use super::PackagerConfigBuilder;
use crate::error::ConfigError;
use crate::manifest::{AppManifest, ManifestSource};
use crate::nuspec::MetadataOverrides;
use serde_json::Value;
use std::path::Path;

const STRING_OR_FALSY: &str = "a string or falsy";
const STRING: &str = "a string";

/// Read an options file into a builder
pub async fn load_options(path: &Path) -> Result<PackagerConfigBuilder, ConfigError> {
    let load_err = |reason: String| ConfigError::Load {
        path: path.to_path_buf(),
        reason,
    };

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| load_err(e.to_string()))?;

    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let value: Value = if is_toml {
        toml::from_str(&content).map_err(|e| load_err(e.to_string()))?
    } else {
        serde_json::from_str(&content).map_err(|e| load_err(e.to_string()))?
    };

    log::debug!("Loaded options from {}", path.display());
    apply_options(PackagerConfigBuilder::new(), &value)
}

/// Apply a loosely typed options object to `builder`
pub fn apply_options(
    mut builder: PackagerConfigBuilder,
    options: &Value,
) -> Result<PackagerConfigBuilder, ConfigError> {
    let Value::Object(map) = options else {
        return Err(ConfigError::InvalidType {
            field: "options".to_string(),
            expected: "an object",
        });
    };

    for (key, value) in map {
        builder = match key.as_str() {
            "src" => builder.src(required_string(key, value)?),
            "dest" => builder.dest(required_string(key, value)?),
            "exe" => builder.exe(required_string(key, value)?),
            "loadingGif" => builder.loading_gif(optional_string(key, value)?),
            "setupExe" => builder.setup_exe(optional_string(key, value)?),
            "setupIcon" => builder.setup_icon(optional_string(key, value)?),
            "remoteReleases" => builder.remote_releases(optional_string(key, value)?),
            "certificateFile" => builder.certificate_file(optional_string(key, value)?),
            "certificatePassword" => builder.certificate_password(optional_string(key, value)?),
            "signWithParams" => builder.sign_with_params(optional_string(key, value)?),
            "toolsDir" => builder.tools_dir(optional_string(key, value)?),
            "manifest" | "packageJson" => builder.manifest(manifest_source(key, value)?),
            "metadata" => match value {
                Value::Object(_) => {
                    let overrides: MetadataOverrides = serde_json::from_value(value.clone())
                        .map_err(|e| ConfigError::InvalidValue {
                            field: key.clone(),
                            reason: e.to_string(),
                        })?;
                    builder.metadata(&overrides)
                }
                v if is_falsy(v) => builder,
                _ => {
                    return Err(ConfigError::InvalidType {
                        field: key.clone(),
                        expected: "an object or falsy",
                    });
                }
            },
            other => {
                log::warn!("Ignoring unknown option \"{other}\"");
                builder
            }
        };
    }

    Ok(builder)
}

/// JavaScript falsiness, which the option vocabulary was designed around
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::Array(_) | Value::Object(_) => false,
    }
}

fn required_string(key: &str, value: &Value) -> Result<String, ConfigError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        _ => Err(ConfigError::InvalidType {
            field: key.to_string(),
            expected: STRING,
        }),
    }
}

fn optional_string(key: &str, value: &Value) -> Result<String, ConfigError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        v if is_falsy(v) => Ok(String::new()),
        _ => Err(ConfigError::InvalidType {
            field: key.to_string(),
            expected: STRING_OR_FALSY,
        }),
    }
}

fn manifest_source(key: &str, value: &Value) -> Result<ManifestSource, ConfigError> {
    match value {
        Value::Bool(true) => Ok(ManifestSource::Auto),
        Value::String(s) if !s.is_empty() => Ok(ManifestSource::Path(s.into())),
        Value::Object(_) => {
            let manifest: AppManifest =
                serde_json::from_value(value.clone()).map_err(|e| ConfigError::InvalidValue {
                    field: key.to_string(),
                    reason: e.to_string(),
                })?;
            Ok(ManifestSource::Inline(manifest))
        }
        v if is_falsy(v) => Ok(ManifestSource::Disabled),
        _ => Err(ConfigError::InvalidType {
            field: key.to_string(),
            expected: "true, a string, an object or falsy",
        }),
    }
}
