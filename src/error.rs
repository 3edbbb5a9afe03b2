//! Error types for squirrel packaging operations.
//!
//! Every failure in the pipeline surfaces as a [`PackagerError`]. Configuration
//! errors name the offending field, tool errors carry the captured output of
//! the failed process, and filesystem errors carry the path involved.

use std::fmt::Display;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for packaging operations
pub type Result<T> = std::result::Result<T, PackagerError>;

/// Main error type for all packaging operations
#[derive(Error, Debug)]
pub enum PackagerError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Manifest discovery errors
    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// External tool errors
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    /// File system error with path context.
    ///
    /// Created by the [`ErrorExt`] trait's `fs_context` method.
    #[error("{context} {path}: {error}")]
    Fs {
        /// Context describing the operation (e.g., "writing nuspec")
        context: &'static str,
        /// Path that was being accessed
        path: PathBuf,
        /// The underlying I/O error
        error: io::Error,
    },

    /// Nuspec serialization errors
    #[error("XML error: {0}")]
    Xml(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Configuration errors, raised before any packaging work starts
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Required option was not provided
    #[error("Property \"{field}\" is required")]
    MissingField {
        /// Option name
        field: &'static str,
    },

    /// Option has the wrong type
    #[error("Property \"{field}\" must be {expected}")]
    InvalidType {
        /// Option name
        field: String,
        /// Human readable description of the accepted types
        expected: &'static str,
    },

    /// Option has the right type but an unusable value
    #[error("Property \"{field}\" is invalid: {reason}")]
    InvalidValue {
        /// Option name
        field: String,
        /// Reason for the error
        reason: String,
    },

    /// Options file could not be read or parsed
    #[error("Failed to load options from {path}: {reason}")]
    Load {
        /// Path of the options file
        path: PathBuf,
        /// Reason for the error
        reason: String,
    },
}

/// Manifest (package.json) discovery errors
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Manifest file could not be read
    #[error("Failed to read {path}: {source}")]
    Read {
        /// Manifest path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Manifest content is not valid JSON
    #[error("Failed to parse {path}: {source}")]
    Parse {
        /// Manifest path
        path: PathBuf,
        /// Parsing error
        #[source]
        source: serde_json::Error,
    },

    /// asar archive is malformed or lacks the requested entry
    #[error("Invalid asar archive {path}: {reason}")]
    Asar {
        /// Archive path
        path: PathBuf,
        /// Reason for the error
        reason: String,
    },
}

/// External tool errors
#[derive(Error, Debug)]
pub enum ToolError {
    /// Process could not be started
    #[error("failed to run command {command}: {error}")]
    Spawn {
        /// Command that failed to execute
        command: String,
        /// The underlying error
        error: io::Error,
    },

    /// Process exited unsuccessfully
    #[error("{tool} exited with {status}:\n{stderr}{stdout}")]
    Failed {
        /// Tool name
        tool: String,
        /// Exit status description
        status: String,
        /// Captured standard output
        stdout: String,
        /// Captured standard error
        stderr: String,
    },
}

impl PackagerError {
    /// Wrap a serialization failure from the XML writer
    pub fn xml(error: impl Display) -> Self {
        PackagerError::Xml(error.to_string())
    }

    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            PackagerError::Config(ConfigError::MissingField { field }) => vec![
                format!("Pass --{field} on the command line"),
                format!("Or set \"{field}\" in the options file given with --config"),
            ],
            PackagerError::Config(ConfigError::InvalidType { field, .. }) => vec![format!(
                "Check the type of \"{field}\" in the options file"
            )],
            PackagerError::Tool(ToolError::Spawn { command, .. }) => vec![
                format!("Verify that {command} exists and is executable"),
                "Point --tools-dir at the directory containing nuget.exe, SyncReleases.exe and Squirrel.exe"
                    .to_string(),
            ],
            PackagerError::Tool(ToolError::Failed { tool, .. }) if tool == "nuget.exe" => vec![
                "Ensure the nuspec has an id, version, authors and description".to_string(),
                "Add missing fields with --metadata key=value".to_string(),
            ],
            PackagerError::Fs { context, .. } if *context == "renaming installer" => vec![
                "Squirrel did not produce Setup.exe in the release directory".to_string(),
                "Check the releasify output above".to_string(),
            ],
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }
}

/// Extension trait for filesystem operations with automatic path context.
///
/// The `context` should be a present-tense verb phrase describing the operation,
/// e.g., "writing nuspec", "renaming installer".
pub trait ErrorExt<T> {
    /// Add filesystem context to an I/O error.
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, io::Error> {
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|error| PackagerError::Fs {
            context,
            path: path.into(),
            error,
        })
    }
}
