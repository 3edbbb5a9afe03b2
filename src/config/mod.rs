//! Packager configuration.
//!
//! Options are gathered into a [`PackagerConfigBuilder`] (from an options file,
//! command line flags, or library calls) and validated once by
//! [`PackagerConfigBuilder::build`], before any packaging work starts.
//!
//! # Example
//!
//! ```no_run
//! use kodegen_bundler_squirrel::config::PackagerConfig;
//!
//! let config = PackagerConfig::builder()
//!     .src("out/MyApp-win32-x64")
//!     .dest("out/installer")
//!     .exe("MyApp.exe")
//!     .setup_exe("MyApp-Setup.exe")
//!     .build()?;
//! # Ok::<(), kodegen_bundler_squirrel::error::ConfigError>(())
//! ```

pub mod file;

use crate::error::ConfigError;
use crate::manifest::ManifestSource;
use crate::nuspec::{MetadataOverrides, MetadataValue};
use std::path::PathBuf;

/// Code signing parameters handed to `Squirrel.exe --signWithParams`
#[derive(Clone, PartialEq, Eq)]
pub enum Signing {
    /// Pre-built signtool parameter string
    Params(String),
    /// Certificate file and its password
    Certificate {
        /// Path to the .pfx certificate
        file: PathBuf,
        /// Certificate password
        password: String,
    },
}

impl Signing {
    /// The `--signWithParams` argument value
    pub fn params(&self) -> String {
        match self {
            Signing::Params(params) => params.clone(),
            Signing::Certificate { file, password } => {
                format!("/a /f {} /p {}", file.display(), password)
            }
        }
    }

    /// Secret part of the parameters, if any, for log redaction
    pub fn secret(&self) -> Option<&str> {
        match self {
            Signing::Params(_) => None,
            Signing::Certificate { password, .. } => Some(password),
        }
    }
}

impl std::fmt::Debug for Signing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Signing::Params(_) => f.debug_tuple("Params").field(&"<redacted>").finish(),
            Signing::Certificate { file, .. } => f
                .debug_struct("Certificate")
                .field("file", file)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

/// Validated packager configuration
#[derive(Debug, Clone)]
pub struct PackagerConfig {
    /// Pre-built application directory
    pub src: PathBuf,
    /// Release directory receiving the installer
    pub dest: PathBuf,
    /// Main application executable name
    pub exe: String,
    /// Manifest discovery mode
    pub manifest: ManifestSource,
    /// Metadata overrides applied after manifest mapping
    pub metadata: MetadataOverrides,
    /// Animation shown while the installer runs
    pub loading_gif: Option<PathBuf>,
    /// File name to give the generated `Setup.exe`
    pub setup_exe: Option<String>,
    /// Icon for the generated `Setup.exe`
    pub setup_icon: Option<PathBuf>,
    /// Remote release feed to sync before releasifying
    pub remote_releases: Option<String>,
    /// Code signing parameters
    pub signing: Option<Signing>,
    /// Directory containing `nuget.exe`, `SyncReleases.exe` and `Squirrel.exe`
    pub tools_dir: Option<PathBuf>,
}

impl PackagerConfig {
    /// Start building a configuration
    pub fn builder() -> PackagerConfigBuilder {
        PackagerConfigBuilder::new()
    }
}

/// Builder collecting unvalidated options.
///
/// Later setters overwrite earlier ones, so an options file can be loaded
/// first and command line flags applied on top. Empty strings count as unset.
#[derive(Debug, Clone, Default)]
pub struct PackagerConfigBuilder {
    src: Option<PathBuf>,
    dest: Option<PathBuf>,
    exe: Option<String>,
    manifest: Option<ManifestSource>,
    metadata: MetadataOverrides,
    loading_gif: Option<PathBuf>,
    setup_exe: Option<String>,
    setup_icon: Option<PathBuf>,
    remote_releases: Option<String>,
    certificate_file: Option<PathBuf>,
    certificate_password: Option<String>,
    sign_with_params: Option<String>,
    tools_dir: Option<PathBuf>,
}

fn non_empty_path(path: impl Into<PathBuf>) -> Option<PathBuf> {
    let path = path.into();
    (!path.as_os_str().is_empty()).then_some(path)
}

fn non_empty(value: impl Into<String>) -> Option<String> {
    let value = value.into();
    (!value.is_empty()).then_some(value)
}

impl PackagerConfigBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Application directory
    pub fn src(mut self, path: impl Into<PathBuf>) -> Self {
        self.src = non_empty_path(path);
        self
    }

    /// Release directory
    pub fn dest(mut self, path: impl Into<PathBuf>) -> Self {
        self.dest = non_empty_path(path);
        self
    }

    /// Main executable name
    pub fn exe(mut self, exe: impl Into<String>) -> Self {
        self.exe = non_empty(exe);
        self
    }

    /// Manifest discovery mode
    pub fn manifest(mut self, source: ManifestSource) -> Self {
        self.manifest = Some(source);
        self
    }

    /// Apply metadata overrides on top of those already collected
    pub fn metadata(mut self, overrides: &MetadataOverrides) -> Self {
        self.metadata.merge(overrides);
        self
    }

    /// Override one metadata field by its element name
    pub fn metadata_field(
        mut self,
        field: &str,
        value: impl Into<MetadataValue>,
    ) -> Result<Self, ConfigError> {
        if !self.metadata.set(field, value.into()) {
            return Err(ConfigError::InvalidValue {
                field: "metadata".to_string(),
                reason: format!("unknown nuspec metadata field \"{field}\""),
            });
        }
        Ok(self)
    }

    /// Installer loading animation
    pub fn loading_gif(mut self, path: impl Into<PathBuf>) -> Self {
        self.loading_gif = non_empty_path(path);
        self
    }

    /// Final installer file name
    pub fn setup_exe(mut self, name: impl Into<String>) -> Self {
        self.setup_exe = non_empty(name);
        self
    }

    /// Installer icon
    pub fn setup_icon(mut self, path: impl Into<PathBuf>) -> Self {
        self.setup_icon = non_empty_path(path);
        self
    }

    /// Remote releases URL or path
    pub fn remote_releases(mut self, target: impl Into<String>) -> Self {
        self.remote_releases = non_empty(target);
        self
    }

    /// Signing certificate file
    pub fn certificate_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.certificate_file = non_empty_path(path);
        self
    }

    /// Signing certificate password
    pub fn certificate_password(mut self, password: impl Into<String>) -> Self {
        self.certificate_password = non_empty(password);
        self
    }

    /// Pre-built signing parameters; take precedence over a certificate
    pub fn sign_with_params(mut self, params: impl Into<String>) -> Self {
        self.sign_with_params = non_empty(params);
        self
    }

    /// Directory containing the Squirrel tool executables
    pub fn tools_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.tools_dir = non_empty_path(path);
        self
    }

    /// Validate and produce the final configuration
    pub fn build(self) -> Result<PackagerConfig, ConfigError> {
        let src = self.src.ok_or(ConfigError::MissingField { field: "src" })?;
        let dest = self.dest.ok_or(ConfigError::MissingField { field: "dest" })?;
        let exe = self.exe.ok_or(ConfigError::MissingField { field: "exe" })?;

        if let Some(name) = &self.setup_exe
            && name.contains(['/', '\\'])
        {
            return Err(ConfigError::InvalidValue {
                field: "setupExe".to_string(),
                reason: format!("\"{name}\" must be a file name, not a path"),
            });
        }

        let signing = match (
            self.sign_with_params,
            self.certificate_file,
            self.certificate_password,
        ) {
            (Some(params), _, _) => Some(Signing::Params(params)),
            (None, Some(file), Some(password)) => Some(Signing::Certificate { file, password }),
            (None, Some(file), None) => {
                log::warn!(
                    "certificateFile {} given without certificatePassword; installer will not be signed",
                    file.display()
                );
                None
            }
            (None, None, _) => None,
        };

        Ok(PackagerConfig {
            src,
            dest,
            exe,
            manifest: self.manifest.unwrap_or_default(),
            metadata: self.metadata,
            loading_gif: self.loading_gif,
            setup_exe: self.setup_exe,
            setup_icon: self.setup_icon,
            remote_releases: self.remote_releases,
            signing,
            tools_dir: self.tools_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> PackagerConfigBuilder {
        PackagerConfig::builder()
            .src("app")
            .dest("out")
            .exe("App.exe")
    }

    #[test]
    fn test_required_fields() {
        let err = PackagerConfig::builder().dest("out").exe("App.exe").build().unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { field: "src" }));

        let err = PackagerConfig::builder().src("app").exe("App.exe").build().unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { field: "dest" }));

        let err = PackagerConfig::builder().src("app").dest("out").exe("").build().unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { field: "exe" }));
    }

    #[test]
    fn test_defaults() {
        let config = minimal().build().unwrap();
        assert_eq!(config.manifest, ManifestSource::Auto);
        assert!(config.metadata.is_empty());
        assert!(config.signing.is_none());
        assert!(config.setup_exe.is_none());
    }

    #[test]
    fn test_sign_with_params_takes_precedence() {
        let config = minimal()
            .sign_with_params("/n \"Cert Name\"")
            .certificate_file("cert.pfx")
            .certificate_password("secret")
            .build()
            .unwrap();
        assert_eq!(config.signing, Some(Signing::Params("/n \"Cert Name\"".into())));
    }

    #[test]
    fn test_certificate_pair_synthesizes_params() {
        let config = minimal()
            .certificate_file("cert.pfx")
            .certificate_password("secret")
            .build()
            .unwrap();
        let signing = config.signing.unwrap();
        assert_eq!(signing.params(), "/a /f cert.pfx /p secret");
        assert_eq!(signing.secret(), Some("secret"));
        assert!(!format!("{signing:?}").contains("secret"));
    }

    #[test]
    fn test_certificate_without_password_is_ignored() {
        let config = minimal().certificate_file("cert.pfx").build().unwrap();
        assert!(config.signing.is_none());
    }

    #[test]
    fn test_setup_exe_must_be_file_name() {
        let err = minimal().setup_exe("..\\Setup.exe").build().unwrap_err();
        assert!(err.to_string().contains("setupExe"));
    }

    #[test]
    fn test_metadata_field_validation() {
        let config = minimal()
            .metadata_field("title", "My App")
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(
            config.metadata.entries(),
            &[("title", Some(MetadataValue::from("My App")))]
        );

        assert!(minimal().metadata_field("colour", "red").is_err());
    }

    #[test]
    fn test_later_setters_win() {
        let config = minimal().dest("first").dest("second").build().unwrap();
        assert_eq!(config.dest, PathBuf::from("second"));
    }
}
