//! # Kodegen Squirrel Bundler
//!
//! Packages a pre-built desktop application directory into a Squirrel.Windows
//! installer.
//!
//! The crate derives NuGet metadata from the application's `package.json`,
//! writes the `.nuspec`, and drives the external Squirrel toolchain:
//!
//! - **Nuspec generation**: manifest mapping plus explicit metadata overrides
//! - **Manifest discovery**: `resources/app.asar` first, then `resources/app/`
//! - **Pipeline**: `nuget.exe pack`, `SyncReleases.exe`, `Squirrel.exe --releasify`
//! - **Output placement**: optional rename of the generated `Setup.exe`
//!
//! ## Usage
//!
//! ```bash
//! kodegen_bundler_squirrel pack --src out/MyApp-win32-x64 --dest out/installer --exe MyApp.exe
//! kodegen_bundler_squirrel nuspec --config squirrel.toml
//! ```
//!
//! ## Library
//!
//! ```no_run
//! use kodegen_bundler_squirrel::{PackagerConfig, SquirrelPackager};
//!
//! # async fn example() -> kodegen_bundler_squirrel::Result<()> {
//! let config = PackagerConfig::builder()
//!     .src("out/MyApp-win32-x64")
//!     .dest("out/installer")
//!     .exe("MyApp.exe")
//!     .build()?;
//!
//! let installer = SquirrelPackager::new(config).create_installer().await?;
//! println!("{}", installer.setup_path.display());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod cli;
pub mod config;
pub mod error;
pub mod manifest;
pub mod nuspec;
pub mod packager;
pub mod tools;

pub use config::{PackagerConfig, PackagerConfigBuilder, Signing};
pub use error::{ConfigError, ManifestError, PackagerError, Result, ToolError};
pub use manifest::{AppManifest, ManifestSource, ManifestValue};
pub use nuspec::{FileRule, MetadataOverrides, MetadataValue, Nuspec, NuspecMetadata};
pub use packager::{InstallerOutput, SquirrelPackager, build_nuspec};
pub use tools::{ProcessRunner, ToolInvocation, ToolKind, ToolOutput, ToolPaths, ToolRunner};
