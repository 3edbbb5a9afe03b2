//! Squirrel installer pipeline.
//!
//! [`SquirrelPackager::create_installer`] runs, strictly in order:
//!
//! 1. discover the application manifest
//! 2. build the nuspec (manifest mapping, then configured overrides)
//! 3. write the nuspec into a fresh temporary directory
//! 4. `nuget.exe pack`
//! 5. `SyncReleases.exe` (only with a remote releases feed)
//! 6. `Squirrel.exe --releasify`
//! 7. rename `Setup.exe` (only with a custom installer name)
//!
//! The first failure aborts every later step. The temporary directory is
//! removed when `create_installer` returns, whatever the outcome.

use crate::config::PackagerConfig;
use crate::error::{ErrorExt, Result};
use crate::manifest;
use crate::nuspec::{Nuspec, NuspecMetadata, default_files};
use crate::tools::{ProcessRunner, ToolPaths, ToolRunner, commands};
use path_absolutize::Absolutize;
use std::path::{Path, PathBuf};

/// Name Squirrel gives the installer it generates
pub const DEFAULT_SETUP_EXE: &str = "Setup.exe";

/// Prefix of the per-run temporary directory
const TEMP_PREFIX: &str = "squirrel-installer-";

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallerOutput {
    /// Package id written to the nuspec
    pub id: String,
    /// Package version written to the nuspec
    pub version: Option<String>,
    /// Release directory holding `RELEASES` and the packages
    pub release_dir: PathBuf,
    /// Final installer path
    pub setup_path: PathBuf,
}

/// Build the nuspec document described by `config`.
///
/// Reads the manifest but never locates or runs a tool.
pub async fn build_nuspec(config: &PackagerConfig) -> Result<Nuspec> {
    let mut nuspec = Nuspec::new();

    let manifest = manifest::discover(&config.src, &config.manifest).await?;
    match &manifest {
        Some(manifest) => nuspec.set_metadata(NuspecMetadata::from_manifest(manifest)),
        None => log::info!(
            "No package.json found for {}, using configured metadata only",
            config.src.display()
        ),
    }

    nuspec.metadata_mut().apply_overrides(&config.metadata);
    nuspec.set_files(default_files());

    if nuspec.metadata().id.is_none() {
        log::warn!("Nuspec has no id; nuget.exe pack will reject it");
    }

    Ok(nuspec)
}

/// Drives the describe → pack → sync → releasify → rename pipeline
#[derive(Debug)]
pub struct SquirrelPackager<R = ProcessRunner> {
    config: PackagerConfig,
    tools: ToolPaths,
    runner: R,
}

impl SquirrelPackager<ProcessRunner> {
    /// Packager spawning the real tools, located per [`ToolPaths::resolve`]
    pub fn new(config: PackagerConfig) -> Self {
        let tools = ToolPaths::resolve(config.tools_dir.as_deref());
        Self::with_runner(config, tools, ProcessRunner)
    }
}

impl<R: ToolRunner> SquirrelPackager<R> {
    /// Packager with explicit tool paths and runner
    pub fn with_runner(config: PackagerConfig, tools: ToolPaths, runner: R) -> Self {
        Self {
            config,
            tools,
            runner,
        }
    }

    /// Validated configuration
    pub fn config(&self) -> &PackagerConfig {
        &self.config
    }

    /// Runner the tools are handed to
    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Build the nuspec document for this application
    pub async fn create_nuspec(&self) -> Result<Nuspec> {
        build_nuspec(&self.config).await
    }

    /// Run the whole pipeline
    pub async fn create_installer(&self) -> Result<InstallerOutput> {
        let temp_dir = tempfile::Builder::new().prefix(TEMP_PREFIX).tempdir()?;
        let work_dir = temp_dir.path();

        let nuspec = self.create_nuspec().await?;
        let nuspec_path = nuspec.write_to(work_dir).await?;
        log::info!("Created {}", nuspec_path.display());

        self.pack(&nuspec_path, work_dir).await?;
        self.sync_releases().await?;

        let nupkg = work_dir.join(nuspec.package_file_name());
        self.releasify(&nupkg).await?;

        let setup_path = self.rename_setup().await?;
        log::info!("Installer ready at {}", setup_path.display());

        Ok(InstallerOutput {
            id: nuspec.package_id().to_string(),
            version: nuspec.metadata().version.clone(),
            release_dir: self.config.dest.clone(),
            setup_path,
        })
    }

    async fn pack(&self, nuspec_path: &Path, work_dir: &Path) -> Result<()> {
        let base_path = self
            .config
            .src
            .absolutize()
            .fs_context("resolving source directory", &self.config.src)?;
        let invocation = commands::nuget_pack(&self.tools, nuspec_path, &base_path, work_dir);

        log::info!("Packing {}", nuspec_path.display());
        self.runner.run(&invocation).await?;
        Ok(())
    }

    async fn sync_releases(&self) -> Result<()> {
        let Some(invocation) = commands::sync_releases(&self.tools, &self.config) else {
            log::debug!("No remote releases configured, skipping sync");
            return Ok(());
        };

        log::info!("Syncing releases into {}", self.config.dest.display());
        self.runner.run(&invocation).await?;
        Ok(())
    }

    async fn releasify(&self, nupkg: &Path) -> Result<()> {
        let invocation = commands::releasify(&self.tools, &self.config, nupkg);

        log::info!("Releasifying {}", nupkg.display());
        self.runner.run(&invocation).await?;
        Ok(())
    }

    async fn rename_setup(&self) -> Result<PathBuf> {
        let default_path = self.config.dest.join(DEFAULT_SETUP_EXE);
        let Some(name) = &self.config.setup_exe else {
            return Ok(default_path);
        };

        let target = self.config.dest.join(name);
        tokio::fs::rename(&default_path, &target)
            .await
            .fs_context("renaming installer", &default_path)?;
        log::debug!("Renamed {} to {}", default_path.display(), target.display());
        Ok(target)
    }
}
