//! Command line argument parsing.
//!
//! Every packaging option can come from an options file (`--config`) or a
//! flag; flags win.

use crate::config::{PackagerConfig, PackagerConfigBuilder, file};
use crate::error::{ConfigError, Result};
use crate::manifest::ManifestSource;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Squirrel.Windows installer packaging
#[derive(Parser, Debug)]
#[command(
    name = "kodegen_bundler_squirrel",
    version,
    about = "Package a pre-built desktop application into a Squirrel.Windows installer",
    long_about = "Package a pre-built desktop application into a Squirrel.Windows installer.

Usage:
  kodegen_bundler_squirrel pack --src out/MyApp-win32-x64 --dest out/installer --exe MyApp.exe
  kodegen_bundler_squirrel pack --config squirrel.toml --setup-exe MyApp-Setup.exe
  kodegen_bundler_squirrel nuspec --config squirrel.toml"
)]
pub struct Args {
    /// Command to run
    #[command(subcommand)]
    pub command: Command,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the installer: nuspec, nuget pack, sync releases, releasify
    Pack {
        /// Packaging options
        #[command(flatten)]
        options: PackagerArgs,
    },

    /// Print the generated nuspec without running any tool
    Nuspec {
        /// Packaging options
        #[command(flatten)]
        options: PackagerArgs,

        /// Write the nuspec to this file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

impl Command {
    /// Command name for messages
    pub fn name(&self) -> &'static str {
        match self {
            Command::Pack { .. } => "pack",
            Command::Nuspec { .. } => "nuspec",
        }
    }

    /// Packaging options shared by every command
    pub fn options(&self) -> &PackagerArgs {
        match self {
            Command::Pack { options } | Command::Nuspec { options, .. } => options,
        }
    }
}

/// Packaging options
#[derive(clap::Args, Debug, Clone, Default)]
pub struct PackagerArgs {
    /// Options file (.json or .toml)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Pre-built application directory
    #[arg(long, value_name = "DIR")]
    pub src: Option<PathBuf>,

    /// Release directory for the installer and packages
    #[arg(long, value_name = "DIR")]
    pub dest: Option<PathBuf>,

    /// Main application executable name
    #[arg(long, value_name = "NAME")]
    pub exe: Option<String>,

    /// Read package.json from this file instead of probing the app directory
    #[arg(long, value_name = "FILE", conflicts_with = "no_manifest")]
    pub manifest: Option<PathBuf>,

    /// Do not read any package.json
    #[arg(long)]
    pub no_manifest: bool,

    /// Override a nuspec metadata field, e.g. --metadata authors="My Company"
    #[arg(long = "metadata", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub metadata: Vec<(String, String)>,

    /// Animation shown while the installer runs
    #[arg(long, value_name = "FILE")]
    pub loading_gif: Option<PathBuf>,

    /// File name for the generated installer (default Setup.exe)
    #[arg(long, value_name = "NAME")]
    pub setup_exe: Option<String>,

    /// Icon for the generated installer
    #[arg(long, value_name = "FILE")]
    pub setup_icon: Option<PathBuf>,

    /// Remote releases URL or directory to sync before releasifying
    #[arg(long, value_name = "URL")]
    pub remote_releases: Option<String>,

    /// Code signing certificate (.pfx)
    #[arg(long, value_name = "FILE")]
    pub certificate_file: Option<PathBuf>,

    /// Code signing certificate password
    #[arg(
        long,
        value_name = "PASSWORD",
        env = "SQUIRREL_CERTIFICATE_PASSWORD",
        hide_env_values = true
    )]
    pub certificate_password: Option<String>,

    /// Complete signtool parameters; wins over --certificate-file
    #[arg(
        long,
        value_name = "PARAMS",
        env = "SQUIRREL_SIGN_WITH_PARAMS",
        hide_env_values = true
    )]
    pub sign_with_params: Option<String>,

    /// Directory containing nuget.exe, SyncReleases.exe and Squirrel.exe
    #[arg(long, value_name = "DIR", env = "SQUIRREL_TOOLS_DIR")]
    pub tools_dir: Option<PathBuf>,
}

fn parse_key_value(raw: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got \"{raw}\""))?;
    if key.is_empty() {
        return Err(format!("missing key in \"{raw}\""));
    }
    Ok((key.to_string(), value.to_string()))
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl PackagerArgs {
    /// Merge the options file (if any) and flags into a validated configuration
    pub async fn to_config(&self) -> Result<PackagerConfig> {
        let builder = match &self.config {
            Some(path) => file::load_options(path).await?,
            None => PackagerConfigBuilder::new(),
        };
        Ok(self.apply(builder)?.build()?)
    }

    fn apply(
        &self,
        mut builder: PackagerConfigBuilder,
    ) -> std::result::Result<PackagerConfigBuilder, ConfigError> {
        if let Some(src) = &self.src {
            builder = builder.src(src);
        }
        if let Some(dest) = &self.dest {
            builder = builder.dest(dest);
        }
        if let Some(exe) = &self.exe {
            builder = builder.exe(exe);
        }
        if let Some(path) = &self.manifest {
            builder = builder.manifest(ManifestSource::Path(path.clone()));
        }
        if self.no_manifest {
            builder = builder.manifest(ManifestSource::Disabled);
        }
        for (key, value) in &self.metadata {
            builder = builder.metadata_field(key, value.as_str())?;
        }
        if let Some(gif) = &self.loading_gif {
            builder = builder.loading_gif(gif);
        }
        if let Some(name) = &self.setup_exe {
            builder = builder.setup_exe(name);
        }
        if let Some(icon) = &self.setup_icon {
            builder = builder.setup_icon(icon);
        }
        if let Some(remote) = &self.remote_releases {
            builder = builder.remote_releases(remote);
        }
        if let Some(cert) = &self.certificate_file {
            builder = builder.certificate_file(cert);
        }
        if let Some(password) = &self.certificate_password {
            builder = builder.certificate_password(password);
        }
        if let Some(params) = &self.sign_with_params {
            builder = builder.sign_with_params(params);
        }
        if let Some(dir) = &self.tools_dir {
            builder = builder.tools_dir(dir);
        }
        Ok(builder)
    }
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    output: super::OutputManager,
}

impl RuntimeConfig {
    /// Create runtime configuration
    pub fn new(quiet: bool) -> Self {
        Self {
            output: super::OutputManager::new(quiet),
        }
    }

    /// Get a reference to the output manager
    pub fn output(&self) -> &super::OutputManager {
        &self.output
    }
}

impl From<&Args> for RuntimeConfig {
    fn from(args: &Args) -> Self {
        Self::new(args.quiet)
    }
}
