//! External Squirrel tool execution.
//!
//! The packager never packs or releasifies anything itself. It builds
//! [`ToolInvocation`]s and hands them to a [`ToolRunner`]. [`ProcessRunner`]
//! spawns the real executables; tests substitute a recording runner.
//!
//! # Tools
//!
//! | Tool | Purpose |
//! |------|---------|
//! | `nuget.exe` | Builds the `.nupkg` from the nuspec |
//! | `SyncReleases.exe` | Mirrors remote `RELEASES` into the release directory |
//! | `Squirrel.exe` | Releasifies the `.nupkg` into `Setup.exe` and delta packages |

pub mod commands;

use crate::error::ToolError;
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};

/// The external executables the pipeline drives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    /// NuGet packer
    NuGet,
    /// Release feed synchroniser
    SyncReleases,
    /// Squirrel releasifier
    Squirrel,
}

impl ToolKind {
    /// Executable file name
    pub fn executable(self) -> &'static str {
        match self {
            ToolKind::NuGet => "nuget.exe",
            ToolKind::SyncReleases => "SyncReleases.exe",
            ToolKind::Squirrel => "Squirrel.exe",
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.executable())
    }
}

/// Resolved executable locations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    /// `nuget.exe`
    pub nuget: PathBuf,
    /// `SyncReleases.exe`
    pub sync_releases: PathBuf,
    /// `Squirrel.exe`
    pub squirrel: PathBuf,
}

impl ToolPaths {
    /// All tools inside one directory
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            nuget: dir.join(ToolKind::NuGet.executable()),
            sync_releases: dir.join(ToolKind::SyncReleases.executable()),
            squirrel: dir.join(ToolKind::Squirrel.executable()),
        }
    }

    /// Locate the tools.
    ///
    /// An explicit directory wins. Otherwise each tool is looked up on `PATH`,
    /// then in `bin/` next to the running executable, and finally left as a
    /// bare name so the spawn error names the missing tool.
    pub fn resolve(tools_dir: Option<&Path>) -> Self {
        if let Some(dir) = tools_dir {
            return Self::in_dir(dir);
        }
        Self {
            nuget: locate(ToolKind::NuGet),
            sync_releases: locate(ToolKind::SyncReleases),
            squirrel: locate(ToolKind::Squirrel),
        }
    }

    /// Path of one tool
    pub fn path(&self, kind: ToolKind) -> &Path {
        match kind {
            ToolKind::NuGet => &self.nuget,
            ToolKind::SyncReleases => &self.sync_releases,
            ToolKind::Squirrel => &self.squirrel,
        }
    }
}

fn locate(kind: ToolKind) -> PathBuf {
    let name = kind.executable();
    if let Ok(path) = which::which(name) {
        log::debug!("Found {} at {}", name, path.display());
        return path;
    }

    let bundled = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("bin").join(name)));
    if let Some(path) = bundled
        && path.is_file()
    {
        log::debug!("Using bundled {}", path.display());
        return path;
    }

    log::debug!("{name} not found on PATH or next to this executable");
    PathBuf::from(name)
}

/// One external command to run
#[derive(Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    /// Which tool this is
    pub tool: ToolKind,
    /// Executable path
    pub program: PathBuf,
    /// Arguments in order
    pub args: Vec<String>,
    /// Argument substrings hidden when the invocation is displayed
    secrets: Vec<String>,
}

impl ToolInvocation {
    /// New invocation without arguments
    pub fn new(tool: ToolKind, program: impl Into<PathBuf>) -> Self {
        Self {
            tool,
            program: program.into(),
            args: Vec::new(),
            secrets: Vec::new(),
        }
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append a flag followed by its value
    pub fn flag(self, flag: &str, value: impl Into<String>) -> Self {
        self.arg(flag).arg(value)
    }

    /// Hide `secret` wherever it appears when displayed
    pub fn redact(mut self, secret: impl Into<String>) -> Self {
        let secret = secret.into();
        if !secret.is_empty() {
            self.secrets.push(secret);
        }
        self
    }

    /// Value following `flag`, if present
    pub fn value_of(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }
}

impl fmt::Display for ToolInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            let shown = self
                .secrets
                .iter()
                .fold(arg.clone(), |shown, secret| shown.replace(secret.as_str(), "****"));
            write!(f, " {shown}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ToolInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ToolInvocation({self})")
    }
}

/// Captured output of a successful tool run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
}

/// Runs external tools to completion.
///
/// Implementations must return an error for both spawn failures and
/// unsuccessful exit statuses.
pub trait ToolRunner {
    /// Run `invocation` and wait for it to exit
    fn run(
        &self,
        invocation: &ToolInvocation,
    ) -> impl Future<Output = Result<ToolOutput, ToolError>> + Send;
}

/// Spawns tools as child processes
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ToolRunner for ProcessRunner {
    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, ToolError> {
        log::debug!("Running {invocation}");

        let output = tokio::process::Command::new(&invocation.program)
            .args(&invocation.args)
            .output()
            .await
            .map_err(|error| ToolError::Spawn {
                command: invocation.program.display().to_string(),
                error,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            return Err(ToolError::Failed {
                tool: invocation.tool.to_string(),
                status: output.status.to_string(),
                stdout,
                stderr,
            });
        }

        if !stdout.trim().is_empty() {
            log::debug!("{} output:\n{}", invocation.tool, stdout.trim_end());
        }
        Ok(ToolOutput { stdout, stderr })
    }
}
