//! Command lines for the three pipeline tools.

use super::{ToolInvocation, ToolKind, ToolPaths};
use crate::config::PackagerConfig;
use std::path::Path;

/// `nuget.exe pack <nuspec> -BasePath <src> -OutputDirectory <out> -NoDefaultExcludes`
pub fn nuget_pack(
    tools: &ToolPaths,
    nuspec: &Path,
    base_path: &Path,
    output_dir: &Path,
) -> ToolInvocation {
    ToolInvocation::new(ToolKind::NuGet, tools.path(ToolKind::NuGet))
        .arg("pack")
        .arg(nuspec.display().to_string())
        .flag("-BasePath", base_path.display().to_string())
        .flag("-OutputDirectory", output_dir.display().to_string())
        .arg("-NoDefaultExcludes")
}

/// `SyncReleases.exe -u <remote> -r <dest>`, only when a remote feed is configured
pub fn sync_releases(tools: &ToolPaths, config: &PackagerConfig) -> Option<ToolInvocation> {
    let remote = config.remote_releases.as_deref()?;
    Some(
        ToolInvocation::new(ToolKind::SyncReleases, tools.path(ToolKind::SyncReleases))
            .flag("-u", remote)
            .flag("-r", config.dest.display().to_string()),
    )
}

/// `Squirrel.exe --releasify <nupkg> --releaseDir <dest>` plus optional branding and signing
pub fn releasify(tools: &ToolPaths, config: &PackagerConfig, nupkg: &Path) -> ToolInvocation {
    let mut invocation = ToolInvocation::new(ToolKind::Squirrel, tools.path(ToolKind::Squirrel))
        .flag("--releasify", nupkg.display().to_string())
        .flag("--releaseDir", config.dest.display().to_string());

    if let Some(gif) = &config.loading_gif {
        invocation = invocation.flag("--loadingGif", gif.display().to_string());
    }

    if let Some(signing) = &config.signing {
        invocation = invocation.flag("--signWithParams", signing.params());
        if let Some(secret) = signing.secret() {
            invocation = invocation.redact(secret);
        }
    }

    if let Some(icon) = &config.setup_icon {
        invocation = invocation.flag("--setupIcon", icon.display().to_string());
    }

    invocation
}
