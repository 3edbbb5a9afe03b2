//! `nuspec` command: show the package description without packaging.

use crate::cli::{PackagerArgs, RuntimeConfig};
use crate::error::{ErrorExt, Result};
use crate::packager::build_nuspec;
use std::path::Path;

pub(super) async fn execute_nuspec(
    options: &PackagerArgs,
    output_file: Option<&Path>,
    runtime: &RuntimeConfig,
) -> Result<()> {
    let config = options.to_config().await?;
    let nuspec = build_nuspec(&config).await?;
    let xml = nuspec.to_xml()?;

    match output_file {
        Some(path) => {
            tokio::fs::write(path, &xml)
                .await
                .fs_context("writing nuspec", path)?;
            let _ = runtime
                .output()
                .success(&format!("Wrote {}", path.display()));
        }
        None => println!("{xml}"),
    }

    Ok(())
}
