//! `pack` command: run the full installer pipeline.

use crate::cli::{PackagerArgs, RuntimeConfig};
use crate::error::Result;
use crate::packager::SquirrelPackager;

pub(super) async fn execute_pack(options: &PackagerArgs, runtime: &RuntimeConfig) -> Result<()> {
    let config = options.to_config().await?;
    let output = runtime.output();

    let _ = output.section("Squirrel installer");
    let _ = output.progress(&format!(
        "Packaging {} into {}",
        config.src.display(),
        config.dest.display()
    ));
    if config.signing.is_none() {
        let _ = output.warn("No signing configured; the installer will be unsigned");
    }

    let packager = SquirrelPackager::new(config);
    let installer = packager.create_installer().await?;

    let _ = output.success(&format!(
        "Created {} {}",
        installer.id,
        installer.version.as_deref().unwrap_or("(no version)")
    ));
    let _ = output.indent(&format!("Installer: {}", installer.setup_path.display()));
    let _ = output.indent(&format!("Releases:  {}", installer.release_dir.display()));

    Ok(())
}
