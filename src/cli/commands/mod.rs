//! Command execution.
//!
//! Each command returns `Result<()>`; failures are reported here with
//! recovery suggestions and turned into exit code 1.

mod nuspec;
mod pack;

use crate::cli::{Args, Command, RuntimeConfig};
use crate::error::Result;

use nuspec::execute_nuspec;
use pack::execute_pack;

/// Execute the command selected by `args` and return the process exit code
pub async fn execute_command(args: Args) -> Result<i32> {
    let config = RuntimeConfig::from(&args);

    let result = match &args.command {
        Command::Pack { options } => execute_pack(options, &config).await,
        Command::Nuspec { options, output } => {
            execute_nuspec(options, output.as_deref(), &config).await
        }
    };

    match result {
        Ok(()) => Ok(0),
        Err(e) => {
            let output = config.output();
            output.error(&format!("Command '{}' failed: {}", args.command.name(), e));

            let suggestions = e.recovery_suggestions();
            if !suggestions.is_empty() && !output.is_quiet() {
                let _ = output.println("\n💡 Recovery suggestions:");
                for suggestion in suggestions {
                    let _ = output.indent(&format!("• {suggestion}"));
                }
            }

            Ok(1)
        }
    }
}
