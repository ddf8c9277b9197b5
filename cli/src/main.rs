mod commands;
mod output;
mod solution;

use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "sdkify",
    version,
    about = "Converts legacy project files to their minimal SDK-style equivalent"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a project file, a solution, or every project in a directory
    Convert(commands::convert::ConvertArgs),
    /// Classify a project and show what conversion would do, without writing
    Inspect(commands::inspect::InspectArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Convert(args) => commands::convert::run(args),
        Commands::Inspect(args) => commands::inspect::run(args),
    };
    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            exit_code_for_error(&err)
        }
    }
}

/// 2 for failures the user can act on, 3 for internal errors.
fn exit_code_for_error(err: &anyhow::Error) -> ExitCode {
    if is_internal_error(err) {
        ExitCode::from(3)
    } else {
        ExitCode::from(2)
    }
}

fn is_internal_error(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        if cause.downcast_ref::<sdkify::EvalError>().is_some() {
            return true;
        }
        matches!(
            cause.downcast_ref::<sdkify::ConvertError>(),
            Some(sdkify::ConvertError::Eval(_))
        )
    })
}
