use anyhow::Context;
use clap::Parser;
use std::process::ExitCode;
use tracegraph::cli::{Cli, Command};
use tracegraph::error::exit_code;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::from(exit_code::SUCCESS as u8),
        Err(e) => {
            eprintln!("Error: {e:#}");
            if let Some(err) = e.downcast_ref::<tracegraph::Error>() {
                ExitCode::from(err.exit_code() as u8)
            } else {
                ExitCode::from(exit_code::GENERAL_ERROR as u8)
            }
        }
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracegraph::logging::init(cli.verbose);

    // Validate CLI arguments
    cli.validate()
        .map_err(tracegraph::Error::InvalidArgument)
        .context("Invalid arguments")?;

    match cli.command {
        Command::Info { file, regions } => {
            tracegraph::commands::info::run(&file, regions)
                .with_context(|| format!("Failed to read {}", file.display()))?;
        }
        Command::At { file, x, y, view } => {
            tracegraph::commands::at::run(&file, x, y, &view)?;
        }
        Command::Range {
            file,
            x0,
            y0,
            x1,
            y1,
            view,
        } => {
            tracegraph::commands::range::run(&file, (x0, y0), (x1, y1), &view)?;
        }
        Command::Import { input, output } => {
            tracegraph::commands::import::run(&input, &output)
                .with_context(|| format!("Failed to import {}", input.display()))?;
        }
        Command::View { file } => {
            tracegraph::commands::view::run(&file)?;
        }
        Command::Completions { shell } => {
            use clap::CommandFactory;
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "tracegraph", &mut std::io::stdout());
        }
    }

    Ok(())
}
