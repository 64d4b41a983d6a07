//! Command-line entry point.

use clap::{Parser, Subcommand};
use drawbot_app::{AppError, Shell};
use drawbot_core::DrawbotConfig;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "drawbot", about = "Normalize, render and store drawbot drawings")]
struct Cli {
    /// JSON configuration file.
    #[arg(long, env = "DRAWBOT_CONFIG")]
    config: Option<PathBuf>,

    /// Directory for saved drawings.
    #[arg(long, env = "DRAWBOT_STORAGE_DIR")]
    storage_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the canonical form of a drawing document.
    Normalize { file: PathBuf },
    /// Paint a drawing document to PNG.
    Render {
        file: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Run a script of session actions and paint the result.
    Replay {
        script: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Save a drawing document, printing its ID.
    Save {
        file: PathBuf,
        #[arg(long, default_value = "Untitled")]
        title: String,
    },
    /// Paint a saved drawing to PNG.
    Load {
        id: String,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// List saved drawings.
    List,
}

fn run(cli: Cli) -> Result<(), AppError> {
    let config = match &cli.config {
        Some(path) => DrawbotConfig::load(path)?,
        None => DrawbotConfig::default(),
    };
    let mut shell = Shell::new(config);
    if let Some(dir) = cli.storage_dir {
        shell = shell.with_storage_dir(dir);
    }

    match cli.command {
        Command::Normalize { file } => println!("{}", shell.normalize_file(&file)?),
        Command::Render { file, output } => shell.render_file(&file, &output)?,
        Command::Replay { script, output } => {
            let report = shell.replay_file(&script, &output)?;
            if report.rejected > 0 {
                log::warn!("{} interpretation(s) rejected", report.rejected);
            }
            println!(
                "applied {}, rejected {}, no-op steps {}",
                report.applied, report.rejected, report.noops
            );
        }
        Command::Save { file, title } => println!("{}", shell.save_file(&file, &title)?),
        Command::Load { id, output } => shell.load_to_png(&id, &output)?,
        Command::List => {
            for (id, title) in shell.list()? {
                println!("{id}\t{title}");
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            let mut source = std::error::Error::source(&e);
            let mut message = format!("error: {e}");
            while let Some(cause) = source {
                message.push_str(&format!("\n  caused by: {cause}"));
                source = cause.source();
            }
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}
