//! cutline: replay edit scripts against a session and export them.
//!
//! Usage:
//!   cutline inspect <SCRIPT>             Show the resulting timeline
//!   cutline plan <SCRIPT>                Print the render plan as JSON
//!   cutline render <SCRIPT> -o <OUT>     Export with ffmpeg

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use cutline_core::EngineConfig;

mod commands;
mod logging;
mod script;

#[derive(Parser)]
#[command(name = "cutline", about = "Timeline editing engine", version)]
struct Cli {
    /// Engine config file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a script and show the resulting timeline
    Inspect {
        /// Edit script (JSON)
        script: PathBuf,

        /// Print the whole session as JSON
        #[arg(long)]
        json: bool,
    },

    /// Replay a script and print its render plan
    Plan {
        /// Edit script (JSON)
        script: PathBuf,
    },

    /// Replay a script and export it with ffmpeg
    Render {
        /// Edit script (JSON)
        script: PathBuf,

        /// Output file path
        #[arg(short, long, default_value = "output.mp4")]
        output: PathBuf,

        /// Directory for intermediate segments
        #[arg(long)]
        work_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = EngineConfig::load_or_default(cli.config.as_deref())?;
    let mut logging_config = config.logging.clone();
    if cli.verbose {
        logging_config.level = "debug".to_string();
    }
    logging::init_logging(&logging_config);

    match cli.command {
        Commands::Inspect { script, json } => commands::inspect::run(&config, script, json),
        Commands::Plan { script } => commands::plan::run(&config, script),
        Commands::Render {
            script,
            output,
            work_dir,
        } => commands::render::run(&config, script, output, work_dir).await,
    }
}
