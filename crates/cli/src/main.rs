mod commands;
mod logging;

use clap::{CommandFactory, Parser};
use clap_complete::{Shell, generate};
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "prerender")]
#[command(version, about = "Prerender a built single-page app into static HTML", long_about = None)]
struct Cli {
    /// Project root containing the sitemap and the build output
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Config file (defaults to <root>/prerender.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Parser)]
enum Command {
    /// Render every discovered route into the build output (default)
    Run,

    /// List the routes that would be rendered, without rendering
    Routes,

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            logging::init_logging();
            commands::run::run(cli.root, cli.config).await
        }
        Command::Routes => {
            logging::init_logging();
            commands::routes::run(cli.root, cli.config)
        }
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "prerender", &mut io::stdout());
            Ok(())
        }
    }
}
