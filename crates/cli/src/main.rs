//! wsp - workspace provisioner
//!
//! Creates per-session workspaces by copying template prefixes inside an
//! S3-compatible bucket.

mod commands;
mod exit_code;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::GlobalArgs;
use exit_code::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "wsp", version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a session workspace from a template
    Provision(commands::provision::ProvisionArgs),

    /// Copy every object under one prefix to another prefix
    Replicate(commands::replicate::ReplicateArgs),

    /// Write a single object at BASE_KEY + RELATIVE_PATH
    Save(commands::save::SaveArgs),

    /// Generate shell completions
    Completions(commands::completions::CompletionsArgs),
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.global.debug);

    let code = match cli.command {
        Commands::Provision(args) => commands::provision::execute(args, &cli.global).await,
        Commands::Replicate(args) => commands::replicate::execute(args, &cli.global).await,
        Commands::Save(args) => commands::save::execute(args, &cli.global).await,
        Commands::Completions(args) => commands::completions::execute(args, Cli::command()),
    };

    if code != ExitCode::Success {
        std::process::exit(code.code());
    }
}
