use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod commands;
mod config;
mod context;
mod format;

/// Layer - Container Image Layer Inspector
///
/// Reports the layers of a container image and lists the files inside them.
/// Images are looked up as a local tarball, then in the local image daemon,
/// then in the registry the reference names.
#[derive(Parser, Debug)]
#[command(name = "layer")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the diff ID and size of every layer
    #[command(visible_alias = "info")]
    Inspect {
        /// Image reference or path to an image tarball
        reference: String,
        /// Output format: pretty, json, yaml
        #[arg(short, long, default_value = "pretty")]
        format: String,
        /// Platform to pick from a multi-arch image (os/arch[/variant])
        #[arg(long)]
        platform: Option<String>,
    },
    /// List the files of one or more layers
    Ls {
        /// Image reference or path to an image tarball
        reference: String,
        /// Layers to list: 1-based position, digest or diff ID (default: all)
        #[arg(value_name = "LAYER_ID", allow_negative_numbers = true)]
        layers: Vec<String>,
        /// Sort files by size, largest first
        #[arg(short = 'S', long)]
        sort: bool,
        /// Output format: pretty, json, yaml
        #[arg(short, long, default_value = "pretty")]
        format: String,
        /// Platform to pick from a multi-arch image (os/arch[/variant])
        #[arg(long)]
        platform: Option<String>,
    },
    /// Display version information
    Version,
    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completion for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Inspect { .. } => "inspect",
            Commands::Ls { .. } => "ls",
            Commands::Version => "version",
            Commands::Completion { .. } => "completion",
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let verbosity = context::VerbosityLevel::from_flags(cli.verbose, cli.quiet);
    init_tracing(verbosity);

    let name = cli.command.name();
    if let Err(e) = run(cli.command, verbosity).await {
        eprintln!("{}: {}", name, e);
        std::process::exit(1);
    }
}

async fn run(command: Commands, verbosity: context::VerbosityLevel) -> liblayer::Result<()> {
    match command {
        Commands::Inspect {
            reference,
            format,
            platform,
        } => {
            let ctx = context::AppContext::build(platform.as_deref(), verbosity)?;
            let fmt = format::OutputFormat::from(format.as_str());
            commands::inspect::handle_inspect(&ctx, &reference, fmt).await
        }
        Commands::Ls {
            reference,
            layers,
            sort,
            format,
            platform,
        } => {
            let ctx = context::AppContext::build(platform.as_deref(), verbosity)?;
            let fmt = format::OutputFormat::from(format.as_str());
            commands::ls::handle_ls(&ctx, &reference, &layers, sort, fmt).await
        }
        Commands::Version => {
            commands::version::print_version();
            Ok(())
        }
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let bin_name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
            Ok(())
        }
    }
}

/// Logs go to stderr so table and JSON output on stdout stay clean.
fn init_tracing(verbosity: context::VerbosityLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.log_level()));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
