use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "warp",
    about = "WarpGrid — autoscaling decider evaluation",
    version,
    propagate_version = true,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate autoscaling decider results
    Autoscale {
        #[command(subcommand)]
        action: AutoscaleAction,
    },
}

#[derive(Subcommand)]
enum AutoscaleAction {
    /// Merge the deciders of an evaluation file into a required capacity.
    ///
    /// The file lists the current capacity and one table per decider
    /// (TOML, or JSON when the path ends in .json). A decider without a
    /// required_capacity is undetermined and cancels the result.
    Evaluate {
        /// Path to the evaluation file
        #[arg(short, long)]
        path: String,
        /// Output format: json, text or wire
        #[arg(short, long, default_value = "json")]
        format: String,
        /// Write output to a file instead of stdout
        #[arg(short, long)]
        out: Option<String>,
    },
    /// Decode wire-encoded decider results and print them as JSON
    Decode {
        /// Path to the encoded results
        #[arg(short, long)]
        path: String,
        /// Input is hex text rather than raw bytes
        #[arg(long)]
        hex: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("warp=info".parse()?)
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Autoscale { action } => match action {
            AutoscaleAction::Evaluate { path, format, out } => {
                commands::autoscale::evaluate(&path, &format, out.as_deref())
            }
            AutoscaleAction::Decode { path, hex } => {
                commands::autoscale::decode(&path, hex)
            }
        },
    }
}
