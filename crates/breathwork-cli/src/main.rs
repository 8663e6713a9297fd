use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "breathwork", version, about = "Breathwork CLI")]
struct Cli {
    /// Log engine and storage activity to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Control a persisted breathing session
    Session {
        #[command(subcommand)]
        action: commands::session::SessionAction,
    },
    /// Run a guided session in the terminal
    Breathe(commands::live::BreatheArgs),
    /// Run the one-minute calibration
    Calibrate,
    /// 10-week protocol progress
    Protocol {
        #[command(subcommand)]
        action: commands::protocol::ProtocolAction,
    },
    /// Session statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Session history
    History {
        #[command(subcommand)]
        action: commands::stats::HistoryAction,
    },
    /// Daily practice streak
    Streak,
    /// Readiness/HRV correlation
    Hrv {
        #[command(subcommand)]
        action: commands::hrv::HrvAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Session { action } => commands::session::run(action),
        Commands::Breathe(args) => commands::live::breathe(args),
        Commands::Calibrate => commands::live::calibrate(),
        Commands::Protocol { action } => commands::protocol::run(action),
        Commands::Stats { action } => commands::stats::run_stats(action),
        Commands::History { action } => commands::stats::run_history(action),
        Commands::Streak => commands::stats::streak(),
        Commands::Hrv { action } => commands::hrv::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
