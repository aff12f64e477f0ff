use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "nayabirth-cli", version, about = "NayaBirth CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Contraction timing and 5-1-1 detection
    Contraction {
        #[command(subcommand)]
        action: commands::contraction::ContractionAction,
    },
    /// Fetal movement counting
    Kick {
        #[command(subcommand)]
        action: commands::kick::KickAction,
    },
    /// Pregnancy week and trimester
    Timeline {
        #[command(subcommand)]
        action: commands::timeline::TimelineAction,
    },
    /// Birth plan wizard
    Plan {
        #[command(subcommand)]
        action: commands::plan::PlanAction,
    },
    /// Hospital bag checklist
    Checklist {
        #[command(subcommand)]
        action: commands::checklist::ChecklistAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Contraction { action } => commands::contraction::run(action),
        Commands::Kick { action } => commands::kick::run(action),
        Commands::Timeline { action } => commands::timeline::run(action),
        Commands::Plan { action } => commands::plan::run(action),
        Commands::Checklist { action } => commands::checklist::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
