use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod cli;
mod logging;

#[derive(Parser)]
#[command(name = "whconnect", about = "Warehouse connection profiles")]
struct Cli {
    /// Path to the profiles file
    #[arg(long, global = true, env = "WHCONNECT_CONFIG")]
    config: Option<PathBuf>,

    /// Log more (repeat for debug and trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a profile before connecting
    Check {
        /// Profile name (uses default if omitted)
        #[arg(short, long)]
        profile: Option<String>,
        /// With OAuth off, any OAuth parameter error accepts the whole profile
        #[arg(long)]
        legacy_oauth_exemption: bool,
    },

    /// Print a profile as stored (password omitted)
    Show {
        /// Profile name (uses default if omitted)
        #[arg(short, long)]
        profile: Option<String>,
    },

    /// List configured profiles
    Profiles,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = cli.config.as_deref();
    let result = match &cli.command {
        Commands::Check {
            profile,
            legacy_oauth_exemption,
        } => cli::commands::cmd_check(config, profile.as_deref(), *legacy_oauth_exemption),
        Commands::Show { profile } => cli::commands::cmd_show(config, profile.as_deref()),
        Commands::Profiles => cli::commands::cmd_profiles(config),
    };

    if let Err(e) = result {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}
