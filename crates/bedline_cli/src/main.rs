//! Bedline CLI
//!
//! Staff tooling for shelter bed allocation over a JSON state file.
//!
//! # Commands
//!
//! - `create-room`, `set-active`, `set-sex` - Manage rooms
//! - `generate` - Generate bunks and slots for a room
//! - `assign`, `release`, `auto-assign` - Change occupancy
//! - `rooms`, `slots`, `bunks`, `available`, `history`, `locate` - Listings
//!
//! Mutating commands save the state file after they succeed.

mod commands;
mod shelter;

use bedline_core::AllocError;
use bedline_model::Sex;
use clap::{ArgAction, Parser, Subcommand};
use shelter::Shelter;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Shelter bed allocation tools.
#[derive(Parser)]
#[command(name = "bedline")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the shelter state file
    #[arg(
        global = true,
        long,
        env = "BEDLINE_STATE",
        default_value = "bedline-state.json"
    )]
    state: PathBuf,

    /// Path to the beneficiary directory (JSON array)
    #[arg(global = true, long, env = "BEDLINE_DIRECTORY")]
    directory: Option<PathBuf>,

    /// Staff member recorded on assignment records
    #[arg(global = true, long, env = "BEDLINE_ACTOR")]
    actor: Option<String>,

    /// Milliseconds to wait for another session to release the state file
    /// [default: 5000]
    #[arg(global = true, long, env = "BEDLINE_LOCK_TIMEOUT_MS")]
    lock_timeout_ms: Option<u64>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a room
    CreateRoom {
        /// Room code, e.g. H-101
        #[arg(long)]
        code: String,

        /// Sex restriction (H or M)
        #[arg(long)]
        sex: Sex,

        /// Floor number
        #[arg(long)]
        floor: Option<i32>,
    },

    /// Activate or deactivate a room
    SetActive {
        /// Room ID
        #[arg(long)]
        room: u32,

        /// true to activate, false to deactivate
        #[arg(long, action = ArgAction::Set)]
        active: bool,
    },

    /// Change a room's sex restriction (only before slots exist)
    SetSex {
        /// Room ID
        #[arg(long)]
        room: u32,

        /// New sex restriction (H or M)
        #[arg(long)]
        sex: Sex,
    },

    /// Generate bunks for a room (additive)
    Generate {
        /// Room ID
        #[arg(long)]
        room: u32,

        /// Number of bunks
        #[arg(long)]
        bunks: u32,
    },

    /// Assign an occupant to a slot
    Assign {
        /// Slot ID
        #[arg(long)]
        slot: u64,

        /// Occupant ID
        #[arg(long)]
        occupant: u64,
    },

    /// Release a slot
    Release {
        /// Slot ID
        #[arg(long)]
        slot: u64,
    },

    /// Place an occupant in the best available slot
    AutoAssign {
        /// Occupant ID
        #[arg(long)]
        occupant: u64,
    },

    /// List rooms with their counts
    Rooms {
        /// Only rooms with this sex restriction
        #[arg(long)]
        sex: Option<Sex>,

        /// Include inactive rooms
        #[arg(long)]
        all: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List a room's slots
    Slots {
        /// Room ID
        #[arg(long)]
        room: u32,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List a room's bunks with free and occupied counts
    Bunks {
        /// Room ID
        #[arg(long)]
        room: u32,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List beneficiaries without a bed
    Available {
        /// Only beneficiaries of this sex
        #[arg(long)]
        sex: Option<Sex>,

        /// Text to find in names or document
        #[arg(short, long)]
        query: Option<String>,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show a slot's assignment history
    History {
        /// Slot ID
        #[arg(long)]
        slot: u64,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show the slot an occupant holds
    Locate {
        /// Occupant ID
        #[arg(long)]
        occupant: u64,
    },

    /// Show version information
    Version,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = match err.downcast_ref::<AllocError>() {
                Some(alloc) => {
                    eprintln!("error: {}", alloc.user_message());
                    if alloc.is_client_error() {
                        1
                    } else {
                        2
                    }
                }
                None => {
                    eprintln!("error: {err}");
                    2
                }
            };
            ExitCode::from(code)
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Commands::Version = cli.command {
        println!("Bedline CLI v{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let directory = cli.directory.as_deref();
    let actor = cli.actor.as_deref();
    let shelter = match cli.lock_timeout_ms {
        Some(ms) => {
            Shelter::open_with_timeout(&cli.state, directory, actor, Duration::from_millis(ms))?
        }
        None => Shelter::open(&cli.state, directory, actor)?,
    };

    match cli.command {
        Commands::CreateRoom { code, sex, floor } => {
            commands::rooms::create(&shelter, &code, sex, floor)?;
        }
        Commands::SetActive { room, active } => {
            commands::rooms::set_active(&shelter, room, active)?;
        }
        Commands::SetSex { room, sex } => {
            commands::rooms::set_sex(&shelter, room, sex)?;
        }
        Commands::Generate { room, bunks } => {
            commands::generate::run(&shelter, room, bunks)?;
        }
        Commands::Assign { slot, occupant } => {
            commands::occupancy::assign(&shelter, slot, occupant)?;
        }
        Commands::Release { slot } => {
            commands::occupancy::release(&shelter, slot)?;
        }
        Commands::AutoAssign { occupant } => {
            commands::occupancy::auto_assign(&shelter, occupant)?;
        }
        Commands::Rooms { sex, all, format } => {
            commands::rooms::list(&shelter, sex, all, &format)?;
        }
        Commands::Slots { room, format } => {
            commands::slots::list(&shelter, room, &format)?;
        }
        Commands::Bunks { room, format } => {
            commands::slots::bunks(&shelter, room, &format)?;
        }
        Commands::Available {
            sex,
            query,
            limit,
            format,
        } => {
            commands::available::run(&shelter, sex, query, limit, &format)?;
        }
        Commands::History { slot, format } => {
            commands::slots::history(&shelter, slot, &format)?;
        }
        Commands::Locate { occupant } => {
            commands::slots::locate(&shelter, occupant)?;
        }
        Commands::Version => {}
    }

    Ok(())
}
