//! pvt: Point Value Tool - dump and load point values of a store.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod commands;

/// Environment variable holding the log filter.
const LOG_ENV_VAR: &str = "PVT_LOG";

#[derive(Parser)]
#[command(name = "pvt")]
#[command(about = "Point Value Tool - dump and load point values")]
#[command(version)]
struct Cli {
    /// Log debug details to stderr
    #[arg(short = 'v', long = "verbose", global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dump point values from a store (keywords: WITH FROM INTO USER PASSWORD POINT PULL SYNCED ALL AFTER BEFORE NOT; HELP for usage)
    Dump {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        words: Vec<String>,
    },

    /// Load point values into a store (keywords: WITH FROM INTO USER PASSWORD; HELP for usage)
    Load {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        words: Vec<String>,
    },

    /// Create an empty local store
    Init {
        /// Store name or database path (default: the configured default store)
        store: Option<String>,

        /// Configuration file
        #[arg(short = 'w', long = "with")]
        with: Option<String>,

        /// Register a login user
        #[arg(short = 'u', long = "user")]
        user: Option<String>,

        /// Password for --user
        #[arg(short = 'p', long = "password", requires = "user")]
        password: Option<String>,
    },

    /// Register a point in a local store
    Point {
        /// Point name
        name: String,

        /// Configuration file
        #[arg(short = 'w', long = "with")]
        with: Option<String>,

        /// Store name or database path (default: the configured default store)
        #[arg(short = 's', long = "store")]
        store: Option<String>,

        /// Point UUID (default: a new random one)
        #[arg(long = "uuid")]
        uuid: Option<Uuid>,

        /// Mark the point as synced
        #[arg(long = "synced")]
        synced: bool,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let (result, tool) = match cli.command {
        Commands::Dump { words } => (commands::dump(&words), Some(pvx::Tool::Export)),
        Commands::Load { words } => (commands::load(&words), Some(pvx::Tool::Import)),
        Commands::Init { store, with, user, password } => (
            commands::init(store.as_deref(), with.as_deref(), user.as_deref(), password.as_deref()),
            None,
        ),
        Commands::Point { name, with, store, uuid, synced } => (
            commands::point(&name, with.as_deref(), store.as_deref(), uuid, synced),
            None,
        ),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        if let (true, Some(tool)) = (e.is_usage(), tool) {
            eprintln!("{}", tool.usage("pvt"));
        }
        std::process::exit(-1);
    }
}
