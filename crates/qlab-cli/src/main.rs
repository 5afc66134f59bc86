//! qlab Command-Line Interface
//!
//! Prints and charts measurement results: counts files, archived jobs, and
//! the backends a service offers.
//!
//! ```text
//!   qlab report --input bell.json
//!   qlab job ctb7hnpdf6zg0080t7q0 --archive runs/
//!   qlab backends --archive runs/ --least-busy
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{auth, backends, job, report, version};

/// qlab - measurement-result reporting for quantum experiments
#[derive(Parser)]
#[command(name = "qlab")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table.
    Table,
    /// The report as JSON.
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Report a counts file (JSON counts map or execution result)
    Report {
        /// Input file
        #[arg(short, long)]
        input: String,

        /// Shot total (defaults to the file's value, or the sum of counts)
        #[arg(short, long)]
        shots: Option<u32>,

        /// Context label shown in the header (defaults to the backend name)
        #[arg(short, long)]
        context: Option<String>,

        /// Chart title (defaults to the input file name)
        #[arg(short, long)]
        title: Option<String>,

        /// Chart file stem (defaults to a sanitized title)
        #[arg(long)]
        stem: Option<String>,

        /// Configuration file (YAML)
        #[arg(long)]
        config: Option<String>,

        /// Skip chart export
        #[arg(long)]
        no_export: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Fetch an archived job and report it
    Job {
        /// Job ID
        job_id: String,

        /// Archive directory
        #[arg(short, long, env = "QLAB_ARCHIVE")]
        archive: String,

        /// Chart title (defaults to the job ID)
        #[arg(short, long)]
        title: Option<String>,

        /// Configuration file (YAML)
        #[arg(long)]
        config: Option<String>,

        /// Skip chart export
        #[arg(long)]
        no_export: bool,
    },

    /// List backends in an archive catalogue
    Backends {
        /// Archive directory
        #[arg(short, long, env = "QLAB_ARCHIVE")]
        archive: String,

        /// Only show the least busy backend
        #[arg(long)]
        least_busy: bool,

        /// Consider simulators when picking the least busy backend
        #[arg(long)]
        include_simulators: bool,

        /// Minimum number of qubits
        #[arg(long, default_value = "0")]
        min_qubits: u32,
    },

    /// Manage the saved account
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand)]
enum AuthAction {
    /// Save the token from the environment or .env
    Login {
        /// Replace an existing saved account
        #[arg(long)]
        overwrite: bool,
    },

    /// Show whether an account is saved and where tokens would come from
    Status,

    /// Delete the saved account
    Logout,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Execute command
    let result = match cli.command {
        Commands::Report {
            input,
            shots,
            context,
            title,
            stem,
            config,
            no_export,
            format,
        } => report::execute(&report::ReportArgs {
            input,
            shots,
            context,
            title,
            stem,
            config,
            no_export,
            format,
        }),

        Commands::Job {
            job_id,
            archive,
            title,
            config,
            no_export,
        } => {
            job::execute(
                &job_id,
                &archive,
                title.as_deref(),
                config.as_deref(),
                no_export,
            )
            .await
        }

        Commands::Backends {
            archive,
            least_busy,
            include_simulators,
            min_qubits,
        } => backends::execute(&archive, least_busy, include_simulators, min_qubits).await,

        Commands::Auth { action } => match action {
            AuthAction::Login { overwrite } => auth::execute_login(overwrite),
            AuthAction::Status => auth::execute_status(),
            AuthAction::Logout => auth::execute_logout(),
        },

        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    // Handle errors
    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
