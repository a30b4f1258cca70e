use clap::{Parser, Subcommand};
use xtask::{Result, commands};

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Build automation for the msntp crate and demos")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build msntp with every supported feature set, then all demos
    Build,
    /// Run msntp tests with every supported feature set
    Test,
    /// Check all workspace members
    Check,
    /// Run clippy on msntp and all demos with strict linting
    Clippy,
    /// Check or fix code formatting of the whole workspace
    Format {
        /// Check formatting without making changes
        #[arg(long, conflicts_with = "fix")]
        check: bool,
        /// Fix formatting issues
        #[arg(long, conflicts_with = "check")]
        fix: bool,
    },
    /// Clean all build artifacts
    Clean,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build => {
            commands::build::build_crate()?;
            commands::build::build_demos()
        }
        Commands::Test => commands::test::run_tests(),
        Commands::Check => commands::check::check_all(),
        Commands::Clippy => commands::clippy::run_clippy(),
        Commands::Format { fix: true, .. } => commands::format::fix_formatting(),
        Commands::Format { .. } => commands::format::check_formatting(),
        Commands::Clean => commands::clean::clean_all(),
    }
}
