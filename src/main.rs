use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use static_hash_file::{consts, process_from_stdin, process_script, run_repl, CliConfig};

#[derive(Parser)]
#[command(
    name = "hashfile",
    about = "Static hash file of fixed size person records",
    version,
    long_about = "Runs CREATE, OPEN, CLOSE, INSERT, SCAN, FIND, STATS and EXIT commands against block structured hash files. Commands are read from stdin unless --repl or --script is given."
)]
struct Cli {
    /// Start an interactive prompt
    #[arg(long, conflicts_with = "script")]
    repl: bool,

    /// Run the commands of a file, one per line
    #[arg(long)]
    script: Option<PathBuf>,

    /// Directory relative file names are resolved against
    #[arg(long, env = "HASHFILE_DATA_DIR", default_value = ".")]
    data_dir: PathBuf,

    /// Number of indexes that can be open at the same time
    #[arg(
        long,
        env = "HASHFILE_MAX_OPEN_FILES",
        default_value_t = consts::DEFAULT_MAX_OPEN_FILES
    )]
    max_open_files: usize,

    /// Log filter used when RUST_LOG is not set
    #[arg(short, long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&cli.log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = CliConfig {
        data_dir: cli.data_dir,
        max_open_files: cli.max_open_files,
    };

    if cli.repl {
        run_repl(config).await?;
    } else if let Some(script) = cli.script {
        process_script(script, config).await?;
    } else {
        process_from_stdin(config).await?;
    }

    // The stdin reader blocks runtime shutdown until another line arrives
    std::process::exit(0);
}
