use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use boot_session::{invoke, Config, SessionError};
use clap::Parser;

/// Run boot tasks on a long-running build server
#[derive(Parser)]
#[command(name = "boot")]
#[command(version)]
struct Cli {
    /// Server address to dial (host:port)
    #[arg(short, long, env = "BOOT_ADDRESS")]
    address: Option<String>,

    /// TOML file with connection settings
    #[arg(short, long, env = "BOOT_CONFIG")]
    config: Option<PathBuf>,

    /// Seconds to wait for the connection (0 disables)
    #[arg(long, value_name = "SECS")]
    connect_timeout: Option<u64>,

    /// Seconds to wait on each of sending and receiving (0 disables)
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Tasks and their arguments, passed through unchanged
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    tasks: Vec<String>,
}

/// Filter directives: a non-empty `RUST_LOG` is used as is, otherwise `-v`
/// picks the level
fn log_directives(verbose: u8, rust_log: Option<&str>) -> String {
    match rust_log.map(str::trim) {
        Some(directives) if !directives.is_empty() => directives.to_string(),
        _ => match verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
        .to_string(),
    }
}

fn init_tracing(verbose: u8) {
    let rust_log = std::env::var("RUST_LOG").ok();
    let directives = log_directives(verbose, rust_log.as_deref());

    // Logs go to stderr; stdout carries only task output
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(directives))
        .with_writer(std::io::stderr)
        .init();
}

fn secs(value: u64) -> Option<Duration> {
    (value > 0).then(|| Duration::from_secs(value))
}

fn resolve_config(cli: &Cli) -> Result<Config, SessionError> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    if let Some(address) = &cli.address {
        config = config.with_address(address.as_str());
    }
    if let Some(value) = cli.connect_timeout {
        config = config.with_connect_timeout(secs(value));
    }
    if let Some(value) = cli.timeout {
        config = config.with_io_timeout(secs(value));
    }
    Ok(config)
}

async fn run(cli: Cli) -> Result<(), SessionError> {
    let config = resolve_config(&cli)?;
    let output = invoke(&config, cli.tasks.as_slice()).await?;

    // Bytes are forwarded as received, whatever their encoding
    if !output.err.is_empty() {
        let mut stderr = std::io::stderr().lock();
        if let Err(e) = stderr.write_all(&output.err).and_then(|_| stderr.flush()) {
            tracing::warn!(error = %e, "failed to write task diagnostics");
        }
    }
    let mut stdout = std::io::stdout().lock();
    if let Err(e) = stdout.write_all(&output.out).and_then(|_| stdout.flush()) {
        tracing::warn!(error = %e, "failed to write task output");
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // One connection, strictly sequential: a single-threaded runtime is enough
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("error: failed to start runtime: {}", e);
            return ExitCode::from(2);
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(e.exit_code() as u8)
        }
    }
}
