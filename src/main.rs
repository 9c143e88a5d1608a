mod cli;

use cli::RunOutcome;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let (config, command, verbose) = match cli::run() {
        RunOutcome::Execute {
            config,
            command,
            verbose,
        } => (config, command, verbose),
        RunOutcome::Exit(code) => std::process::exit(code),
    };

    init_tracing(verbose);

    let code = cli::execute(config, command).await;
    std::process::exit(code);
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
