use clap::Parser;
use daygrid::cli::commands::Cli;
use daygrid::cli::handlers;
use daygrid::io::config_io;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.data_dir.as_deref());

    if let Err(e) = handlers::dispatch(cli) {
        tracing::debug!(error = %e, "command failed");
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

/// Log to stderr. RUST_LOG wins; otherwise the config's `log.filter`.
fn init_logging(data_dir: Option<&str>) {
    let fallback = handlers::resolve_data_dir(data_dir)
        .ok()
        .and_then(|dir| config_io::read_config(&dir).ok())
        .map(|config| config.log.filter)
        .unwrap_or_else(|| "warn".to_string());

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .init();
}
