use tracing_subscriber::EnvFilter;

// The UI owns the terminal, so stay quiet unless RUST_LOG asks otherwise.
// Redirect stderr to keep logs out of the way: `RUST_LOG=debug pro-metronome 2>metronome.log`
const DEFAULT_LOG_FILTER: &str = "off";

pub fn setup() {
    let directives = std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_owned());

    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::builder().parse_lossy(directives))
        .init();
}
