use tracing_subscriber::EnvFilter;

/// Environment variable holding a tracing filter directive, e.g. `tracegraph=debug`
pub const LOG_ENV: &str = "TRACEGRAPH_LOG";

/// Install the stderr subscriber.
///
/// `TRACEGRAPH_LOG` wins when set; otherwise `verbose` picks the level,
/// starting at `warn` so the terminal viewer stays clean.
pub fn init(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

    // A second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
