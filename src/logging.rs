use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Level used when `RUST_LOG` is not set, from the number of `-v` flags.
pub fn level_for_verbosity(verbose: u8) -> Level {
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Installs the global subscriber. Logs go to stderr so stdout only carries results.
pub fn init(verbose: u8, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{}={}",
            env!("CARGO_CRATE_NAME"),
            level_for_verbosity(verbose).as_str().to_lowercase()
        ))
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
