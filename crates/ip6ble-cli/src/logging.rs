use tracing_subscriber::EnvFilter;

/// `RUST_LOG` wins when set; otherwise `-v` repetition picks the level.
/// btleplug is chatty at debug, so it stays at warn until `-vvv`.
pub fn init_tracing(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbosity)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbosity >= 2)
        .compact()
        .try_init();
}

fn default_directives(verbosity: u8) -> String {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    if verbosity >= 3 {
        level.to_string()
    } else {
        format!("{level},btleplug=warn")
    }
}
