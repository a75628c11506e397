use tracing_subscriber::EnvFilter;

pub fn print_verbose(verbose: bool, msg: &str) {
    if verbose {
        eprintln!("Verbose: {}", msg);
    }
}

pub fn log_warning(msg: &str) {
    eprintln!("Warning: {}", msg);
}

/// Filter directive used when `RUST_LOG` does not apply.
///
/// `--verbose` raises only this crate to debug so HTTP internals stay quiet.
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose { "warn,snowparam=debug" } else { "warn" }
}

/// Install the stderr subscriber for the library's tracing events.
///
/// `--verbose` wins over `RUST_LOG`. A second call leaves the first
/// subscriber in place.
pub fn init_stderr_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new(default_filter(true))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(false)))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}
