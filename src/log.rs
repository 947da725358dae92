/// Print an informational message: `[*]` in yellow.
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        println!("[{}] {}", "\x1b[33m*\x1b[0m", format!($($arg)*))
    };
}

/// Print a success message: `[+]` in green.
#[macro_export]
macro_rules! success {
    ($($arg:tt)*) => {
        println!("[{}] {}", "\x1b[32m+\x1b[0m", format!($($arg)*))
    };
}

/// Print a warning: `[!]` in magenta, on stderr.
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        eprintln!("[{}] {}", "\x1b[35m!\x1b[0m", format!($($arg)*))
    };
}

/// Print an error message: `[-]` in red.
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        eprintln!("[{}] {}", "\x1b[31m-\x1b[0m", format!($($arg)*))
    };
}

/// Diagnostic output goes through `tracing` on stderr, filtered by
/// `RUST_LOG` or else by the `-v` count.
pub fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
