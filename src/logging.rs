use std::fs::File;

use env_logger::{Builder, Env, Target};
use log::LevelFilter;

/// Initializes the global logger.
///
/// `verbose` lowers the default filter to debug; `RUST_LOG` still wins.
/// The terminal front end owns stderr, so it passes a log file here.
pub fn init(verbose: bool, file: Option<File>) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let env = Env::default().default_filter_or(level.to_string());
    let mut builder = Builder::from_env(env);
    if let Some(f) = file {
        builder.target(Target::Pipe(Box::new(f)));
    }

    // Already-initialized loggers (tests) are fine.
    let _ = builder.try_init();
}
