use console::style;
use env_logger::{Builder, Env, Target};
use log::Level;
use std::io::Write;

/// Initialize logger based on verbose flag.
///
/// Logs go to stderr so they never land in a channel aliased onto stdout.
pub fn init_logger(verbose: bool) {
    let env = Env::default().filter_or("RUST_LOG", if verbose { "debug" } else { "warn" });

    Builder::from_env(env)
        .target(Target::Stderr)
        .format(|buf, record| {
            let level = match record.level() {
                Level::Error => format!("{}", style("ERROR").red().bold()),
                Level::Warn => format!("{}", style("WARN ").yellow().bold()),
                Level::Info => format!("{}", style("INFO ").green()),
                Level::Debug => format!("{}", style("DEBUG").cyan()),
                Level::Trace => format!("{}", style("TRACE").dim()),
            };
            writeln!(
                buf,
                "{} [{}] {}",
                level,
                std::process::id(),
                record.args()
            )
        })
        .init();
}
