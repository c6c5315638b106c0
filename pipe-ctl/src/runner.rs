use console::style;
use log::{debug, info};
use pipe_rs::{Framing, Session, SessionReport, Variant};

/// Configuration for one parent/child run
pub struct RunConfig {
    pub message: String,
    pub hex: Option<String>,
    pub variant: Variant,
    pub framing: Framing,
    pub shift: u8,
    pub wait: bool,
    pub json: bool,
}

pub fn run_session(config: RunConfig) -> Result<SessionReport, Box<dyn std::error::Error>> {
    let mut builder = Session::builder()
        .variant(config.variant)
        .framing(config.framing)
        .shift(config.shift)
        .wait(config.wait);

    builder = match config.hex {
        Some(ref hex) => {
            debug!("Using hex payload: {}", hex);
            builder.payload_hex(hex)?
        }
        None => builder.message(&config.message),
    };

    let session = builder.build()?;
    info!(
        "Starting {:?} session ({:?} framing, {} payload bytes)",
        config.variant,
        config.framing,
        session.config().payload.len()
    );

    let report = session.run()?;

    if config.json {
        println!("{}", serde_json::to_string(&report)?);
    } else {
        print_summary(&report);
    }

    Ok(report)
}

fn print_summary(report: &SessionReport) {
    let exit = match report.child_exit {
        Some(exit) if exit.success() => style(exit.code().to_string()).green().bold(),
        Some(exit) => style(exit.code().to_string()).red().bold(),
        None => style("not waited".to_string()).dim(),
    };

    eprintln!(
        "{}={} | {}={} | {}={} | {}={}",
        style("parent_pid").dim(),
        style(report.parent_pid).bold(),
        style("child_pid").dim(),
        style(report.child_pid).bold(),
        style("bytes_sent").dim(),
        style(report.bytes_sent).bold(),
        style("child_exit").dim(),
        exit,
    );
}
