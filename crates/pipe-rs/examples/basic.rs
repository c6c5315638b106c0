//! Basic session example

use pipe_rs::Session;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== pipe-rs - Basic Example ===\n");

    println!("[1] Parent sends \"AB\", child echoes it shifted by two...");
    let report = Session::builder().message("AB").wait(true).build()?.run()?;

    println!("[*] Parent pid: {}", report.parent_pid);
    println!("[*] Child pid: {}", report.child_pid);
    println!("[*] Bytes sent: {}", report.bytes_sent);
    println!("[*] Child exit: {:?}\n", report.child_exit);

    Ok(())
}
