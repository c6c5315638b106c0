//! Driving the spawner and bindings by hand instead of through a Session

use pipe_rs::execution::{StdinBinding, StdoutBinding, echo};
use pipe_rs::{ExecutionContext, Framing, Spawner, Transform};
use std::io;
use std::os::fd::AsFd;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    match Spawner::spawn()? {
        ExecutionContext::Child(child) => {
            let consumer = child.close_unused()?;
            let _stdin = StdinBinding::bind(consumer)?;

            echo(
                io::stdin().as_fd(),
                io::stdout().as_fd(),
                Framing::Sentinel.decoder(),
                Transform::default(),
            )?;
            unsafe { libc::_exit(0) }
        }
        ExecutionContext::Parent(parent) => {
            let (mut child, producer) = parent.close_unused()?;

            let stdout = StdoutBinding::bind(producer)?;
            stdout.write_frame(&Framing::Sentinel.encode(b"manual")?)?;
            stdout.restore()?;

            let exit = child.wait()?;
            eprintln!("child {} finished: {:?}", child.pid(), exit);
        }
    }

    Ok(())
}
