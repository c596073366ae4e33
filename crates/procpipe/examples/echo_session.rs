//! Drives a `cat` child through a write/read/terminate session.

#[cfg(unix)]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use procpipe::{ChildHandle, SpawnConfig, StdStream, signals};
    use std::time::Duration;

    tracing_subscriber::fmt().with_target(false).init();

    let config = SpawnConfig::builder().program("cat").build()?;
    let mut child = procpipe::spawn(&config).await?;
    println!("spawned pid {} on {}", child.pid(), procpipe::PlatformLauncher::platform_name());

    child.write_stdin(b"hello through the pipe\n").await?;
    let chunk = child
        .read(StdStream::Stdout, Some(Duration::from_secs(2)))
        .await?;
    println!("child echoed: {}", String::from_utf8_lossy(&chunk.into_bytes()));

    println!(
        "graceful termination uses signal {:?}",
        signals().value("SIGTERM")
    );
    child.terminate().await?;
    let state = child.wait(Some(Duration::from_secs(2))).await?;
    println!("final state {state:?}, exit status {:?}", child.exit_status());

    Ok(())
}

#[cfg(not(unix))]
fn main() {
    eprintln!("this example drives POSIX userland tools; run it on a unix host");
}
