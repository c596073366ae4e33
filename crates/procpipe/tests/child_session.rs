//! End-to-end sessions against real child processes. POSIX userland only.
#![cfg(unix)]

use procpipe::{ChildHandle, ProcessState, ReadChunk, SignalError, SpawnConfig, StdStream, signals};
use std::time::{Duration, Instant};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_target(false)
        .with_line_number(true)
        .try_init();
}

fn config(program: &str, args: &[&str]) -> SpawnConfig {
    SpawnConfig::builder()
        .program(program)
        .args(args.iter().copied())
        .build()
        .unwrap()
}

async fn spawn(program: &str, args: &[&str]) -> Box<dyn ChildHandle> {
    procpipe::spawn(&config(program, args))
        .await
        .expect("spawn failed")
}

/// Collect stdout until `expected` bytes arrived or the deadline passed.
async fn read_exactly(child: &mut Box<dyn ChildHandle>, expected: usize) -> Vec<u8> {
    let deadline = Instant::now() + Duration::from_secs(10);
    let mut collected = Vec::new();
    while collected.len() < expected && Instant::now() < deadline {
        match child
            .read(StdStream::Stdout, Some(Duration::from_millis(200)))
            .await
            .unwrap()
        {
            ReadChunk::Data(bytes) => collected.extend_from_slice(&bytes),
            ReadChunk::Pending => continue,
            ReadChunk::Eof => break,
        }
    }
    collected
}

#[tokio::test]
async fn state_is_running_immediately_after_spawn() {
    init_tracing();
    let mut child = spawn("sleep", &["5"]).await;
    assert_eq!(child.state(), ProcessState::Running);

    // a wait never reports Unknown
    let state = child.wait(Some(Duration::ZERO)).await.unwrap();
    assert_ne!(state, ProcessState::Unknown);

    child.kill().await.unwrap();
    child.wait(Some(Duration::from_secs(5))).await.unwrap();
}

#[tokio::test]
async fn echo_command_round_trip() {
    init_tracing();
    // a child that answers the input line "echo 1" with "1"
    let mut child = spawn("sh", &["-c", r#"read cmd arg; echo "$arg""#]).await;

    let written = child.write_stdin(b"echo 1\n").await.unwrap();
    assert_eq!(written, 7);

    let output = read_exactly(&mut child, 2).await;
    assert_eq!(output, b"1\n");

    let state = child.wait(Some(Duration::from_secs(5))).await.unwrap();
    assert_eq!(state, ProcessState::Exited(0));
}

#[tokio::test]
async fn zero_timeout_read_never_blocks() {
    let mut child = spawn("sleep", &["5"]).await;

    let start = Instant::now();
    let chunk = child
        .read(StdStream::Stdout, Some(Duration::ZERO))
        .await
        .unwrap();
    assert_eq!(chunk, ReadChunk::Pending);
    assert!(start.elapsed() < Duration::from_millis(200));

    child.kill().await.unwrap();
    child.wait(Some(Duration::from_secs(5))).await.unwrap();
}

#[tokio::test]
async fn kill_reports_the_kill_signal_and_is_idempotent() {
    let mut child = spawn("sleep", &["30"]).await;
    let kill_signal = signals().value("SIGKILL").unwrap();

    child.kill().await.unwrap();
    let state = child.wait(Some(Duration::from_secs(5))).await.unwrap();
    assert_eq!(state, ProcessState::Signaled(kill_signal));
    assert_eq!(child.exit_status(), Some(kill_signal));

    // a second kill or terminate on an exited child is a no-op, not an error
    child.kill().await.unwrap();
    child.terminate().await.unwrap();
    assert_eq!(child.state(), ProcessState::Signaled(kill_signal));
}

#[tokio::test]
async fn term_ignoring_child_survives_terminate_and_dies_to_kill() {
    init_tracing();
    let mut child = spawn("sh", &["-c", r#"trap "" TERM; sleep 30"#]).await;
    // let the shell install the trap before signaling
    tokio::time::sleep(Duration::from_millis(200)).await;

    child.terminate().await.unwrap();
    let state = child.wait(Some(Duration::from_secs(1))).await.unwrap();
    assert_eq!(state, ProcessState::Running);

    child.kill().await.unwrap();
    let state = child.wait(Some(Duration::from_secs(5))).await.unwrap();
    assert_eq!(state, ProcessState::Signaled(signals().value("SIGKILL").unwrap()));
}

#[tokio::test]
async fn unsupported_signal_leaves_the_child_untouched() {
    let mut child = spawn("sleep", &["5"]).await;

    let err = child.send_signal("SIGNOTATHING").await.unwrap_err();
    assert!(matches!(err, SignalError::UnsupportedOnPlatform(_)));
    assert_eq!(child.state(), ProcessState::Running);

    let state = child.wait(Some(Duration::from_millis(100))).await.unwrap();
    assert_eq!(state, ProcessState::Running);

    child.kill().await.unwrap();
    child.wait(Some(Duration::from_secs(5))).await.unwrap();
}

#[tokio::test]
async fn stdout_and_stderr_are_independent_channels() {
    let mut child = spawn("sh", &["-c", "echo visible; echo hidden >&2"]).await;
    child.wait(Some(Duration::from_secs(5))).await.unwrap();

    let out = child
        .read(StdStream::Stdout, Some(Duration::from_secs(1)))
        .await
        .unwrap();
    assert_eq!(out, ReadChunk::Data(b"visible\n".to_vec()));

    let err = child
        .read(StdStream::Stderr, Some(Duration::from_secs(1)))
        .await
        .unwrap();
    assert_eq!(err, ReadChunk::Data(b"hidden\n".to_vec()));

    // both streams drain to a persistent EOF
    assert!(matches!(
        child.read(StdStream::Stdout, Some(Duration::from_secs(1))).await.unwrap(),
        ReadChunk::Eof
    ));
    assert!(matches!(
        child.read(StdStream::Stderr, Some(Duration::from_secs(1))).await.unwrap(),
        ReadChunk::Eof
    ));
}

#[tokio::test]
async fn exit_code_of_a_failing_child_is_recorded() {
    let mut child = spawn("sh", &["-c", "exit 7"]).await;
    let state = child.wait(None).await.unwrap();
    assert_eq!(state, ProcessState::Exited(7));
    assert_eq!(child.exit_status(), Some(7));
}
