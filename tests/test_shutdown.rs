// Shutdown protocol driver against an in-process fake QMP server.

use std::path::PathBuf;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;
use tokio_util::sync::CancellationToken;

use qvm::qmp::{run_shutdown, ShutdownOutcome, ShutdownState, ShutdownTimeouts};
use qvm::Error;

const GREETING: &[u8] = b"{\"QMP\": {\"version\": {\"qemu\": {\"major\": 8, \"minor\": 2}}, \"capabilities\": []}}\r\n";
const RETURN_OK: &[u8] = b"{\"return\": {}}\r\n";
const SHUTDOWN_EVENT: &[u8] =
    b"{\"event\": \"SHUTDOWN\", \"data\": {\"guest\": true}, \"timestamp\": {\"seconds\": 1}}\r\n";

fn execute_of(line: &str) -> String {
    serde_json::from_str::<serde_json::Value>(line)
        .ok()
        .and_then(|v| v.get("execute").and_then(|e| e.as_str()).map(String::from))
        .unwrap_or_default()
}

fn socket_in(dir: &tempfile::TempDir) -> PathBuf {
    dir.path().join("machine.qmp")
}

fn timeouts(grace_ms: u64, quit_ms: u64) -> ShutdownTimeouts {
    ShutdownTimeouts {
        grace: Duration::from_millis(grace_ms),
        quit_grace: Duration::from_millis(quit_ms),
    }
}

/// Fake machine behaviors after the polite power-down request arrives
#[derive(Clone, Copy)]
enum Behavior {
    /// Emit the SHUTDOWN event promptly (optionally preceded by garbage)
    Confirm { garbage_first: bool },
    /// Ignore the power-down; on quit, close the connection
    DieOnQuit,
    /// Ignore the power-down and the quit; keep the socket open
    Stubborn,
}

fn spawn_server(
    listener: UnixListener,
    behavior: Behavior,
) -> tokio::task::JoinHandle<Vec<String>> {
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let (read, mut write) = stream.into_split();
        let mut lines = BufReader::new(read).lines();

        write.write_all(GREETING).await.unwrap();

        let mut seen = Vec::new();
        while let Ok(Some(line)) = lines.next_line().await {
            let command = execute_of(&line);
            seen.push(command.clone());
            match command.as_str() {
                "qmp_capabilities" => {
                    write.write_all(RETURN_OK).await.unwrap();
                }
                "system_powerdown" => {
                    write.write_all(RETURN_OK).await.unwrap();
                    match behavior {
                        Behavior::Confirm { garbage_first } => {
                            if garbage_first {
                                write.write_all(b"%% not json %%\r\n").await.unwrap();
                            }
                            write.write_all(SHUTDOWN_EVENT).await.unwrap();
                        }
                        Behavior::DieOnQuit | Behavior::Stubborn => {}
                    }
                }
                "quit" => {
                    write.write_all(RETURN_OK).await.unwrap();
                    match behavior {
                        Behavior::DieOnQuit => break, // drop closes the socket
                        _ => {}
                    }
                }
                _ => {}
            }
        }
        seen
    })
}

#[tokio::test]
async fn test_confirmed_shutdown_sends_no_quit() {
    let dir = tempfile::tempdir().unwrap();
    let path = socket_in(&dir);
    let listener = UnixListener::bind(&path).unwrap();
    let server = spawn_server(listener, Behavior::Confirm { garbage_first: false });

    let report = run_shutdown(&path, timeouts(5_000, 1_000), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.outcome, ShutdownOutcome::Confirmed);
    assert_eq!(report.final_state, ShutdownState::ShutdownConfirmed);

    let seen = server.await.unwrap();
    assert_eq!(seen, vec!["qmp_capabilities", "system_powerdown"]);
}

#[tokio::test]
async fn test_garbled_message_mid_session_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let path = socket_in(&dir);
    let listener = UnixListener::bind(&path).unwrap();
    let server = spawn_server(listener, Behavior::Confirm { garbage_first: true });

    let report = run_shutdown(&path, timeouts(5_000, 1_000), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.outcome, ShutdownOutcome::Confirmed);
    let seen = server.await.unwrap();
    assert!(!seen.contains(&"quit".to_string()));
}

#[tokio::test]
async fn test_unresponsive_guest_escalates_to_single_quit() {
    let dir = tempfile::tempdir().unwrap();
    let path = socket_in(&dir);
    let listener = UnixListener::bind(&path).unwrap();
    let server = spawn_server(listener, Behavior::DieOnQuit);

    let report = run_shutdown(&path, timeouts(300, 2_000), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.outcome, ShutdownOutcome::Forced);

    let seen = server.await.unwrap();
    // Polite power-down strictly before the quit, and the quit exactly once.
    assert_eq!(seen, vec!["qmp_capabilities", "system_powerdown", "quit"]);
}

#[tokio::test]
async fn test_stubborn_guest_hits_hard_ceiling() {
    let dir = tempfile::tempdir().unwrap();
    let path = socket_in(&dir);
    let listener = UnixListener::bind(&path).unwrap();
    let server = spawn_server(listener, Behavior::Stubborn);

    let report = run_shutdown(&path, timeouts(200, 300), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.outcome, ShutdownOutcome::Failed);
    assert_eq!(report.final_state, ShutdownState::QuitSent);
    assert_eq!(report.timed_out, Some(Duration::from_millis(500)));
    server.abort();
}

#[tokio::test]
async fn test_mute_server_is_bounded_by_session_ceiling() {
    let dir = tempfile::tempdir().unwrap();
    let path = socket_in(&dir);
    let listener = UnixListener::bind(&path).unwrap();

    // Accepts the connection and then never says anything at all.
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
        drop(stream);
    });

    let report = tokio::time::timeout(
        Duration::from_secs(2),
        run_shutdown(&path, timeouts(200, 200), CancellationToken::new()),
    )
    .await
    .expect("session must end at the hard ceiling, not hang")
    .unwrap();

    assert_eq!(report.outcome, ShutdownOutcome::Failed);
    assert_eq!(report.final_state, ShutdownState::Connecting);
    assert_eq!(report.timed_out, Some(Duration::from_millis(400)));
    server.abort();
}

#[tokio::test]
async fn test_cancellation_stops_the_session_quietly() {
    let dir = tempfile::tempdir().unwrap();
    let path = socket_in(&dir);
    let listener = UnixListener::bind(&path).unwrap();

    // A server that greets but never acknowledges anything.
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let (read, mut write) = stream.into_split();
        write.write_all(GREETING).await.unwrap();
        let mut lines = BufReader::new(read).lines();
        let mut seen = Vec::new();
        while let Ok(Some(line)) = lines.next_line().await {
            seen.push(execute_of(&line));
        }
        seen
    });

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.cancel();
    });

    let report = run_shutdown(&path, timeouts(30_000, 5_000), cancel)
        .await
        .unwrap();

    assert_eq!(report.outcome, ShutdownOutcome::Failed);
    assert_eq!(report.final_state, ShutdownState::Greeted);
    assert!(report.timed_out.is_none());

    // Nothing was sent after the capabilities negotiation; in particular no
    // power-down and no quit went out on cancellation.
    let seen = server.await.unwrap();
    assert_eq!(seen, vec!["qmp_capabilities"]);
}

#[tokio::test]
async fn test_missing_socket_is_resource_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let err = run_shutdown(
        &dir.path().join("nope.qmp"),
        ShutdownTimeouts::default(),
        CancellationToken::new(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Error::ResourceNotFound(_)));
}
