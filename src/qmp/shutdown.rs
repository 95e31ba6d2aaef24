use std::path::Path;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::qmp::{classify, Command, LineBuffer, ServerMessage};

/// How long we give the guest to power down politely, and how much longer we
/// wait after escalating to a forced quit.
#[derive(Debug, Clone, Copy)]
pub struct ShutdownTimeouts {
    pub grace: Duration,
    pub quit_grace: Duration,
}

impl Default for ShutdownTimeouts {
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(30),
            quit_grace: Duration::from_secs(5),
        }
    }
}

/// Session states, in the order a clean run visits them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownState {
    Connecting,
    Greeted,
    CapabilitiesOk,
    PowerdownSent,
    ShutdownConfirmed,
    QuitSent,
    Closed,
}

/// How the session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// The guest confirmed shutdown within the grace period
    Confirmed,
    /// The guest had to be told to quit, and then went away
    Forced,
    /// The guest outlived even the forced-quit ceiling, or the session was
    /// cancelled
    Failed,
}

#[derive(Debug, Clone, Copy)]
pub struct ShutdownReport {
    pub outcome: ShutdownOutcome,
    pub final_state: ShutdownState,
    /// The exhausted session budget, when the session ended on the hard
    /// ceiling rather than a protocol or caller event.
    pub timed_out: Option<Duration>,
}

/// The shutdown protocol state machine, free of any I/O.
///
/// The driver feeds it complete received lines and periodic ticks; it hands
/// back the commands to put on the wire. Both deadlines run from session
/// start, so a peer that stalls during the handshake is bounded by the same
/// ceiling as one that ignores the power-down. The forced quit is sent at
/// most once, and never before the power-down.
#[derive(Debug)]
pub struct ShutdownMachine {
    state: ShutdownState,
    deadline: Instant,
    hard_deadline: Instant,
    quit_sent: bool,
}

impl ShutdownMachine {
    pub fn new(timeouts: ShutdownTimeouts, now: Instant) -> Self {
        Self {
            state: ShutdownState::Connecting,
            deadline: now + timeouts.grace,
            hard_deadline: now + timeouts.grace + timeouts.quit_grace,
            quit_sent: false,
        }
    }

    pub fn state(&self) -> ShutdownState {
        self.state
    }

    pub fn quit_sent(&self) -> bool {
        self.quit_sent
    }

    /// Process one complete received line. Unknown or garbled messages
    /// change nothing.
    pub fn on_line(&mut self, line: &str) -> Vec<Command> {
        let Some(message) = classify(line) else {
            return Vec::new();
        };

        match (self.state, &message) {
            (ShutdownState::Connecting, ServerMessage::Greeting) => {
                debug!("greeting received, negotiating capabilities");
                self.state = ShutdownState::Greeted;
                vec![Command::Capabilities]
            }
            (ShutdownState::Greeted, ServerMessage::Return) => {
                debug!("capabilities acknowledged, requesting polite power-down");
                self.state = ShutdownState::CapabilitiesOk;
                // No wire event separates these two states.
                self.state = ShutdownState::PowerdownSent;
                vec![Command::Powerdown]
            }
            (ShutdownState::PowerdownSent, ServerMessage::Event(event))
                if event == "SHUTDOWN" =>
            {
                info!("machine confirmed shutdown");
                self.state = ShutdownState::ShutdownConfirmed;
                Vec::new()
            }
            (ShutdownState::QuitSent, ServerMessage::Event(event)) if event == "SHUTDOWN" => {
                debug!("shutdown event after forced quit");
                Vec::new()
            }
            _ => {
                debug!(state = ?self.state, message = ?message, "ignoring unrelated message");
                Vec::new()
            }
        }
    }

    /// Time-driven transitions. Crossing the grace deadline escalates to a
    /// forced quit exactly once; later ticks never resend it.
    pub fn on_tick(&mut self, now: Instant) -> Vec<Command> {
        if self.state == ShutdownState::PowerdownSent && !self.quit_sent && now >= self.deadline {
            warn!("grace period expired, escalating to forced quit");
            self.quit_sent = true;
            self.state = ShutdownState::QuitSent;
            return vec![Command::Quit];
        }
        Vec::new()
    }

    /// True once the whole-session ceiling has passed, whatever state the
    /// handshake or escalation reached
    pub fn hard_deadline_passed(&self, now: Instant) -> bool {
        !matches!(
            self.state,
            ShutdownState::ShutdownConfirmed | ShutdownState::Closed
        ) && now >= self.hard_deadline
    }

    pub fn close(&mut self) -> ShutdownState {
        let last = self.state;
        self.state = ShutdownState::Closed;
        last
    }
}

/// Poll granularity for interleaving socket reads with deadline checks
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Drive a full shutdown session against the machine's control socket.
///
/// One controller instance serves exactly one machine; run one task per
/// machine to shut several down concurrently. Cancelling the token closes
/// our socket handle without sending any further protocol messages.
pub async fn run_shutdown(
    socket_path: &Path,
    timeouts: ShutdownTimeouts,
    cancel: CancellationToken,
) -> Result<ShutdownReport> {
    if !socket_path.exists() {
        return Err(Error::ResourceNotFound(format!(
            "control socket {}",
            socket_path.display()
        )));
    }

    let mut stream = UnixStream::connect(socket_path)
        .await
        .map_err(Error::ConnectionLost)?;

    info!(socket = %socket_path.display(), grace = ?timeouts.grace, "shutdown session started");

    let mut machine = ShutdownMachine::new(timeouts, Instant::now());
    let mut framer = LineBuffer::new();
    let mut read_buf = [0u8; 8192];

    loop {
        let now = Instant::now();

        for command in machine.on_tick(now) {
            send(&mut stream, &mut machine, command).await?;
        }

        match machine.state() {
            ShutdownState::ShutdownConfirmed => {
                let final_state = machine.close();
                info!("shutdown confirmed within grace period");
                return Ok(ShutdownReport {
                    outcome: ShutdownOutcome::Confirmed,
                    final_state,
                    timed_out: None,
                });
            }
            _ if machine.hard_deadline_passed(now) => {
                let final_state = machine.close();
                warn!(state = ?final_state, "machine did not shut down before the session ceiling");
                return Ok(ShutdownReport {
                    outcome: ShutdownOutcome::Failed,
                    final_state,
                    timed_out: Some(timeouts.grace + timeouts.quit_grace),
                });
            }
            _ => {}
        }

        tokio::select! {
            _ = cancel.cancelled() => {
                let final_state = machine.close();
                info!(state = ?final_state, "shutdown session cancelled");
                return Ok(ShutdownReport {
                    outcome: ShutdownOutcome::Failed,
                    final_state,
                    timed_out: None,
                });
            }
            read = tokio::time::timeout(POLL_INTERVAL, stream.read(&mut read_buf)) => {
                match read {
                    // Poll window elapsed with nothing readable; loop for
                    // the next deadline check.
                    Err(_) => {}
                    Ok(Ok(0)) => {
                        let final_state = machine.close();
                        return if machine.quit_sent() {
                            info!("socket closed after forced quit");
                            Ok(ShutdownReport {
                                outcome: ShutdownOutcome::Forced,
                                final_state,
                                timed_out: None,
                            })
                        } else {
                            Err(Error::ConnectionLost(std::io::Error::new(
                                std::io::ErrorKind::UnexpectedEof,
                                "control socket closed before shutdown completed",
                            )))
                        };
                    }
                    Ok(Ok(n)) => {
                        for line in framer.push(&read_buf[..n]) {
                            let commands = machine.on_line(&line);
                            for command in commands {
                                send(&mut stream, &mut machine, command).await?;
                            }
                        }
                    }
                    Ok(Err(e)) => {
                        let final_state = machine.close();
                        return if machine.quit_sent() {
                            debug!(error = %e, "read error after forced quit, peer exited");
                            Ok(ShutdownReport {
                                outcome: ShutdownOutcome::Forced,
                                final_state,
                                timed_out: None,
                            })
                        } else {
                            Err(Error::ConnectionLost(e))
                        };
                    }
                }
            }
        }
    }
}

async fn send(
    stream: &mut UnixStream,
    machine: &mut ShutdownMachine,
    command: Command,
) -> Result<()> {
    debug!(command = ?command, "sending control command");
    if let Err(e) = stream.write_all(command.wire()).await {
        machine.close();
        return Err(Error::ConnectionLost(e));
    }
    Ok(())
}
