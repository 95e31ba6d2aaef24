//! QMP control-socket client.
//!
//! The running machine exposes a unix socket speaking newline-delimited
//! JSON. We are strictly a client: the greeting arrives first, commands are
//! `{"execute": ...}` objects, asynchronous events share the channel with
//! command returns.

pub mod shutdown;

pub use shutdown::{
    run_shutdown, ShutdownMachine, ShutdownOutcome, ShutdownReport, ShutdownState,
    ShutdownTimeouts,
};

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// A protocol command we send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Capabilities,
    Powerdown,
    Quit,
}

impl Command {
    pub fn wire(&self) -> &'static [u8] {
        match self {
            Command::Capabilities => b"{ \"execute\": \"qmp_capabilities\" }\n",
            Command::Powerdown => b"{ \"execute\": \"system_powerdown\" }\n",
            Command::Quit => b"{ \"execute\": \"quit\" }\n",
        }
    }
}

/// What a received line turned out to be
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// The protocol-version greeting sent on connect
    Greeting,
    /// Acknowledgement of a command (`{"return": ...}`)
    Return,
    /// An asynchronous event, e.g. `SHUTDOWN`
    Event(String),
    /// Valid JSON we do not care about (errors, unknown shapes)
    Other,
}

#[derive(Deserialize)]
struct RawMessage {
    #[serde(rename = "QMP")]
    greeting: Option<Value>,
    #[serde(rename = "return")]
    command_return: Option<Value>,
    event: Option<String>,
}

/// Classify one received line. Malformed JSON yields `None`; the session
/// logs and skips it (multiple unrelated event types share the channel, so
/// a garbled line is never fatal).
pub fn classify(line: &str) -> Option<ServerMessage> {
    let raw: RawMessage = match serde_json::from_str(line) {
        Ok(raw) => raw,
        Err(e) => {
            debug!(error = %e, line, "ignoring malformed control message");
            return None;
        }
    };

    Some(if raw.greeting.is_some() {
        ServerMessage::Greeting
    } else if let Some(event) = raw.event {
        ServerMessage::Event(event)
    } else if raw.command_return.is_some() {
        ServerMessage::Return
    } else {
        ServerMessage::Other
    })
}

/// Accumulates raw socket reads and hands back complete, newline-terminated
/// lines. A single read may carry zero, one or several messages; partial
/// tails stay buffered until their terminator arrives.
#[derive(Debug, Default)]
pub struct LineBuffer {
    data: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes in; drain complete lines out (CR trimmed, empties skipped).
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.data.extend_from_slice(bytes);

        let mut lines = Vec::new();
        while let Some(pos) = self.data.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.data.drain(..=pos).collect();
            line.pop(); // the \n
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            if line.is_empty() {
                continue;
            }
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }
        lines
    }
}
