use std::time::Duration;

use anyhow::{bail, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cli::StopArgs;
use crate::error::Error;
use crate::paths;
use crate::qmp::{run_shutdown, ShutdownOutcome, ShutdownTimeouts};

pub async fn cmd_stop(args: StopArgs) -> Result<()> {
    let socket_path = args
        .socket
        .clone()
        .unwrap_or_else(|| paths::qmp_socket_path(&args.name));

    let timeouts = ShutdownTimeouts {
        grace: Duration::from_secs(args.graceful_shutdown),
        quit_grace: Duration::from_secs(args.quit_grace),
    };

    // Ctrl-C cancels the session: the socket is closed without sending any
    // further protocol messages.
    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_cancel.cancel();
        }
    });

    let report = run_shutdown(&socket_path, timeouts, cancel).await?;

    match report.outcome {
        ShutdownOutcome::Confirmed => {
            info!(machine = %args.name, "machine powered off");
            Ok(())
        }
        ShutdownOutcome::Forced => {
            warn!(machine = %args.name, "machine required a forced quit");
            Ok(())
        }
        ShutdownOutcome::Failed => {
            if let Some(elapsed) = report.timed_out {
                return Err(Error::ProtocolTimeout(elapsed).into());
            }
            bail!(
                "shutdown of {} did not complete (final state {:?})",
                args.name,
                report.final_state
            );
        }
    }
}
