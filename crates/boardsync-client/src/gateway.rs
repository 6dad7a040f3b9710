//! Outbound command gateway.
//!
//! Translates user intents into wire commands and hands them to the
//! connection. Sends are fire-and-forget and never block: while the
//! connection is anything but open, a send fails immediately with
//! `Error::NotConnected` so the UI can surface "not connected" instead of
//! stalling. No command is ever queued for a future connection or retried.
//!
//! The gateway never touches the peripheral store. The state change a
//! command causes (if any) arrives later as an ordinary inbound delta,
//! which is what updates the store — the display always reflects what the
//! engine confirmed, not what the user merely requested.

use boardsync_core::{Error, Result};
use boardsync_protocol::Command;
use tokio::sync::{mpsc, watch};
use tracing::trace;

use crate::connection::ConnectionState;

/// Handle for sending commands to the engine.
///
/// Cheap to clone; every clone observes the same connection.
///
/// # Examples
///
/// ```no_run
/// use boardsync_client::{ClientConfig, Session};
/// use boardsync_protocol::Command;
///
/// # async fn example() -> boardsync_core::Result<()> {
/// let session = Session::connect(ClientConfig::default());
/// let gateway = session.gateway();
///
/// gateway.send(&Command::GpioInput { pin: 23, state: true })?;
/// gateway.send(&Command::pwm_duty(18, 75.0))?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CommandGateway {
    connectivity: watch::Receiver<ConnectionState>,
    outbound: mpsc::UnboundedSender<String>,
}

impl CommandGateway {
    pub(crate) fn new(
        connectivity: watch::Receiver<ConnectionState>,
        outbound: mpsc::UnboundedSender<String>,
    ) -> Self {
        Self {
            connectivity,
            outbound,
        }
    }

    /// Send one command, fire-and-forget.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotConnected` immediately — without blocking or
    /// queueing — if the connection is not currently open or the session
    /// has shut down. Encoding failures surface as
    /// `Error::MalformedFrame`.
    pub fn send(&self, command: &Command) -> Result<()> {
        if *self.connectivity.borrow() != ConnectionState::Open {
            return Err(Error::NotConnected);
        }

        let frame = command.encode()?;
        trace!(frame = %frame, "sending command");

        // The receiver lives in the session loop; it being gone means the
        // session closed between the check above and now.
        self.outbound.send(frame).map_err(|_| Error::NotConnected)
    }
}
