//! The client session: one connection, one delta stream, one store.
//!
//! A [`Session`] owns the full synchronization pipeline on a single tokio
//! task:
//!
//! ```text
//! WebSocket ──► EventNormalizer ──► PeripheralStore ──► broadcast
//!    ▲                                                  (subscribers)
//!    └── CommandGateway ◄── user intents
//! ```
//!
//! Exactly one inbound frame is in flight at a time: the loop normalizes a
//! frame, applies its deltas to the store and publishes them to
//! subscribers before reading the next frame. Subscribers therefore
//! observe deltas in arrival order; a subscriber that lags beyond the
//! channel capacity loses the oldest deltas and repaints from the store
//! snapshot (display is best-effort by design).
//!
//! The session reconnects forever on a fixed interval until
//! [`Session::close`] is called or reconnection is disabled in the config.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use boardsync_core::constants::DELTA_CHANNEL_CAPACITY;
use boardsync_protocol::{EventNormalizer, HardwareDelta};
use boardsync_store::PeripheralStore;
use futures::{SinkExt, StreamExt};
use tokio::sync::{Mutex, broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, info, trace, warn};

use crate::activity::ActivityTimers;
use crate::connection::{ClientConfig, ConnectionState};
use crate::gateway::CommandGateway;

/// A live synchronization session against the execution engine.
///
/// Constructing a session spawns its event loop; dropping it aborts the
/// loop. Prefer [`Session::close`] for an orderly shutdown (it cancels the
/// reconnect cycle and pending activity timers, and closes the socket).
///
/// # Examples
///
/// ```no_run
/// use boardsync_client::{ClientConfig, ConnectionState, Session};
/// use boardsync_protocol::HardwareDelta;
///
/// #[tokio::main]
/// async fn main() -> boardsync_core::Result<()> {
///     let session = Session::connect(ClientConfig::for_host("localhost")?);
///     let mut deltas = session.subscribe_deltas();
///
///     while let Ok(delta) = deltas.recv().await {
///         if let HardwareDelta::ConsoleLine { text, .. } = delta {
///             println!("{text}");
///         }
///     }
///
///     session.close().await;
///     Ok(())
/// }
/// ```
pub struct Session {
    store: Arc<Mutex<PeripheralStore>>,
    delta_tx: broadcast::Sender<HardwareDelta>,
    connectivity: watch::Receiver<ConnectionState>,
    outbound_tx: mpsc::UnboundedSender<String>,
    shutdown_tx: watch::Sender<bool>,
    reconnect_attempts: Arc<AtomicU64>,
    task: Option<JoinHandle<()>>,
}

impl Session {
    /// Start a session. Must be called within a tokio runtime.
    ///
    /// The connection attempt happens on the spawned loop; observe
    /// [`Session::connectivity`] to learn when the link opens.
    #[must_use]
    pub fn connect(config: ClientConfig) -> Self {
        let store = Arc::new(Mutex::new(PeripheralStore::with_standard_devices()));
        let (delta_tx, _) = broadcast::channel(DELTA_CHANNEL_CAPACITY);
        let (conn_tx, connectivity) = watch::channel(ConnectionState::Idle);
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let reconnect_attempts = Arc::new(AtomicU64::new(0));

        let task = tokio::spawn(run(
            config,
            Arc::clone(&store),
            delta_tx.clone(),
            conn_tx,
            outbound_rx,
            shutdown_rx,
            Arc::clone(&reconnect_attempts),
        ));

        Self {
            store,
            delta_tx,
            connectivity,
            outbound_tx,
            shutdown_tx,
            reconnect_attempts,
            task: Some(task),
        }
    }

    /// Subscribe to the ordered delta stream.
    ///
    /// Every subscriber sees deltas in arrival order. A subscriber that
    /// falls behind the channel capacity receives a lag error and should
    /// repaint from [`Session::store`].
    #[must_use]
    pub fn subscribe_deltas(&self) -> broadcast::Receiver<HardwareDelta> {
        self.delta_tx.subscribe()
    }

    /// Watch connection lifecycle changes.
    #[must_use]
    pub fn connectivity(&self) -> watch::Receiver<ConnectionState> {
        self.connectivity.clone()
    }

    /// Current connection state.
    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        *self.connectivity.borrow()
    }

    /// Shared handle to the peripheral store.
    ///
    /// Lock it briefly to snapshot state for rendering; the session loop
    /// takes the same lock per frame.
    #[must_use]
    pub fn store(&self) -> Arc<Mutex<PeripheralStore>> {
        Arc::clone(&self.store)
    }

    /// A gateway for sending commands over this session's connection.
    #[must_use]
    pub fn gateway(&self) -> CommandGateway {
        CommandGateway::new(self.connectivity.clone(), self.outbound_tx.clone())
    }

    /// How many connection attempts this session has made.
    #[must_use]
    pub fn reconnect_attempts(&self) -> u64 {
        self.reconnect_attempts.load(Ordering::Relaxed)
    }

    /// Close the session: disable reconnection, cancel pending activity
    /// timers, close the socket and wait for the loop to finish.
    pub async fn close(mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            debug!("session dropped without close(), aborting loop");
            task.abort();
        }
    }
}

/// The session event loop: dial, pump frames, back off, repeat.
async fn run(
    config: ClientConfig,
    store: Arc<Mutex<PeripheralStore>>,
    delta_tx: broadcast::Sender<HardwareDelta>,
    conn_tx: watch::Sender<ConnectionState>,
    mut outbound_rx: mpsc::UnboundedReceiver<String>,
    mut shutdown_rx: watch::Receiver<bool>,
    attempts: Arc<AtomicU64>,
) {
    let normalizer = EventNormalizer::new();
    let mut timers = ActivityTimers::new(config.activity_window);

    loop {
        conn_tx.send_replace(ConnectionState::Connecting);
        let attempt = attempts.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(endpoint = %config.endpoint, attempt, "dialing engine");

        let dial = connect_async(config.endpoint.as_str());
        tokio::pin!(dial);
        let connected = loop {
            tokio::select! {
                result = &mut dial => break result,
                Some(device) = timers.expired() => {
                    clear_activity(device, &store, &delta_tx).await;
                }
                _ = shutdown_rx.changed() => {
                    timers.cancel_all();
                    conn_tx.send_replace(ConnectionState::Closed);
                    return;
                }
            }
        };

        match connected {
            Ok((ws, _response)) => {
                info!(endpoint = %config.endpoint, "connected to engine");
                conn_tx.send_replace(ConnectionState::Open);

                let (mut sink, mut stream) = ws.split();

                loop {
                    tokio::select! {
                        inbound = stream.next() => match inbound {
                            Some(Ok(WsMessage::Text(frame))) => {
                                process_frame(&frame, &normalizer, &store, &delta_tx, &mut timers)
                                    .await;
                            }
                            Some(Ok(WsMessage::Close(_))) | None => {
                                info!("engine closed the connection");
                                break;
                            }
                            Some(Ok(_)) => {
                                // Binary/ping/pong carry no payload for us.
                                trace!("ignoring non-text frame");
                            }
                            Some(Err(e)) => {
                                warn!(error = %e, "transport error, dropping connection");
                                break;
                            }
                        },
                        Some(frame) = outbound_rx.recv() => {
                            if let Err(e) = sink.send(WsMessage::Text(frame)).await {
                                warn!(error = %e, "command send failed, dropping connection");
                                break;
                            }
                        },
                        Some(device) = timers.expired() => {
                            clear_activity(device, &store, &delta_tx).await;
                        },
                        _ = shutdown_rx.changed() => {
                            debug!("closing session");
                            let _ = sink.send(WsMessage::Close(None)).await;
                            timers.cancel_all();
                            conn_tx.send_replace(ConnectionState::Closed);
                            return;
                        },
                    }
                }
            }
            Err(e) => {
                warn!(endpoint = %config.endpoint, error = %e, "connection failed");
            }
        }

        conn_tx.send_replace(ConnectionState::Closed);

        // Commands accepted in the window between link loss and the state
        // flip are dropped, never replayed into the next connection.
        while outbound_rx.try_recv().is_ok() {}

        if !config.reconnect {
            debug!("reconnection disabled, session loop ending");
            break;
        }

        let backoff = tokio::time::sleep(config.reconnect_interval);
        tokio::pin!(backoff);
        loop {
            tokio::select! {
                _ = &mut backoff => break,
                Some(device) = timers.expired() => {
                    clear_activity(device, &store, &delta_tx).await;
                }
                _ = shutdown_rx.changed() => {
                    timers.cancel_all();
                    return;
                }
            }
        }
    }

    timers.cancel_all();
}

/// Fully process one inbound text frame: normalize, apply, publish.
///
/// Runs to completion before the loop reads the next frame, which is what
/// gives subscribers ordered, store-consistent delivery.
async fn process_frame(
    frame: &str,
    normalizer: &EventNormalizer,
    store: &Arc<Mutex<PeripheralStore>>,
    delta_tx: &broadcast::Sender<HardwareDelta>,
    timers: &mut ActivityTimers,
) {
    trace!(frame = %frame, "inbound frame");
    let deltas = normalizer.normalize_frame(frame);

    let mut store = store.lock().await;
    for delta in deltas {
        if let HardwareDelta::ConsoleLine {
            severity: boardsync_core::Severity::Warning,
            text,
        } = &delta
        {
            warn!(text = %text, "frame degraded to warning line");
        }
        if let HardwareDelta::BusActivity {
            device,
            active: true,
        } = &delta
        {
            // Restart, never duplicate: a fresh pulse supersedes the
            // pending clear for this device.
            timers.restart(*device);
        }
        store.apply(&delta);
        // No subscribers (or lagging ones) is fine.
        let _ = delta_tx.send(delta);
    }
}

/// Apply and publish the timer-driven activity clear for one device.
async fn clear_activity(
    device: boardsync_core::BusDeviceId,
    store: &Arc<Mutex<PeripheralStore>>,
    delta_tx: &broadcast::Sender<HardwareDelta>,
) {
    let delta = HardwareDelta::BusActivity {
        device,
        active: false,
    };
    store.lock().await.apply(&delta);
    let _ = delta_tx.send(delta);
}
