//! Per-device bus-activity pulse timers.
//!
//! A bus device's activity indicator is level-triggered: any traffic turns
//! it on, and it turns itself off after a fixed display window. The clear
//! is an explicit cancellable action keyed by device identity — restarting
//! the window for a device always supersedes its pending clear, so a burst
//! of traffic produces exactly one clear, never a stack of competing
//! timers.
//!
//! Supersession is enforced with a per-device generation counter: each
//! scheduled clear carries the generation it was armed under, and an
//! expiry whose generation is no longer current is discarded. Aborting the
//! replaced task is an optimization; the generation check is the
//! correctness guarantee (an aborted task may already have queued its
//! expiry).

use std::collections::HashMap;
use std::time::Duration;

use boardsync_core::BusDeviceId;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub(crate) struct ActivityTimers {
    window: Duration,
    generations: HashMap<BusDeviceId, u64>,
    handles: HashMap<BusDeviceId, JoinHandle<()>>,
    expiry_tx: mpsc::UnboundedSender<(BusDeviceId, u64)>,
    expiry_rx: mpsc::UnboundedReceiver<(BusDeviceId, u64)>,
}

impl ActivityTimers {
    pub(crate) fn new(window: Duration) -> Self {
        let (expiry_tx, expiry_rx) = mpsc::unbounded_channel();
        Self {
            window,
            generations: HashMap::new(),
            handles: HashMap::new(),
            expiry_tx,
            expiry_rx,
        }
    }

    /// Arm (or re-arm) the clear timer for one device.
    pub(crate) fn restart(&mut self, device: BusDeviceId) {
        let generation = {
            let entry = self.generations.entry(device).or_insert(0);
            *entry += 1;
            *entry
        };

        let tx = self.expiry_tx.clone();
        let window = self.window;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            // Receiver gone means the session is shutting down.
            let _ = tx.send((device, generation));
        });

        if let Some(previous) = self.handles.insert(device, handle) {
            previous.abort();
        }
    }

    /// Wait for the next device whose window elapsed.
    ///
    /// Stale expiries (superseded by a later [`restart`](Self::restart))
    /// are filtered out here. Cancel-safe: this is a plain channel `recv`
    /// in a loop, suitable for `tokio::select!`.
    pub(crate) async fn expired(&mut self) -> Option<BusDeviceId> {
        loop {
            let (device, generation) = self.expiry_rx.recv().await?;
            if self.generations.get(&device) == Some(&generation) {
                self.handles.remove(&device);
                return Some(device);
            }
        }
    }

    /// Abort every pending clear. Used on session shutdown.
    pub(crate) fn cancel_all(&mut self) {
        // Invalidate any expiry already queued; generations stay monotonic
        // so a later restart can never collide with a cancelled one.
        for generation in self.generations.values_mut() {
            *generation += 1;
        }
        for (_, handle) in self.handles.drain() {
            handle.abort();
        }
    }
}
