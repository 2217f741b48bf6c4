use std::time::Duration;
use tokio::sync::oneshot::{self, Receiver, Sender};
use tracing::debug;

/// How long to wait for a background component to acknowledge shutdown
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// How a component should stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownType {
    /// Stop taking new work, finish what is queued or running
    Graceful,
    /// Stop taking new work, cancel what is queued or running
    Force,
}

/// Delivered to a component when it should stop. Dropping `ack` (or sending
/// on it) tells the controller the component is done.
#[derive(Debug)]
pub struct ShutdownSignal {
    pub shutdown_type: ShutdownType,
    pub ack: Option<Sender<()>>,
}

impl ShutdownSignal {
    pub fn acknowledge(mut self) {
        if let Some(ack) = self.ack.take() {
            let _ = ack.send(());
        }
    }
}

/// Broadcasts a one-shot shutdown to every subscribed component and waits
/// for each of them to acknowledge.
#[derive(Debug, Default)]
pub struct ShutdownController {
    subscribers: Vec<Sender<ShutdownSignal>>,
}

impl ShutdownController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> ShutdownReceiver {
        let (sender, receiver) = oneshot::channel();
        self.subscribers.push(sender);
        ShutdownReceiver { receiver }
    }

    /// Signal all subscribers and wait, bounded by `DEFAULT_SHUTDOWN_TIMEOUT`
    /// per subscriber, for their acknowledgements.
    pub async fn signal_shutdown(self, shutdown_type: ShutdownType) {
        debug!("Signaling {:?} shutdown to {} subscribers", shutdown_type, self.subscribers.len());
        let mut pending = Vec::new();
        for subscriber in self.subscribers {
            let (ack, acked) = oneshot::channel();
            match subscriber.send(ShutdownSignal {
                shutdown_type,
                ack: Some(ack),
            }) {
                Ok(()) => pending.push(acked),
                Err(_) => debug!("Shutdown subscriber already gone"),
            }
        }

        for acked in pending {
            if tokio::time::timeout(DEFAULT_SHUTDOWN_TIMEOUT, acked)
                .await
                .is_err()
            {
                debug!("Timed out waiting for shutdown acknowledgement");
            }
        }
    }
}

/// Receiving end held by a background component.
#[derive(Debug)]
pub struct ShutdownReceiver {
    receiver: Receiver<ShutdownSignal>,
}

impl ShutdownReceiver {
    /// Wait for the shutdown signal. A dropped controller counts as a
    /// graceful shutdown.
    pub async fn wait_for_shutdown(self) -> ShutdownSignal {
        match self.receiver.await {
            Ok(signal) => {
                debug!("Received {:?} shutdown signal", signal.shutdown_type);
                signal
            }
            Err(_) => {
                debug!("Shutdown controller dropped, shutting down gracefully");
                ShutdownSignal {
                    shutdown_type: ShutdownType::Graceful,
                    ack: None,
                }
            }
        }
    }
}
