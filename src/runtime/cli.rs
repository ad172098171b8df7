use super::{GridRuntime, RuntimeError};
use crate::events::GridEvent;
use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::mpsc;

pub struct CliRuntime {
    event_tx: RwLock<Option<mpsc::UnboundedSender<GridEvent>>>,
}

impl CliRuntime {
    pub fn new(event_tx: mpsc::UnboundedSender<GridEvent>) -> Self {
        Self {
            event_tx: RwLock::new(Some(event_tx)),
        }
    }
}

#[async_trait]
impl GridRuntime for CliRuntime {
    fn emit(&self, event: GridEvent) -> Result<(), RuntimeError> {
        // Send to channel for CLI event handler to process
        self.event_tx
            .read()
            .as_ref()
            .ok_or(RuntimeError::ReceiverClosed)?
            .send(event)
            .map_err(|_| RuntimeError::ReceiverClosed)?;
        Ok(())
    }

    fn is_interactive(&self) -> bool {
        atty::is(atty::Stream::Stdin)
    }

    async fn shutdown(&self) -> Result<(), RuntimeError> {
        // Dropping the sender ends the output loop once the queue drains
        self.event_tx.write().take();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_emit_after_shutdown_fails() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let runtime = CliRuntime::new(tx);

        runtime.emit(GridEvent::BusyChanged { busy: true }).unwrap();
        runtime.shutdown().await.unwrap();

        assert!(matches!(
            runtime.emit(GridEvent::BusyChanged { busy: false }),
            Err(RuntimeError::ReceiverClosed)
        ));
        assert_eq!(rx.recv().await, Some(GridEvent::BusyChanged { busy: true }));
        assert_eq!(rx.recv().await, None);
    }
}
