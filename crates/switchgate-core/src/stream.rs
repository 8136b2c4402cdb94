// ABOUTME: Sentinel-terminated streaming accessor used by the switch engine to hand out live entries.
// ABOUTME: End of stream is an explicit None marker, so a producer may keep its side open after finishing.

use std::sync::Arc;

use tokio::sync::mpsc;

/// Producer half of an entry stream, held by the switch engine.
pub struct EntrySink<T> {
    tx: mpsc::Sender<Option<Arc<T>>>,
}

impl<T> Clone for EntrySink<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> EntrySink<T> {
    /// Send one live entry. Returns false once the consumer has dropped its stream;
    /// the producer should stop iterating at that point.
    pub async fn send(&self, entry: Arc<T>) -> bool {
        self.tx.send(Some(entry)).await.is_ok()
    }

    /// Emit the end-of-stream sentinel. The sink itself stays usable so a long-lived
    /// producer does not have to close its side.
    pub async fn finish(&self) -> bool {
        self.tx.send(None).await.is_ok()
    }
}

/// Consumer half: a lazy, finite sequence of live entry references.
pub struct EntryStream<T> {
    rx: mpsc::Receiver<Option<Arc<T>>>,
    done: bool,
}

/// Create a bounded sink/stream pair.
pub fn channel<T>(capacity: usize) -> (EntrySink<T>, EntryStream<T>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (EntrySink { tx }, EntryStream { rx, done: false })
}

impl<T> EntryStream<T> {
    /// A stream that is already at its sentinel.
    pub fn empty() -> Self {
        Self::from_entries(Vec::new())
    }

    /// Build a stream over entries already gathered by the producer, followed by the
    /// sentinel. The channel is sized to hold everything, so nothing blocks or spawns.
    pub fn from_entries(entries: Vec<Arc<T>>) -> Self {
        let (tx, rx) = mpsc::channel(entries.len() + 1);
        for entry in entries {
            // Capacity covers every entry plus the sentinel.
            let _ = tx.try_send(Some(entry));
        }
        let _ = tx.try_send(None);
        Self { rx, done: false }
    }

    /// Next live entry, or None at the sentinel. Once the sentinel has been seen the
    /// channel is never polled again.
    pub async fn next(&mut self) -> Option<Arc<T>> {
        if self.done {
            return None;
        }
        match self.rx.recv().await {
            Some(Some(entry)) => Some(entry),
            Some(None) => {
                self.done = true;
                None
            }
            None => {
                tracing::debug!("entry stream producer hung up without a sentinel");
                self.done = true;
                None
            }
        }
    }
}
