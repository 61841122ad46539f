//! Engine event streams.
//!
//! Engines deliver their lifecycle as a bounded channel of `Result<T>`
//! items: `Ok` for each event, `Err` for a stream error. Dropping an
//! [`EngineStream`] disposes the subscription, so events an engine emits
//! after that point are discarded.

use crate::error::{EngineError, Result};
use std::fmt;
use tokio::sync::mpsc;

/// Default channel capacity for engine streams.
pub const DEFAULT_STREAM_CAPACITY: usize = 64;

/// Receiving half of an engine event stream.
pub struct EngineStream<T> {
    rx: mpsc::Receiver<Result<T>>,
    name: &'static str,
}

impl<T> EngineStream<T> {
    /// Create a connected sender/stream pair.
    ///
    /// # Examples
    ///
    /// ```
    /// use docscan_engine::stream::EngineStream;
    ///
    /// #[tokio::main(flavor = "current_thread")]
    /// async fn main() -> docscan_engine::Result<()> {
    ///     let (tx, mut stream) = EngineStream::<String>::channel("chip", 8);
    ///
    ///     tx.send("rfidNotificationCompletionEvent".to_string()).await?;
    ///     drop(tx);
    ///
    ///     assert!(stream.recv().await.is_some());
    ///     assert!(stream.recv().await.is_none());
    ///     Ok(())
    /// }
    /// ```
    pub fn channel(name: &'static str, capacity: usize) -> (EngineStreamSender<T>, Self) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (EngineStreamSender { tx, name }, Self { rx, name })
    }

    /// Receive the next item.
    ///
    /// Returns `None` once every sender is gone and the buffer is drained.
    pub async fn recv(&mut self) -> Option<Result<T>> {
        self.rx.recv().await
    }

    /// Stop accepting new items; buffered items can still be received.
    pub fn close(&mut self) {
        self.rx.close();
    }

    /// Stream name used in logs and errors.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> fmt::Debug for EngineStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineStream")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Sending half of an engine event stream, held by the engine.
pub struct EngineStreamSender<T> {
    tx: mpsc::Sender<Result<T>>,
    name: &'static str,
}

impl<T> EngineStreamSender<T> {
    /// Deliver an event.
    ///
    /// # Errors
    /// Returns `EngineError::StreamClosed` if the subscriber is gone.
    pub async fn send(&self, item: T) -> Result<()> {
        self.deliver(Ok(item)).await
    }

    /// Deliver a stream error.
    ///
    /// # Errors
    /// Returns `EngineError::StreamClosed` if the subscriber is gone.
    pub async fn fail(&self, error: EngineError) -> Result<()> {
        self.deliver(Err(error)).await
    }

    /// Deliver an item without waiting for buffer space.
    ///
    /// # Errors
    /// Returns `EngineError::StreamClosed` if the subscriber is gone or the
    /// buffer is full.
    pub fn try_deliver(&self, item: Result<T>) -> Result<()> {
        self.tx
            .try_send(item)
            .map_err(|_| EngineError::stream_closed(self.name))
    }

    /// Check whether the subscriber has gone away.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    async fn deliver(&self, item: Result<T>) -> Result<()> {
        self.tx
            .send(item)
            .await
            .map_err(|_| EngineError::stream_closed(self.name))
    }
}

impl<T> Clone for EngineStreamSender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            name: self.name,
        }
    }
}

impl<T> fmt::Debug for EngineStreamSender<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineStreamSender")
            .field("name", &self.name)
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stream_delivers_in_order() {
        let (tx, mut stream) = EngineStream::channel("optical", 4);

        tx.send(1).await.unwrap();
        tx.send(2).await.unwrap();
        tx.fail(EngineError::scan_failed("boom")).await.unwrap();
        drop(tx);

        assert_eq!(stream.recv().await.unwrap().unwrap(), 1);
        assert_eq!(stream.recv().await.unwrap().unwrap(), 2);
        assert!(stream.recv().await.unwrap().is_err());
        assert!(stream.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_send_after_drop_fails() {
        let (tx, stream) = EngineStream::<u8>::channel("chip", 4);
        drop(stream);

        assert!(tx.is_closed());
        let error = tx.send(1).await.unwrap_err();
        assert!(matches!(error, EngineError::StreamClosed { .. }));
    }

    #[tokio::test]
    async fn test_close_rejects_new_items() {
        let (tx, mut stream) = EngineStream::channel("chip", 4);
        tx.send("kept").await.unwrap();

        stream.close();

        assert!(tx.send("dropped").await.is_err());
        assert_eq!(stream.recv().await.unwrap().unwrap(), "kept");
        assert!(stream.recv().await.is_none());
    }

    #[test]
    fn test_try_deliver_full_buffer() {
        let (tx, _stream) = EngineStream::channel("optical", 1);
        tx.try_deliver(Ok(1)).unwrap();
        assert!(tx.try_deliver(Ok(2)).is_err());
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let (tx, _stream) = EngineStream::channel("optical", 0);
        assert!(tx.try_deliver(Ok(1)).is_ok());
    }
}
