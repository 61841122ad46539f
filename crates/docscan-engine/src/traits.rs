//! Engine trait definitions.
//!
//! These traits are the contract between the scan session and the two
//! external capture engines. The optical engine photographs and reads the
//! document; the chip engine talks to the document's contactless chip. The
//! engines are mutually exclusive on the underlying hardware, so a caller
//! must stop one stream before starting the other.
//!
//! All traits use native `async fn` methods (Rust 1.90 + Edition 2024 RPITIT),
//! eliminating the need for the `async_trait` macro.

#![allow(async_fn_in_trait)]

use crate::config::{ReaderConfig, RfidSettings};
use crate::error::Result;
use crate::stream::EngineStream;
use crate::types::{EngineInfo, PreparationStatus};
use docscan_core::{AccessCredential, CompletionEvent};

/// Optical document capture engine.
///
/// # Object Safety and Dynamic Dispatch
///
/// **NOTE**: This trait is NOT object-safe because `async fn` methods return
/// `impl Future`. Use generic type parameters, or the enum wrapper from the
/// [`devices`](crate::devices) module when the concrete engine is chosen at
/// runtime.
///
/// # Examples
///
/// ```no_run
/// use docscan_engine::traits::OpticalEngine;
/// use docscan_engine::Result;
///
/// async fn first_event<O: OpticalEngine>(engine: &mut O) -> Result<()> {
///     let mut stream = engine.start_optical_stream().await?;
///     if let Some(event) = stream.recv().await {
///         println!("action: {}", event?.action);
///     }
///     engine.stop_optical_stream().await
/// }
/// ```
pub trait OpticalEngine: Send + Sync {
    /// Start preparing the document database.
    ///
    /// The returned stream yields progress statuses and ends with
    /// [`PreparationStatus::Prepared`].
    ///
    /// # Errors
    ///
    /// Returns an error if preparation cannot be started.
    async fn prepare_database(&mut self) -> Result<EngineStream<PreparationStatus>>;

    /// Initialize the engine with its configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine rejects the configuration or its
    /// license.
    async fn initialize(&mut self, config: &ReaderConfig) -> Result<()>;

    /// Start an optical capture and subscribe to its completion events.
    ///
    /// # Errors
    ///
    /// Returns an error if the capture cannot be started.
    async fn start_optical_stream(&mut self) -> Result<EngineStream<CompletionEvent>>;

    /// Stop the running optical capture.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine fails to acknowledge the stop.
    async fn stop_optical_stream(&mut self) -> Result<()>;

    /// Get engine information.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot be queried.
    async fn get_info(&self) -> Result<EngineInfo>;
}

/// Contactless chip reading engine.
///
/// The chip stream carries raw protocol strings: bookkeeping messages and,
/// eventually, the JSON completion payload.
pub trait ChipEngine: Send + Sync {
    /// Apply the base chip reading scenario.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine rejects the settings.
    async fn apply_settings(&mut self, settings: &RfidSettings) -> Result<()>;

    /// Configure the access credential for the next chip session.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine rejects the scenario.
    async fn configure_scenario(&mut self, credential: &AccessCredential) -> Result<()>;

    /// Start a chip read and subscribe to its raw message stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the read cannot be started.
    async fn start_chip_stream(&mut self) -> Result<EngineStream<String>>;

    /// Stop the running chip read.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine fails to acknowledge the stop.
    async fn stop_chip_stream(&mut self) -> Result<()>;

    /// Get engine information.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot be queried.
    async fn get_info(&self) -> Result<EngineInfo>;
}
