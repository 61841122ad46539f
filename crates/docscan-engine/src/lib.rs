//! Engine abstraction layer for the document scan orchestrator.
//!
//! This crate defines the contract with the two external capture engines
//! and ships mock implementations of both:
//!
//! - [`OpticalEngine`]: photographs the document and reports recognition
//!   results as a stream of [`CompletionEvent`](docscan_core::CompletionEvent)s.
//! - [`ChipEngine`]: reads the document's contactless chip and reports raw
//!   protocol strings, bookkeeping messages first and a JSON completion
//!   payload last.
//!
//! # Design Philosophy
//!
//! - **Async-first**: All engine operations are asynchronous using native
//!   `async fn` in traits (Rust 1.90 + Edition 2024 RPITIT).
//! - **Stream-based**: Engines report their lifecycle through an
//!   [`EngineStream`]; dropping it disposes the subscription.
//! - **Thread-safe**: All traits require `Send + Sync` for use with Tokio.
//! - **Error-aware**: All operations return `Result<T>` with [`EngineError`].
//!
//! # Example
//!
//! ```no_run
//! use docscan_engine::traits::{ChipEngine, OpticalEngine};
//! use docscan_engine::Result;
//!
//! async fn capture<O: OpticalEngine, C: ChipEngine>(optical: &mut O, chip: &mut C) -> Result<()> {
//!     let mut stream = optical.start_optical_stream().await?;
//!     while let Some(event) = stream.recv().await {
//!         println!("optical: {}", event?.action);
//!     }
//!
//!     optical.stop_optical_stream().await?;
//!     let _chip_stream = chip.start_chip_stream().await?;
//!     Ok(())
//! }
//! ```
//!
//! [`OpticalEngine`]: traits::OpticalEngine
//! [`ChipEngine`]: traits::ChipEngine

pub mod config;
pub mod devices;
pub mod error;
pub mod mock;
pub mod stream;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use config::{ReaderConfig, RfidSettings};
pub use devices::{AnyChipEngine, AnyOpticalEngine};
pub use error::{EngineError, Result};
pub use stream::{EngineStream, EngineStreamSender};
pub use traits::{ChipEngine, OpticalEngine};
pub use types::{EngineInfo, PreparationStatus, StreamKind};
