//! Enum wrappers for engine dispatch.
//!
//! Native `async fn` in traits (RPITIT, Edition 2024) are not object-safe,
//! so `Box<dyn OpticalEngine>` is not available. Callers that pick the
//! engine at runtime hold one of these enums instead; each variant forwards
//! to its concrete engine.
//!
//! # Examples
//!
//! ```
//! use docscan_engine::devices::AnyOpticalEngine;
//! use docscan_engine::mock::MockOpticalEngine;
//!
//! let (engine, _handle) = MockOpticalEngine::new();
//! let any_engine = AnyOpticalEngine::Mock(engine);
//!
//! // Can now be used polymorphically through the OpticalEngine trait
//! ```

use crate::config::{ReaderConfig, RfidSettings};
use crate::mock::{MockChipEngine, MockOpticalEngine};
use crate::stream::EngineStream;
use crate::traits::{ChipEngine, OpticalEngine};
use crate::types::{EngineInfo, PreparationStatus};
use crate::Result;
use docscan_core::{AccessCredential, CompletionEvent};

/// Enum wrapper for optical engine dispatch.
///
/// # Examples
///
/// ```
/// use docscan_engine::devices::AnyOpticalEngine;
/// use docscan_engine::traits::OpticalEngine;
/// use docscan_engine::mock::MockOpticalEngine;
///
/// #[tokio::main]
/// async fn main() -> docscan_engine::Result<()> {
///     let (engine, _handle) = MockOpticalEngine::new();
///     let any_engine = AnyOpticalEngine::Mock(engine);
///
///     let info = any_engine.get_info().await?;
///     println!("Optical engine: {}", info.name);
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyOpticalEngine {
    /// Mock engine for development and testing.
    Mock(MockOpticalEngine),
}

impl OpticalEngine for AnyOpticalEngine {
    async fn prepare_database(&mut self) -> Result<EngineStream<PreparationStatus>> {
        match self {
            Self::Mock(engine) => engine.prepare_database().await,
        }
    }

    async fn initialize(&mut self, config: &ReaderConfig) -> Result<()> {
        match self {
            Self::Mock(engine) => engine.initialize(config).await,
        }
    }

    async fn start_optical_stream(&mut self) -> Result<EngineStream<CompletionEvent>> {
        match self {
            Self::Mock(engine) => engine.start_optical_stream().await,
        }
    }

    async fn stop_optical_stream(&mut self) -> Result<()> {
        match self {
            Self::Mock(engine) => engine.stop_optical_stream().await,
        }
    }

    async fn get_info(&self) -> Result<EngineInfo> {
        match self {
            Self::Mock(engine) => engine.get_info().await,
        }
    }
}

impl From<MockOpticalEngine> for AnyOpticalEngine {
    fn from(engine: MockOpticalEngine) -> Self {
        Self::Mock(engine)
    }
}

/// Enum wrapper for chip engine dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyChipEngine {
    /// Mock engine for development and testing.
    Mock(MockChipEngine),
}

impl ChipEngine for AnyChipEngine {
    async fn apply_settings(&mut self, settings: &RfidSettings) -> Result<()> {
        match self {
            Self::Mock(engine) => engine.apply_settings(settings).await,
        }
    }

    async fn configure_scenario(&mut self, credential: &AccessCredential) -> Result<()> {
        match self {
            Self::Mock(engine) => engine.configure_scenario(credential).await,
        }
    }

    async fn start_chip_stream(&mut self) -> Result<EngineStream<String>> {
        match self {
            Self::Mock(engine) => engine.start_chip_stream().await,
        }
    }

    async fn stop_chip_stream(&mut self) -> Result<()> {
        match self {
            Self::Mock(engine) => engine.stop_chip_stream().await,
        }
    }

    async fn get_info(&self) -> Result<EngineInfo> {
        match self {
            Self::Mock(engine) => engine.get_info().await,
        }
    }
}

impl From<MockChipEngine> for AnyChipEngine {
    fn from(engine: MockChipEngine) -> Self {
        Self::Mock(engine)
    }
}
