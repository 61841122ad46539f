//! Scan session orchestration for two-phase document capture.
//!
//! A scan starts with an optical capture. When the user asked for a chip
//! read, the first complete (or multi-page) optical result is used to derive
//! the chip access credential, the optical capture is stopped and the chip
//! read starts. The chip stream's completion payload is then handled like an
//! optical result, with a guard that keeps it from starting the chip read
//! again.
//!
//! - [`state_machine`]: the pure transition function and [`SessionMachine`]
//! - [`orchestrator`]: [`ScanOrchestrator`], which runs the machine against
//!   real or mock engines
//! - [`presenter`]: where outcomes and progress are reported

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod presenter;
pub mod state_machine;

pub use config::{CredentialPolicy, SessionConfig};
pub use error::{Result, SessionError};
pub use orchestrator::ScanOrchestrator;
pub use presenter::{ChannelPresenter, PresenterEvent, ResultPresenter, TracingPresenter};
pub use state_machine::{
    Effect, PhaseTransition, ScanPhase, SessionInput, SessionMachine, SessionMachineBuilder,
    SessionState, SessionSummary, Transition, transition,
};
