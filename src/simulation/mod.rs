//! Game session driver and parallel runner.

pub mod engine;
pub mod runner;

pub use engine::GameSession;
pub use runner::{run_session, run_sessions_parallel, BatchConfig};
