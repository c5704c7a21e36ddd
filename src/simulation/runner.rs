//! Parallel session runner using rayon.

use rayon::prelude::*;
use tracing::info;

use crate::error::{Result, SimulationError};
use crate::simulation::engine::GameSession;
use crate::types::config::SimulationConfig;
use crate::types::result::{BatchSimulationResult, SessionResult};

/// Configuration for a batch of sessions.
#[derive(Debug, Clone, Default)]
pub struct BatchConfig {
    /// List of session configs (one per session)
    pub configs: Vec<SimulationConfig>,
    /// Number of parallel workers (None = auto-detect)
    pub n_workers: Option<usize>,
}

/// Run every config to the end, in parallel.
///
/// Sessions are independent and seeded from their own config, so the result
/// does not depend on the number of workers.
pub fn run_sessions_parallel(batch_config: BatchConfig) -> Result<BatchSimulationResult> {
    let n_workers = batch_config
        .n_workers
        .unwrap_or_else(|| rayon::current_num_threads().min(8));

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(n_workers)
        .build()
        .map_err(|e| SimulationError::config(format!("Failed to create thread pool: {}", e)))?;

    let n_sessions = batch_config.configs.len();
    let results: Result<Vec<SessionResult>> = pool.install(|| {
        batch_config
            .configs
            .into_par_iter()
            .map(run_session)
            .collect()
    });
    let results = results?;

    info!(n_sessions, n_workers, "batch complete");
    Ok(BatchSimulationResult { results })
}

/// Run one session to the end (non-parallel).
pub fn run_session(config: SimulationConfig) -> Result<SessionResult> {
    let mut session = GameSession::new(config)?;
    session.run_to_end()?;
    session.result()
}
