//! Python bindings. Configs and results cross the boundary as JSON.

use pyo3::exceptions::PyRuntimeError;
use pyo3::prelude::*;

use crate::simulation::runner::{run_session, run_sessions_parallel, BatchConfig};
use crate::types::config::SimulationConfig;

fn to_py_err(e: impl std::fmt::Display) -> PyErr {
    PyErr::new::<PyRuntimeError, _>(e.to_string())
}

/// Default game config as JSON.
#[pyfunction]
fn default_config_json() -> PyResult<String> {
    serde_json::to_string_pretty(&SimulationConfig::default()).map_err(to_py_err)
}

/// Run one game to the end and return its result as JSON.
#[pyfunction]
fn run_single(config_json: &str) -> PyResult<String> {
    let config = SimulationConfig::from_json(config_json).map_err(to_py_err)?;
    let result = run_session(config).map_err(to_py_err)?;
    serde_json::to_string(&result).map_err(to_py_err)
}

/// Run one game per seed in parallel.
///
/// # Arguments
/// * `config_json` - Base config shared by every game
/// * `seeds` - One seed per game
/// * `n_workers` - Number of parallel workers (0 = auto-detect)
#[pyfunction]
#[pyo3(signature = (config_json, seeds, n_workers = 0))]
fn run_batch(config_json: &str, seeds: Vec<u64>, n_workers: usize) -> PyResult<String> {
    let base = SimulationConfig::from_json(config_json).map_err(to_py_err)?;
    let batch_config = BatchConfig {
        configs: seeds.into_iter().map(|s| base.clone().with_seed(s)).collect(),
        n_workers: if n_workers == 0 { None } else { Some(n_workers) },
    };

    let batch = run_sessions_parallel(batch_config).map_err(to_py_err)?;
    serde_json::to_string(&batch).map_err(to_py_err)
}

/// Python module definition
#[pymodule]
fn odyssey_sim(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(default_config_json, m)?)?;
    m.add_function(wrap_pyfunction!(run_single, m)?)?;
    m.add_function(wrap_pyfunction!(run_batch, m)?)?;
    Ok(())
}
