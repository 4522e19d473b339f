mod divergence;
mod parallel_context;
mod task;

pub use divergence::{DepartureCheck, DivergenceTracker};
pub use parallel_context::ParallelCosmosContext;
pub use task::{SimulationTask, TaskSignals};
