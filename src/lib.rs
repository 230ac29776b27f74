pub mod cycles;
pub mod error;
pub mod graph;
pub mod ilp;
pub mod indices;
pub mod johnson;
pub mod measures;
pub mod mpi;
pub mod obs;
pub mod percentile;
pub mod scc;
pub mod symmetric;

// Re-exports to flatten the crate.
pub use error::Error;
pub use measures::{
    data_rationalizable, rationality_measures, rationality_measures_symmetric,
    rationality_measures_symmetric_with, rationality_measures_with, CancelToken, SolveOptions,
};
pub use mpi::{money_pump_index, MoneyPump};
pub use obs::Observations;
pub use percentile::{percentile_score, percentile_score_with_rng, PercentileScore};
