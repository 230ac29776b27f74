use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Rejected at entry: wrong shapes, non-positive prices, negative
    /// quantities, zero income at some period, or a bad alpha vector.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The integer-program oracle did not return an optimal solution.
    #[error("integer program failed: {0}")]
    IlpFailure(String),

    /// A cycle-cover loop exceeded its iteration cap. Diagnostic; should
    /// not happen with a correct oracle.
    #[error("cycle cover did not converge within {0} iterations")]
    NonConvergence(usize),

    /// The caller cancelled the computation.
    #[error("cancelled")]
    Cancelled,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
