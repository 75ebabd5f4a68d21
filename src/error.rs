//! # Errors
//!
//! $$
//! N\,w_{\min} \le 1 \le N\,w_{\max}
//! $$
//!
//! Error taxonomy shared by the statistics and optimization components.

use thiserror::Error;

/// Errors surfaced by the analysis pipeline.
///
/// Degenerate per-asset numerics (flat series, zero benchmark variance) are
/// not errors: they surface as `None` statistics on the affected asset only.
/// Optimizer non-convergence is likewise reported in-band through
/// [`crate::optimizer::OptimizationResult::converged`].
#[derive(Debug, Error)]
pub enum AnalysisError {
  /// Malformed input: non-positive prices, too-short or misaligned series,
  /// shape mismatches, unknown tickers.
  #[error("invalid input: {0}")]
  InvalidInput(String),

  /// The weight box and asset count leave no feasible region for the
  /// full-investment constraint.
  #[error(
    "infeasible constraints: {assets} assets with weight bounds [{min_weight}, {max_weight}] cannot sum to 1"
  )]
  InfeasibleConstraints {
    assets: usize,
    min_weight: f64,
    max_weight: f64,
  },

  /// The nonlinear solver could not be constructed or failed internally.
  #[error("solver error: {0}")]
  Solver(String),

  /// A tabular export could not be written.
  #[error("export failed: {0}")]
  Export(#[from] csv::Error),
}
