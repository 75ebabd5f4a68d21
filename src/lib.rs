//! # frontier-rs
//!
//! Risk-adjusted portfolio statistics and mean-variance optimal allocation
//! with per-asset weight bounds, plus Monte Carlo sampling of random
//! portfolios for efficient-frontier visualization.
//!
//! ## Modules
//!
//! | Module        | Description                                                              |
//! |---------------|--------------------------------------------------------------------------|
//! | [`returns`]   | Validated price/return matrices and log-return conversion.               |
//! | [`stats`]     | Annualized per-asset measures, Sharpe/Sortino rankings, covariance.      |
//! | [`optimizer`] | Constrained max-Sharpe weight optimization over the bounded simplex.     |
//! | [`frontier`]  | Seeded, parallel Monte Carlo sampling of simplex portfolios.             |
//! | [`engine`]    | Configuration carrier and end-to-end orchestration.                      |
//! | [`report`]    | CSV and pretty-table exports for reporting collaborators.                |
//! | [`error`]     | Error taxonomy.                                                          |
//!
//! ## Example Usage
//!
//! ```rust
//! use frontier_rs::{AnalysisConfig, AnalysisEngine, PriceMatrix};
//!
//! let prices = PriceMatrix::new(dates, tickers, closes)?;
//! let engine = AnalysisEngine::new(AnalysisConfig::default());
//! let outcome = engine.run(&prices, None)?;
//! println!("{:?}", outcome.optimization.weights);
//! ```
//!
//! ## Parallelism
//!
//! The frontier sampler partitions draws across `rayon` workers with one RNG
//! stream per partition, so results are bit-reproducible for a fixed seed
//! regardless of thread scheduling. Everything else is single-threaded,
//! synchronous, CPU-bound numerical work with no shared mutable state.

pub mod engine;
pub mod error;
pub mod frontier;
pub mod optimizer;
pub mod report;
pub mod returns;
pub mod stats;

pub use engine::AnalysisConfig;
pub use engine::AnalysisEngine;
pub use engine::AnalysisOutcome;
pub use error::AnalysisError;
pub use frontier::sample_frontier;
pub use frontier::FrontierSample;
pub use optimizer::optimize;
pub use optimizer::portfolio_performance;
pub use optimizer::OptimizationResult;
pub use optimizer::OptimizerConfig;
pub use report::covariance_csv;
pub use report::optimization_table;
pub use report::statistics_csv;
pub use report::statistics_table;
pub use returns::PriceMatrix;
pub use returns::ReturnMatrix;
pub use stats::annualized_mean_returns;
pub use stats::asset_statistics;
pub use stats::covariance_matrix;
pub use stats::rank_by_sharpe;
pub use stats::rank_by_sortino;
pub use stats::ranking_order;
pub use stats::top_by_sharpe;
pub use stats::AssetStatistics;
