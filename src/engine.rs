//! # Analysis Engine
//!
//! $$
//! \mathbf w^\* = \operatorname{Optimize}(\mu, \Sigma, r_f)
//! $$
//!
//! Configuration carrier and high-level orchestration over return
//! calculation, asset statistics, weight optimization and frontier sampling.
//! All tunables travel in [`AnalysisConfig`], so several analyses with
//! different horizons or rate assumptions can run side by side.

use ndarray::Array1;
use ndarray::Array2;
use tracing::debug;
use tracing::warn;

use crate::error::AnalysisError;
use crate::frontier::sample_frontier;
use crate::frontier::FrontierSample;
use crate::optimizer::optimize;
use crate::optimizer::OptimizationResult;
use crate::optimizer::OptimizerConfig;
use crate::returns::PriceMatrix;
use crate::returns::ReturnMatrix;
use crate::stats::annualized_mean_returns;
use crate::stats::asset_statistics;
use crate::stats::covariance_matrix;
use crate::stats::top_by_sharpe;
use crate::stats::AssetStatistics;

/// Runtime configuration for [`AnalysisEngine`].
#[derive(Clone, Debug)]
pub struct AnalysisConfig {
  /// Annualized risk-free rate used in every excess-return numerator.
  pub risk_free_rate: f64,
  /// Trading days per year used for annualization.
  pub trading_days_per_year: usize,
  /// Per-asset weight floor for the optimizer.
  pub min_weight: f64,
  /// Per-asset weight cap for the optimizer.
  pub max_weight: f64,
  /// Number of assets kept by [`AnalysisEngine::top_assets`].
  pub top_k: usize,
  /// Number of Monte Carlo draws for the frontier cloud.
  pub num_frontier_samples: usize,
  /// Seed for reproducible sampling; `None` draws one from entropy.
  pub random_seed: Option<u64>,
  /// Iteration budget for the weight optimizer.
  pub max_iters: u64,
}

impl Default for AnalysisConfig {
  fn default() -> Self {
    Self {
      risk_free_rate: 0.03678,
      trading_days_per_year: 252,
      min_weight: 0.10,
      max_weight: 0.40,
      top_k: 5,
      num_frontier_samples: 10_000,
      random_seed: None,
      max_iters: 5000,
    }
  }
}

/// Bundled output of a full analysis run.
#[derive(Clone, Debug)]
pub struct AnalysisOutcome {
  /// Statistics for every asset of the input universe.
  pub statistics: Vec<AssetStatistics>,
  /// Tickers selected for allocation, best Sharpe first.
  pub top_tickers: Vec<String>,
  /// Annualized mean returns of the selected subset.
  pub mean_returns: Array1<f64>,
  /// Annualized covariance matrix of the selected subset.
  pub covariance: Array2<f64>,
  /// Constrained max-Sharpe allocation over the subset.
  pub optimization: OptimizationResult,
  /// Random portfolio cloud over the subset.
  pub frontier: Vec<FrontierSample>,
}

/// Single entry-point engine for the statistics and optimization workflow.
#[derive(Clone, Debug)]
pub struct AnalysisEngine {
  config: AnalysisConfig,
}

impl AnalysisEngine {
  /// Construct a new engine with explicit configuration.
  pub fn new(config: AnalysisConfig) -> Self {
    Self { config }
  }

  /// Borrow engine configuration.
  pub fn config(&self) -> &AnalysisConfig {
    &self.config
  }

  /// Convert a price history into per-period log returns.
  pub fn log_returns(&self, prices: &PriceMatrix) -> Result<ReturnMatrix, AnalysisError> {
    prices.log_returns()
  }

  /// Per-asset statistics against an optional benchmark return series.
  pub fn statistics(
    &self,
    returns: &ReturnMatrix,
    benchmark: Option<&[f64]>,
  ) -> Result<Vec<AssetStatistics>, AnalysisError> {
    debug!(
      assets = returns.tickers().len(),
      periods = returns.periods(),
      "computing asset statistics"
    );
    asset_statistics(
      returns,
      benchmark,
      self.config.risk_free_rate,
      self.config.trading_days_per_year,
    )
  }

  /// The configured number of best-Sharpe tickers.
  pub fn top_assets(&self, stats: &[AssetStatistics]) -> Vec<String> {
    top_by_sharpe(stats, self.config.top_k)
  }

  /// Annualized mean returns per asset of `returns`.
  pub fn mean_returns(&self, returns: &ReturnMatrix) -> Array1<f64> {
    annualized_mean_returns(returns, self.config.trading_days_per_year)
  }

  /// Annualized covariance matrix of `returns`.
  pub fn covariance(&self, returns: &ReturnMatrix) -> Result<Array2<f64>, AnalysisError> {
    covariance_matrix(returns, self.config.trading_days_per_year)
  }

  /// Constrained max-Sharpe weights for the supplied subset inputs.
  pub fn optimize(
    &self,
    mu: &Array1<f64>,
    cov: &Array2<f64>,
  ) -> Result<OptimizationResult, AnalysisError> {
    let result = optimize(
      mu,
      cov,
      &OptimizerConfig {
        risk_free_rate: self.config.risk_free_rate,
        min_weight: self.config.min_weight,
        max_weight: self.config.max_weight,
        max_iters: self.config.max_iters,
      },
    )?;

    if !result.converged {
      warn!(message = %result.message, "optimizer did not converge");
    }

    Ok(result)
  }

  /// Random portfolio cloud for the supplied subset inputs.
  pub fn sample_frontier(
    &self,
    mu: &Array1<f64>,
    cov: &Array2<f64>,
  ) -> Result<Vec<FrontierSample>, AnalysisError> {
    let seed = self.config.random_seed.unwrap_or_else(rand::random);
    debug!(
      draws = self.config.num_frontier_samples,
      seed, "sampling frontier portfolios"
    );
    sample_frontier(
      self.config.num_frontier_samples,
      mu,
      cov,
      self.config.risk_free_rate,
      seed,
    )
  }

  /// Full pipeline: statistics over the universe, top-K selection by Sharpe,
  /// then optimization and frontier sampling over the selected subset.
  pub fn run(
    &self,
    prices: &PriceMatrix,
    benchmark: Option<&[f64]>,
  ) -> Result<AnalysisOutcome, AnalysisError> {
    let returns = self.log_returns(prices)?;
    let statistics = self.statistics(&returns, benchmark)?;

    let top_tickers = self.top_assets(&statistics);
    let top_returns = returns.select(&top_tickers)?;

    let mean_returns = self.mean_returns(&top_returns);
    let covariance = self.covariance(&top_returns)?;

    let optimization = self.optimize(&mean_returns, &covariance)?;
    let frontier = self.sample_frontier(&mean_returns, &covariance)?;

    Ok(AnalysisOutcome {
      statistics,
      top_tickers,
      mean_returns,
      covariance,
      optimization,
      frontier,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use chrono::NaiveDate;
  use ndarray::Array2;
  use tracing_test::traced_test;

  fn geometric_walk(start: f64, steps: &[f64]) -> Vec<f64> {
    let mut closes = vec![start];
    for s in steps {
      let last = *closes.last().unwrap();
      closes.push(last * (1.0 + s));
    }
    closes
  }

  fn universe() -> PriceMatrix {
    let steps = [
      0.010, -0.004, 0.007, 0.012, -0.008, 0.005, 0.009, -0.002, 0.004, 0.011, -0.006, 0.003,
      0.008, -0.001, 0.006,
    ];
    let columns: Vec<Vec<f64>> = (0..6)
      .map(|a| {
        let tilted: Vec<f64> = steps
          .iter()
          .enumerate()
          .map(|(t, s)| s * (1.0 + a as f64 * 0.15) + if (t + a) % 3 == 0 { 0.002 } else { -0.001 })
          .collect();
        geometric_walk(100.0 + a as f64 * 10.0, &tilted)
      })
      .collect();

    let rows = columns[0].len();
    let mut prices = Array2::zeros((rows, columns.len()));
    for (a, closes) in columns.iter().enumerate() {
      for (t, p) in closes.iter().enumerate() {
        prices[(t, a)] = *p;
      }
    }

    let dates = (0..rows)
      .map(|i| NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(i as u64))
      .collect();
    let tickers = (0..columns.len()).map(|a| format!("AST{a}")).collect();
    PriceMatrix::new(dates, tickers, prices).unwrap()
  }

  fn test_config() -> AnalysisConfig {
    AnalysisConfig {
      risk_free_rate: 0.02,
      top_k: 5,
      num_frontier_samples: 256,
      random_seed: Some(99),
      ..AnalysisConfig::default()
    }
  }

  #[test]
  fn run_produces_a_consistent_outcome() {
    let engine = AnalysisEngine::new(test_config());
    let outcome = engine.run(&universe(), None).unwrap();

    assert_eq!(outcome.statistics.len(), 6);
    assert_eq!(outcome.top_tickers.len(), 5);
    assert_eq!(outcome.mean_returns.len(), 5);
    assert_eq!(outcome.covariance.dim(), (5, 5));
    assert_eq!(outcome.frontier.len(), 256);

    let sum: f64 = outcome.optimization.weights.iter().sum();
    assert!((sum - 1.0).abs() < 1e-6);
    assert!(outcome
      .optimization
      .weights
      .iter()
      .all(|&w| (0.10 - 1e-9..=0.40 + 1e-9).contains(&w)));
  }

  #[test]
  fn run_is_reproducible_with_a_fixed_seed() {
    let engine = AnalysisEngine::new(test_config());
    let a = engine.run(&universe(), None).unwrap();
    let b = engine.run(&universe(), None).unwrap();

    assert_eq!(a.optimization.weights, b.optimization.weights);
    for (x, y) in a.frontier.iter().zip(b.frontier.iter()) {
      assert_eq!(x.weights, y.weights);
    }
  }

  #[traced_test]
  #[test]
  fn non_convergence_is_logged_in_band() {
    let engine = AnalysisEngine::new(AnalysisConfig {
      max_iters: 1,
      ..test_config()
    });
    let outcome = engine.run(&universe(), None).unwrap();

    assert!(!outcome.optimization.converged);
    assert!(logs_contain("optimizer did not converge"));
  }

  #[test]
  fn benchmark_flows_through_to_beta_and_alpha() {
    let engine = AnalysisEngine::new(test_config());
    let returns = engine.log_returns(&universe()).unwrap();
    let bench: Vec<f64> = returns.column(0).to_vec();

    let stats = engine.statistics(&returns, Some(&bench)).unwrap();
    assert!(stats.iter().all(|s| s.beta.is_some()));
    assert!((stats[0].beta.unwrap() - 1.0).abs() < 1e-10);
  }
}
