//! # Asset Statistics
//!
//! $$
//! S_i = \frac{e^{\mu_i T} - 1 - r_f}{\sqrt{\sigma_i^2 T}}
//! $$
//!
//! Annualized risk/return measures per asset, Sharpe/Sortino rankings and the
//! annualized covariance matrix. Variances use the population divisor `N` so
//! the covariance diagonal matches each asset's annualized variance exactly.

use ndarray::Array1;
use ndarray::Array2;
use ndarray::ArrayView1;

use crate::error::AnalysisError;
use crate::returns::ReturnMatrix;

/// Variances below this are treated as zero when they appear in a denominator.
const VAR_EPS: f64 = 1e-12;

/// Risk-adjusted performance measures for a single asset.
///
/// Ratio fields are `None` when their denominator is degenerate (flat series,
/// zero benchmark variance) or, for `beta`/`jensen_alpha`, when no benchmark
/// was supplied. A `None` never aborts the batch.
#[derive(Clone, Debug)]
pub struct AssetStatistics {
  /// Asset identifier.
  pub ticker: String,
  /// Annualized geometric mean return.
  pub annualized_return: f64,
  /// Annualized volatility.
  pub annualized_volatility: f64,
  /// Annualized downside deviation (positive returns clipped to zero).
  pub downside_deviation: f64,
  /// Sharpe ratio, `None` when volatility is zero.
  pub sharpe: Option<f64>,
  /// Sortino ratio, `None` when downside deviation is zero.
  pub sortino: Option<f64>,
  /// Beta against the benchmark, `None` without a usable benchmark.
  pub beta: Option<f64>,
  /// CAPM residual return, `None` whenever `beta` is.
  pub jensen_alpha: Option<f64>,
}

fn population_mean(xs: ArrayView1<'_, f64>) -> f64 {
  if xs.is_empty() {
    0.0
  } else {
    xs.sum() / xs.len() as f64
  }
}

fn population_variance(xs: ArrayView1<'_, f64>, mean: f64) -> f64 {
  if xs.is_empty() {
    return 0.0;
  }
  xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / xs.len() as f64
}

fn population_covariance(x: ArrayView1<'_, f64>, y: ArrayView1<'_, f64>) -> f64 {
  let n = x.len().min(y.len());
  if n == 0 {
    return 0.0;
  }

  let mx = population_mean(x);
  let my = population_mean(y);
  let mut acc = 0.0;
  for i in 0..n {
    acc += (x[i] - mx) * (y[i] - my);
  }
  acc / n as f64
}

/// Compound a per-period mean log return into a yearly geometric rate.
fn annualized_mean(mu: f64, trading_days: usize) -> f64 {
  (mu * trading_days as f64).exp() - 1.0
}

fn annualized_deviation(variance: f64, trading_days: usize) -> f64 {
  (variance * trading_days as f64).sqrt()
}

/// Annualized mean return per asset, in column order.
pub fn annualized_mean_returns(returns: &ReturnMatrix, trading_days: usize) -> Array1<f64> {
  Array1::from_iter(
    (0..returns.tickers().len())
      .map(|a| annualized_mean(population_mean(returns.column(a)), trading_days)),
  )
}

/// Compute per-asset statistics over a return matrix.
///
/// `benchmark` is an optional per-period benchmark return series covering the
/// same dates; a length mismatch is rejected. Degenerate assets yield `None`
/// ratio markers instead of failing the batch.
pub fn asset_statistics(
  returns: &ReturnMatrix,
  benchmark: Option<&[f64]>,
  risk_free_rate: f64,
  trading_days: usize,
) -> Result<Vec<AssetStatistics>, AnalysisError> {
  if let Some(bench) = benchmark {
    if bench.len() != returns.periods() {
      return Err(AnalysisError::InvalidInput(format!(
        "benchmark has {} observations, return matrix has {}",
        bench.len(),
        returns.periods()
      )));
    }
  }

  let bench_stats = benchmark.map(|b| {
    let b = ArrayView1::from(b);
    let mean = population_mean(b);
    let variance = population_variance(b, mean);
    (b, annualized_mean(mean, trading_days), variance)
  });

  let stats = returns
    .tickers()
    .iter()
    .enumerate()
    .map(|(a, ticker)| {
      let series = returns.column(a);
      let mean = population_mean(series);
      let variance = population_variance(series, mean);

      let annualized_return = annualized_mean(mean, trading_days);
      let annualized_volatility = annualized_deviation(variance, trading_days);

      let clipped = series.mapv(|r| r.min(0.0));
      let downside_variance = population_variance(clipped.view(), population_mean(clipped.view()));
      let downside_deviation = annualized_deviation(downside_variance, trading_days);

      let excess = annualized_return - risk_free_rate;
      let sharpe = (variance > VAR_EPS).then(|| excess / annualized_volatility);
      let sortino = (downside_variance > VAR_EPS).then(|| excess / downside_deviation);

      let beta = bench_stats.as_ref().and_then(|(b, _, bench_var)| {
        (*bench_var > VAR_EPS).then(|| population_covariance(series, *b) / bench_var)
      });
      let jensen_alpha = beta.and_then(|beta| {
        bench_stats.as_ref().map(|(_, bench_return, _)| {
          annualized_return - (risk_free_rate + beta * (bench_return - risk_free_rate))
        })
      });

      AssetStatistics {
        ticker: ticker.clone(),
        annualized_return,
        annualized_volatility,
        downside_deviation,
        sharpe,
        sortino,
        beta,
        jensen_alpha,
      }
    })
    .collect();

  Ok(stats)
}

/// Total ordering of `stats` indices for reporting.
///
/// Assets with a defined `key` come first, descending, with input order
/// breaking ties; assets without one follow in input order.
pub fn ranking_order<F>(stats: &[AssetStatistics], key: F) -> Vec<usize>
where
  F: Fn(&AssetStatistics) -> Option<f64>,
{
  let mut order: Vec<usize> = (0..stats.len()).collect();
  order.sort_by(|&a, &b| match (key(&stats[a]), key(&stats[b])) {
    (Some(ka), Some(kb)) => kb.partial_cmp(&ka).unwrap_or(std::cmp::Ordering::Equal),
    (Some(_), None) => std::cmp::Ordering::Less,
    (None, Some(_)) => std::cmp::Ordering::Greater,
    (None, None) => std::cmp::Ordering::Equal,
  });
  order
}

/// `(ticker, sharpe)` pairs, best first; assets with an undefined Sharpe are
/// omitted since they carry no ratio to rank on.
pub fn rank_by_sharpe(stats: &[AssetStatistics]) -> Vec<(String, f64)> {
  rank_by(stats, |s| s.sharpe)
}

/// `(ticker, sortino)` pairs, best first, mirroring [`rank_by_sharpe`].
pub fn rank_by_sortino(stats: &[AssetStatistics]) -> Vec<(String, f64)> {
  rank_by(stats, |s| s.sortino)
}

fn rank_by<F>(stats: &[AssetStatistics], key: F) -> Vec<(String, f64)>
where
  F: Fn(&AssetStatistics) -> Option<f64> + Copy,
{
  ranking_order(stats, key)
    .into_iter()
    .filter_map(|i| key(&stats[i]).map(|k| (stats[i].ticker.clone(), k)))
    .collect()
}

/// First `k` tickers of the Sharpe ranking.
pub fn top_by_sharpe(stats: &[AssetStatistics], k: usize) -> Vec<String> {
  rank_by_sharpe(stats)
    .into_iter()
    .take(k)
    .map(|(ticker, _)| ticker)
    .collect()
}

/// Annualized population covariance matrix over all columns of `returns`.
pub fn covariance_matrix(
  returns: &ReturnMatrix,
  trading_days: usize,
) -> Result<Array2<f64>, AnalysisError> {
  if returns.periods() == 0 {
    return Err(AnalysisError::InvalidInput(
      "cannot estimate covariance from an empty return matrix".into(),
    ));
  }

  let n = returns.tickers().len();
  let mut cov = Array2::zeros((n, n));
  for i in 0..n {
    for j in i..n {
      let c = population_covariance(returns.column(i), returns.column(j)) * trading_days as f64;
      cov[(i, j)] = c;
      cov[(j, i)] = c;
    }
  }

  Ok(cov)
}
