//! # Reports
//!
//! $$
//! \{(\text{asset}, S_i, \text{So}_i, \alpha_i)\}
//! $$
//!
//! Tabular views of statistics, covariance and optimization output for
//! downstream reporting collaborators. CSV writers are generic over
//! `io::Write`; no file paths are baked into the core.

use std::io::Write;

use ndarray::Array2;
use prettytable::row;
use prettytable::Table;

use crate::error::AnalysisError;
use crate::optimizer::OptimizationResult;
use crate::stats::ranking_order;
use crate::stats::AssetStatistics;

fn ratio_field(value: Option<f64>) -> String {
  value.map(|v| v.to_string()).unwrap_or_default()
}

/// Write `asset,sharpe_ratio,sortino_ratio,jensen_alpha` rows in Sharpe
/// ranking order; undefined ratios serialize as empty fields.
pub fn statistics_csv<W: Write>(
  stats: &[AssetStatistics],
  writer: W,
) -> Result<(), AnalysisError> {
  let mut csv = csv::Writer::from_writer(writer);
  csv.write_record(["asset", "sharpe_ratio", "sortino_ratio", "jensen_alpha"])?;

  for i in ranking_order(stats, |s| s.sharpe) {
    let s = &stats[i];
    csv.write_record([
      s.ticker.clone(),
      ratio_field(s.sharpe),
      ratio_field(s.sortino),
      ratio_field(s.jensen_alpha),
    ])?;
  }

  csv.flush().map_err(csv::Error::from)?;
  Ok(())
}

/// Write the annualized covariance matrix with ticker labels on both axes.
pub fn covariance_csv<W: Write>(
  tickers: &[String],
  cov: &Array2<f64>,
  writer: W,
) -> Result<(), AnalysisError> {
  if cov.dim() != (tickers.len(), tickers.len()) {
    return Err(AnalysisError::InvalidInput(format!(
      "covariance shape {:?} does not match {} tickers",
      cov.dim(),
      tickers.len()
    )));
  }

  let mut csv = csv::Writer::from_writer(writer);
  let mut header = vec!["asset".to_string()];
  header.extend(tickers.iter().cloned());
  csv.write_record(&header)?;

  for (i, ticker) in tickers.iter().enumerate() {
    let mut record = vec![ticker.clone()];
    record.extend(cov.row(i).iter().map(|v| v.to_string()));
    csv.write_record(&record)?;
  }

  csv.flush().map_err(csv::Error::from)?;
  Ok(())
}

/// Render per-asset statistics as a printable table, Sharpe ranking order.
pub fn statistics_table(stats: &[AssetStatistics]) -> Table {
  let mut table = Table::new();
  table.add_row(row![
    "Asset",
    "Ann. return",
    "Ann. volatility",
    "Sharpe",
    "Sortino",
    "Jensen alpha"
  ]);

  for i in ranking_order(stats, |s| s.sharpe) {
    let s = &stats[i];
    table.add_row(row![
      s.ticker,
      format!("{:.4}", s.annualized_return),
      format!("{:.4}", s.annualized_volatility),
      display_ratio(s.sharpe),
      display_ratio(s.sortino),
      display_ratio(s.jensen_alpha)
    ]);
  }

  table
}

/// Render an optimization result as a printable table.
pub fn optimization_table(tickers: &[String], result: &OptimizationResult) -> Table {
  let mut table = Table::new();
  table.add_row(row!["Asset", "Weight"]);
  for (ticker, weight) in tickers.iter().zip(result.weights.iter()) {
    table.add_row(row![ticker, format!("{weight:.4}")]);
  }
  table.add_row(row!["Expected return", format!("{:.4}", result.expected_return)]);
  table.add_row(row!["Expected risk", format!("{:.4}", result.volatility)]);
  table.add_row(row!["Sharpe", format!("{:.4}", result.sharpe)]);
  table
}

fn display_ratio(value: Option<f64>) -> String {
  value.map(|v| format!("{v:.4}")).unwrap_or_else(|| "-".to_string())
}
