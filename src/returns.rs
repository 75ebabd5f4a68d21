//! # Price & Return Matrices
//!
//! $$
//! r_t = \ln P_t - \ln P_{t-1}
//! $$
//!
//! Aligned price history containers and log-return conversion.

use chrono::NaiveDate;
use ndarray::Array2;
use ndarray::ArrayView1;

use crate::error::AnalysisError;

/// Date-indexed price history, one column per asset.
///
/// Construction validates the whole container once (shape consistency,
/// strictly increasing dates, strictly positive finite prices), so downstream
/// consumers never re-check cells.
#[derive(Clone, Debug)]
pub struct PriceMatrix {
  dates: Vec<NaiveDate>,
  tickers: Vec<String>,
  prices: Array2<f64>,
}

impl PriceMatrix {
  /// Build a validated price matrix with shape `(dates, tickers)`.
  pub fn new(
    dates: Vec<NaiveDate>,
    tickers: Vec<String>,
    prices: Array2<f64>,
  ) -> Result<Self, AnalysisError> {
    if tickers.is_empty() {
      return Err(AnalysisError::InvalidInput("no tickers supplied".into()));
    }
    if dates.is_empty() {
      return Err(AnalysisError::InvalidInput("no dates supplied".into()));
    }
    if prices.nrows() != dates.len() || prices.ncols() != tickers.len() {
      return Err(AnalysisError::InvalidInput(format!(
        "price shape {:?} does not match {} dates x {} tickers",
        prices.dim(),
        dates.len(),
        tickers.len()
      )));
    }
    if let Some(w) = dates.windows(2).find(|w| w[0] >= w[1]) {
      return Err(AnalysisError::InvalidInput(format!(
        "dates must be strictly increasing, found {} before {}",
        w[0], w[1]
      )));
    }
    if let Some(p) = prices.iter().find(|p| !p.is_finite() || **p <= 0.0) {
      return Err(AnalysisError::InvalidInput(format!(
        "prices must be positive and finite, found {p}"
      )));
    }

    Ok(Self {
      dates,
      tickers,
      prices,
    })
  }

  /// Trading dates, oldest first.
  pub fn dates(&self) -> &[NaiveDate] {
    &self.dates
  }

  /// Asset identifiers in column order.
  pub fn tickers(&self) -> &[String] {
    &self.tickers
  }

  /// Price grid with shape `(dates, tickers)`.
  pub fn prices(&self) -> &Array2<f64> {
    &self.prices
  }

  /// Restrict the matrix to a ticker subset, preserving the requested order.
  pub fn select(&self, tickers: &[String]) -> Result<Self, AnalysisError> {
    let columns = column_indices(&self.tickers, tickers)?;
    let prices = self.prices.select(ndarray::Axis(1), &columns);

    Ok(Self {
      dates: self.dates.clone(),
      tickers: tickers.to_vec(),
      prices,
    })
  }

  /// Convert consecutive prices into log returns.
  ///
  /// The output drops the leading date: its length is the price history
  /// length minus one. Fails when fewer than two dates are present.
  pub fn log_returns(&self) -> Result<ReturnMatrix, AnalysisError> {
    if self.dates.len() < 2 {
      return Err(AnalysisError::InvalidInput(format!(
        "at least 2 dates are required for returns, got {}",
        self.dates.len()
      )));
    }

    let periods = self.dates.len() - 1;
    let mut returns = Array2::zeros((periods, self.tickers.len()));
    for t in 0..periods {
      for (a, cell) in returns.row_mut(t).iter_mut().enumerate() {
        *cell = self.prices[(t + 1, a)].ln() - self.prices[(t, a)].ln();
      }
    }

    Ok(ReturnMatrix {
      dates: self.dates[1..].to_vec(),
      tickers: self.tickers.clone(),
      returns,
    })
  }
}

/// Per-period log returns, one column per asset.
#[derive(Clone, Debug)]
pub struct ReturnMatrix {
  dates: Vec<NaiveDate>,
  tickers: Vec<String>,
  returns: Array2<f64>,
}

impl ReturnMatrix {
  /// Dates of the return observations (the first price date is dropped).
  pub fn dates(&self) -> &[NaiveDate] {
    &self.dates
  }

  /// Asset identifiers in column order.
  pub fn tickers(&self) -> &[String] {
    &self.tickers
  }

  /// Return grid with shape `(periods, tickers)`.
  pub fn returns(&self) -> &Array2<f64> {
    &self.returns
  }

  /// Number of return observations per asset.
  pub fn periods(&self) -> usize {
    self.returns.nrows()
  }

  /// Return series of a single column.
  pub fn column(&self, asset: usize) -> ArrayView1<'_, f64> {
    self.returns.column(asset)
  }

  /// Restrict the matrix to a ticker subset, preserving the requested order.
  pub fn select(&self, tickers: &[String]) -> Result<Self, AnalysisError> {
    let columns = column_indices(&self.tickers, tickers)?;
    let returns = self.returns.select(ndarray::Axis(1), &columns);

    Ok(Self {
      dates: self.dates.clone(),
      tickers: tickers.to_vec(),
      returns,
    })
  }
}

fn column_indices(all: &[String], wanted: &[String]) -> Result<Vec<usize>, AnalysisError> {
  if wanted.is_empty() {
    return Err(AnalysisError::InvalidInput("empty ticker selection".into()));
  }

  wanted
    .iter()
    .map(|t| {
      all
        .iter()
        .position(|have| have == t)
        .ok_or_else(|| AnalysisError::InvalidInput(format!("unknown ticker {t}")))
    })
    .collect()
}
