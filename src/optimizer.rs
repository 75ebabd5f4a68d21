//! # Max-Sharpe Optimizer
//!
//! $$
//! \min_{\mathbf w} -\frac{\mathbf w^\top \mu - r_f}{\sqrt{\mathbf w^\top \Sigma \mathbf w}}
//! \quad \text{s.t.} \quad \sum_i w_i = 1,\ w_{\min} \le w_i \le w_{\max}
//! $$
//!
//! Constrained Sharpe-ratio maximization over the bounded simplex. Candidate
//! parameters are projected onto the constraint set before every cost
//! evaluation, so the returned weights satisfy the budget equality and box
//! bounds exactly, independent of how far the solver wandered.

use argmin::core::CostFunction;
use argmin::core::Executor;
use argmin::core::TerminationReason;
use argmin::core::TerminationStatus;
use argmin::solver::neldermead::NelderMead;
use ndarray::Array1;
use ndarray::Array2;

use crate::error::AnalysisError;

/// Solver settings for [`optimize`].
#[derive(Clone, Debug)]
pub struct OptimizerConfig {
  /// Annualized risk-free rate in the Sharpe numerator.
  pub risk_free_rate: f64,
  /// Per-asset weight floor.
  pub min_weight: f64,
  /// Per-asset weight cap.
  pub max_weight: f64,
  /// Iteration budget; exhausting it yields `converged = false`, not an error.
  pub max_iters: u64,
}

impl Default for OptimizerConfig {
  fn default() -> Self {
    Self {
      risk_free_rate: 0.03678,
      min_weight: 0.10,
      max_weight: 0.40,
      max_iters: 5000,
    }
  }
}

/// Output of a constrained max-Sharpe solve.
#[derive(Clone, Debug)]
pub struct OptimizationResult {
  /// Final weights, one per asset, summing to 1 within the box bounds.
  pub weights: Vec<f64>,
  /// Achieved annualized portfolio return `w'μ`.
  pub expected_return: f64,
  /// Achieved annualized portfolio risk `sqrt(w'Σw)`.
  pub volatility: f64,
  /// Sharpe ratio of the final weights.
  pub sharpe: f64,
  /// Whether the solver met its tolerance within the iteration budget.
  pub converged: bool,
  /// Solver termination diagnostic.
  pub message: String,
}

/// Portfolio return and risk under the covariance quadratic form.
pub fn portfolio_performance(
  weights: &Array1<f64>,
  mu: &Array1<f64>,
  cov: &Array2<f64>,
) -> (f64, f64) {
  let expected_return = weights.dot(mu);
  let volatility = weights.dot(&cov.dot(weights)).max(0.0).sqrt();
  (expected_return, volatility)
}

/// Euclidean projection of `v` onto `{ w : Σw = 1, lo ≤ wᵢ ≤ hi }`.
///
/// Clip-and-shift: the projection is `wᵢ = clamp(vᵢ − λ, lo, hi)` for the λ
/// making the sum hit 1; the sum is monotone in λ, so λ is found by bisection.
/// Requires `n·lo ≤ 1 ≤ n·hi`, which [`optimize`] checks up front.
fn project_bounded_simplex(v: &[f64], lo: f64, hi: f64) -> Vec<f64> {
  let min_v = v.iter().cloned().fold(f64::INFINITY, f64::min);
  let max_v = v.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

  // At λ = lower every entry clamps to hi (sum ≥ 1), at λ = upper to lo (sum ≤ 1).
  let mut lower = min_v - hi - 1.0;
  let mut upper = max_v - lo + 1.0;
  for _ in 0..128 {
    let mid = 0.5 * (lower + upper);
    let sum: f64 = v.iter().map(|vi| (vi - mid).clamp(lo, hi)).sum();
    if sum > 1.0 {
      lower = mid;
    } else {
      upper = mid;
    }
  }

  let shift = 0.5 * (lower + upper);
  v.iter().map(|vi| (vi - shift).clamp(lo, hi)).collect()
}

struct NegativeSharpe {
  mu: Array1<f64>,
  cov: Array2<f64>,
  risk_free_rate: f64,
  min_weight: f64,
  max_weight: f64,
}

impl NegativeSharpe {
  fn weights(&self, x: &[f64]) -> Array1<f64> {
    Array1::from(project_bounded_simplex(x, self.min_weight, self.max_weight))
  }
}

impl CostFunction for NegativeSharpe {
  type Param = Vec<f64>;
  type Output = f64;

  fn cost(&self, x: &Self::Param) -> Result<Self::Output, argmin::core::Error> {
    let w = self.weights(x);
    let variance = w.dot(&self.cov.dot(&w));
    if variance < 1e-30 {
      return Ok(1e10);
    }

    let excess = w.dot(&self.mu) - self.risk_free_rate;
    Ok(-excess / variance.sqrt())
  }
}

/// Solve for the Sharpe-maximal weights under the configured bounds.
///
/// The feasibility precondition `N·min ≤ 1 ≤ N·max` is checked before any
/// solver work. Non-convergence within the iteration budget is an expected
/// outcome under adversarial inputs and is reported in-band through
/// [`OptimizationResult::converged`] together with the solver's termination
/// reason; the best projected weights found so far are still returned.
pub fn optimize(
  mu: &Array1<f64>,
  cov: &Array2<f64>,
  config: &OptimizerConfig,
) -> Result<OptimizationResult, AnalysisError> {
  let n = mu.len();
  if n == 0 {
    return Err(AnalysisError::InvalidInput(
      "cannot optimize an empty asset universe".into(),
    ));
  }
  if cov.dim() != (n, n) {
    return Err(AnalysisError::InvalidInput(format!(
      "covariance shape {:?} does not match {n} assets",
      cov.dim()
    )));
  }
  if !(0.0..=1.0).contains(&config.min_weight) || config.max_weight < config.min_weight {
    return Err(AnalysisError::InvalidInput(format!(
      "malformed weight bounds [{}, {}]",
      config.min_weight, config.max_weight
    )));
  }
  if n as f64 * config.min_weight > 1.0 || (n as f64) * config.max_weight < 1.0 {
    return Err(AnalysisError::InfeasibleConstraints {
      assets: n,
      min_weight: config.min_weight,
      max_weight: config.max_weight,
    });
  }

  let cost = NegativeSharpe {
    mu: mu.clone(),
    cov: cov.clone(),
    risk_free_rate: config.risk_free_rate,
    min_weight: config.min_weight,
    max_weight: config.max_weight,
  };

  let x0 = vec![1.0 / n as f64; n];
  let mut simplex = Vec::with_capacity(n + 1);
  simplex.push(x0.clone());
  for i in 0..n {
    let mut point = x0.clone();
    point[i] += 0.10;
    simplex.push(point);
  }

  let solver = NelderMead::new(simplex)
    .with_sd_tolerance(1e-8)
    .map_err(|e| AnalysisError::Solver(e.to_string()))?;

  let res = Executor::new(cost, solver)
    .configure(|state| state.max_iters(config.max_iters))
    .run()
    .map_err(|e| AnalysisError::Solver(e.to_string()))?;

  let best_x = res.state.best_param.clone().unwrap_or(x0);
  let weights = project_bounded_simplex(&best_x, config.min_weight, config.max_weight);

  let (converged, message) = match &res.state.termination_status {
    TerminationStatus::Terminated(reason) => (
      matches!(
        reason,
        TerminationReason::SolverConverged | TerminationReason::TargetCostReached
      ),
      reason.to_string(),
    ),
    TerminationStatus::NotTerminated => (false, "solver did not terminate".to_string()),
  };

  let w = Array1::from(weights.clone());
  let (expected_return, volatility) = portfolio_performance(&w, mu, cov);
  let sharpe = if volatility > 1e-15 {
    (expected_return - config.risk_free_rate) / volatility
  } else {
    0.0
  };

  Ok(OptimizationResult {
    weights,
    expected_return,
    volatility,
    sharpe,
    converged,
    message,
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  use ndarray::array;

  fn diagonal_cov(variances: &[f64]) -> Array2<f64> {
    let n = variances.len();
    let mut cov = Array2::zeros((n, n));
    for (i, v) in variances.iter().enumerate() {
      cov[(i, i)] = *v;
    }
    cov
  }

  fn config(risk_free_rate: f64) -> OptimizerConfig {
    OptimizerConfig {
      risk_free_rate,
      ..OptimizerConfig::default()
    }
  }

  #[test]
  fn projection_lands_on_the_bounded_simplex() {
    let w = project_bounded_simplex(&[5.0, -3.0, 0.2, 0.2, 0.2], 0.10, 0.40);

    let sum: f64 = w.iter().sum();
    assert!((sum - 1.0).abs() < 1e-9);
    assert!(w.iter().all(|&wi| (0.10..=0.40).contains(&wi)));
    assert!((w[0] - 0.40).abs() < 1e-9);
    assert!((w[1] - 0.10).abs() < 1e-9);
  }

  #[test]
  fn projection_is_identity_on_feasible_points() {
    let v = [0.25, 0.25, 0.25, 0.25];
    let w = project_bounded_simplex(&v, 0.10, 0.40);
    for (wi, vi) in w.iter().zip(v.iter()) {
      assert!((wi - vi).abs() < 1e-9);
    }
  }

  #[test]
  fn optimal_weights_respect_constraints_and_beat_equal_weighting() {
    let mu = array![0.12, 0.10, 0.08, 0.15, 0.09];
    let cov = diagonal_cov(&[0.04, 0.04, 0.04, 0.04, 0.04]);
    let cfg = config(0.03678);

    let result = optimize(&mu, &cov, &cfg).unwrap();
    assert!(result.converged, "diagnostic: {}", result.message);

    let sum: f64 = result.weights.iter().sum();
    assert!((sum - 1.0).abs() < 1e-6);
    assert!(result
      .weights
      .iter()
      .all(|&w| (cfg.min_weight - 1e-9..=cfg.max_weight + 1e-9).contains(&w)));

    // The highest-Sharpe asset gets the largest allocation.
    for (i, w) in result.weights.iter().enumerate() {
      if i != 3 {
        assert!(result.weights[3] > *w);
      }
    }

    let equal = Array1::from(vec![0.2; 5]);
    let (eq_return, eq_vol) = portfolio_performance(&equal, &mu, &cov);
    let eq_sharpe = (eq_return - cfg.risk_free_rate) / eq_vol;
    assert!(result.sharpe >= eq_sharpe - 1e-9);
  }

  #[test]
  fn optimize_is_deterministic() {
    let mu = array![0.11, 0.07, 0.13];
    let cov = array![
      [0.05, 0.01, 0.00],
      [0.01, 0.03, 0.01],
      [0.00, 0.01, 0.08]
    ];
    let cfg = OptimizerConfig {
      risk_free_rate: 0.02,
      min_weight: 0.0,
      max_weight: 1.0,
      max_iters: 5000,
    };

    let a = optimize(&mu, &cov, &cfg).unwrap();
    let b = optimize(&mu, &cov, &cfg).unwrap();
    assert_eq!(a.weights, b.weights);
    assert_eq!(a.sharpe, b.sharpe);
  }

  #[test]
  fn infeasible_bounds_are_rejected_before_solving() {
    let mu = array![0.1, 0.1, 0.1];
    let cov = diagonal_cov(&[0.04, 0.04, 0.04]);

    let too_tight = OptimizerConfig {
      min_weight: 0.40,
      max_weight: 0.45,
      ..OptimizerConfig::default()
    };
    assert!(matches!(
      optimize(&mu, &cov, &too_tight),
      Err(AnalysisError::InfeasibleConstraints { assets: 3, .. })
    ));

    let too_low = OptimizerConfig {
      min_weight: 0.0,
      max_weight: 0.30,
      ..OptimizerConfig::default()
    };
    assert!(matches!(
      optimize(&mu, &cov, &too_low),
      Err(AnalysisError::InfeasibleConstraints { .. })
    ));
  }

  #[test]
  fn exhausted_iteration_budget_reports_non_convergence() {
    let mu = array![0.12, 0.10, 0.08, 0.15, 0.09];
    let cov = diagonal_cov(&[0.04, 0.09, 0.02, 0.16, 0.05]);
    let cfg = OptimizerConfig {
      max_iters: 1,
      ..OptimizerConfig::default()
    };

    let result = optimize(&mu, &cov, &cfg).unwrap();
    assert!(!result.converged);
    assert!(!result.message.is_empty());

    // The best-so-far weights are still feasible for debugging.
    let sum: f64 = result.weights.iter().sum();
    assert!((sum - 1.0).abs() < 1e-6);
  }

  #[test]
  fn mismatched_covariance_shape_is_rejected() {
    let mu = array![0.1, 0.2];
    let cov = diagonal_cov(&[0.04, 0.04, 0.04]);
    assert!(matches!(
      optimize(&mu, &cov, &OptimizerConfig::default()),
      Err(AnalysisError::InvalidInput(_))
    ));
  }

  #[test]
  fn zero_covariance_yields_finite_cost_and_result() {
    let mu = array![0.1, 0.1, 0.1];
    let cov = diagonal_cov(&[0.0, 0.0, 0.0]);
    let cfg = OptimizerConfig {
      min_weight: 0.0,
      max_weight: 1.0,
      ..OptimizerConfig::default()
    };

    let result = optimize(&mu, &cov, &cfg).unwrap();
    assert!(result.volatility.abs() < 1e-12);
    assert_eq!(result.sharpe, 0.0);
  }
}
