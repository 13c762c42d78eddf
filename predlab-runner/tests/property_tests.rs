//! Property-based tests for the aggregation and validation layers.

use proptest::prelude::*;

use predlab_core::RngHierarchy;
use predlab_runner::metrics::{max_drawdown, profit_factor, win_rate};
use predlab_runner::{
    bootstrap_returns, compute_var_cvar, create_folds, monte_carlo_paths, BootstrapConfig,
    MonteCarloConfig, WalkForwardConfig,
};

/// Per-trade net returns are bounded below by a total loss.
fn returns_strategy(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-1.0f64..20.0, min_len..max_len)
}

// ── 1. Drawdown ──

proptest! {
    #[test]
    fn drawdown_is_never_positive(returns in returns_strategy(0, 60)) {
        prop_assert!(max_drawdown(&returns) <= 0.0);
    }

    #[test]
    fn drawdown_zero_iff_path_never_falls(returns in returns_strategy(1, 60)) {
        let never_falls = returns[1..].iter().all(|&r| r >= 0.0);
        let dd = max_drawdown(&returns);
        if never_falls {
            prop_assert_eq!(dd, 0.0);
        } else {
            prop_assert!(dd < 0.0);
        }
    }
}

// ── 2. Simple aggregates ──

proptest! {
    #[test]
    fn win_rate_in_unit_interval(wins in prop::collection::vec(any::<bool>(), 0..50)) {
        let w = win_rate(&wins);
        prop_assert!((0.0..=1.0).contains(&w));
    }

    #[test]
    fn profit_factor_non_negative(returns in returns_strategy(0, 40)) {
        let pf = profit_factor(&returns);
        prop_assert!((0.0..=100.0).contains(&pf));
    }
}

// ── 3. Bootstrap ──

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn bootstrap_outputs_are_well_formed(
        returns in returns_strategy(2, 40),
        seed in any::<u64>(),
    ) {
        let config = BootstrapConfig { n_iterations: 100, ..BootstrapConfig::default() };
        let r = bootstrap_returns(&returns, &config, &RngHierarchy::new(seed), "s").unwrap();
        prop_assert!((0.0..=1.0).contains(&r.p_mean));
        prop_assert!(r.mean_ci.lower <= r.mean_ci.upper);
        if let Some(p) = r.p_sharpe {
            prop_assert!((0.0..=1.0).contains(&p));
        }
        prop_assert!(r.degenerate_sharpe_samples <= r.n_iterations);
    }

    #[test]
    fn strictly_positive_returns_have_zero_p_value(
        returns in prop::collection::vec(0.01f64..5.0, 2..30),
    ) {
        let config = BootstrapConfig { n_iterations: 100, ..BootstrapConfig::default() };
        let r = bootstrap_returns(&returns, &config, &RngHierarchy::new(1), "s").unwrap();
        prop_assert_eq!(r.p_mean, 0.0);
        prop_assert!(r.mean_ci.lower > 0.0);
    }
}

// ── 4. Tail risk ──

proptest! {
    #[test]
    fn cvar_never_exceeds_var(returns in returns_strategy(1, 80), alpha in 0.01f64..0.5) {
        let v = compute_var_cvar(&returns, alpha).unwrap();
        prop_assert!(v.cvar <= v.var + 1e-12);
        let min = returns.iter().copied().fold(f64::INFINITY, f64::min);
        prop_assert!(v.cvar >= min - 1e-12);
    }
}

// ── 5. Monte Carlo ──

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn monte_carlo_probabilities_bounded(returns in returns_strategy(1, 30), seed in any::<u64>()) {
        let config = MonteCarloConfig { n_paths: 50, store_paths: false, ..MonteCarloConfig::default() };
        let r = monte_carlo_paths(&returns, &config, &RngHierarchy::new(seed), "s").unwrap();
        prop_assert!((0.0..=1.0).contains(&r.prob_loss));
        prop_assert!((0.0..=1.0).contains(&r.prob_ruin));
        prop_assert!(r.mean_max_drawdown <= 0.0);
        prop_assert!(r.terminal.p5 <= r.terminal.p95);
    }
}

// ── 6. Walk-forward folds ──

proptest! {
    #[test]
    fn folds_stay_in_bounds(n in 0usize..400, min_trades in 1usize..30) {
        let config = WalkForwardConfig { train_ratio: 0.5, min_trades };
        match create_folds(n, &config) {
            Ok(folds) => {
                prop_assert!(n >= 2 * min_trades);
                prop_assert!(!folds.is_empty());
                for f in &folds {
                    prop_assert_eq!(f.train_end, f.test_start);
                    prop_assert_eq!(f.train_end - f.train_start, f.test_end - f.test_start);
                    prop_assert!(f.test_end <= n);
                }
            }
            Err(_) => prop_assert!(n < 2 * min_trades),
        }
    }
}
