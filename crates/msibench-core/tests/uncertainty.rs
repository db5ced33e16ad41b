// crates/msibench-core/tests/uncertainty.rs
// ============================================================================
// Module: Uncertainty Tracker Tests
// Description: Stopping-rule arithmetic and convergence.
// Purpose: Pin the required-count formula and its non-monotonic behavior.
// ============================================================================

//! Unit tests for `UncertaintyTracker`.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    clippy::float_cmp,
    reason = "Test-only assertions and helpers are permitted."
)]

use msibench_core::MIN_N;
use msibench_core::UncertaintyError;
use msibench_core::UncertaintyTracker;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

type TestResult = Result<(), String>;

fn tracker_with(uncertainty: f64, values: &[f64]) -> Result<UncertaintyTracker, String> {
    let mut tracker = UncertaintyTracker::new(uncertainty).map_err(|err| err.to_string())?;
    for value in values {
        tracker.add_observation(*value);
    }
    Ok(tracker)
}

#[test]
fn empty_tracker_requires_minimum() -> TestResult {
    let state = tracker_with(1.0, &[])?.state();
    assert_eq!(state.mean, None);
    assert_eq!(state.stdev, None);
    assert_eq!(state.count, 0);
    assert_eq!(state.n, MIN_N);
    assert!(!state.is_sufficient);
    Ok(())
}

#[test]
fn single_observation_has_mean_but_no_stdev() -> TestResult {
    let state = tracker_with(1.0, &[42.0])?.state();
    assert_eq!(state.mean, Some(42.0));
    assert_eq!(state.stdev, None);
    assert_eq!(state.n, MIN_N);
    Ok(())
}

#[test]
fn alternating_values_meet_unit_uncertainty_at_minimum() -> TestResult {
    let values = [1.0, -1.0, 1.0, -1.0, 1.0, -1.0];
    let state = tracker_with(1.0, &values)?.state();
    assert_eq!(state.mean, Some(0.0));
    let stdev = state.stdev.ok_or("stdev missing")?;
    assert!((stdev - 1.2_f64.sqrt()).abs() < 1e-12);
    assert_eq!(state.n, MIN_N);
    assert!(state.is_sufficient);
    Ok(())
}

#[test]
fn tighter_uncertainty_raises_requirement() -> TestResult {
    let values = [1.0, -1.0, 1.0, -1.0, 1.0, -1.0];
    let state = tracker_with(0.5, &values)?.state();
    // (2 * sqrt(1.2) / 0.5)^2 = 19.2
    assert_eq!(state.n, 20);
    assert!(!state.is_sufficient);
    Ok(())
}

#[test]
fn exact_requirement_is_not_rounded_up() -> TestResult {
    // Sample variance is exactly 5, but sqrt(5)^2 evaluates to 5.000000000000001.
    let state = tracker_with(1.0, &[-3.0, -1.0, 0.0, 1.0, 3.0])?.state();
    assert_eq!(state.mean, Some(0.0));
    assert_eq!(state.n, 20);
    Ok(())
}

#[test]
fn sufficiency_can_be_lost() -> TestResult {
    let mut tracker = tracker_with(1.0, &[10.0; 6])?;
    let before = tracker.state();
    assert_eq!(before.stdev, Some(0.0));
    assert!(before.is_sufficient);

    tracker.add_observation(100.0);
    let after = tracker.state();
    assert_eq!(after.count, 7);
    assert!(after.n > 7);
    assert!(!after.is_sufficient);
    Ok(())
}

#[test]
fn rejects_non_positive_uncertainty() {
    assert_eq!(UncertaintyTracker::new(0.0), Err(UncertaintyError::InvalidUncertainty(0.0)));
    assert!(UncertaintyTracker::new(-1.0).is_err());
    assert!(UncertaintyTracker::new(f64::NAN).is_err());
    assert!(UncertaintyTracker::new(f64::INFINITY).is_err());
}

#[test]
fn seeded_uniform_sequence_converges() -> TestResult {
    let mut rng = StdRng::seed_from_u64(7);
    let mut tracker = UncertaintyTracker::new(1.0).map_err(|err| err.to_string())?;
    let mut sufficient = None;
    for _ in 0 .. 1000 {
        tracker.add_observation(rng.gen_range(0.0 .. 12.0));
        let state = tracker.state();
        if state.is_sufficient {
            sufficient = Some(state);
            break;
        }
    }
    let state = sufficient.ok_or("tracker never became sufficient")?;
    assert!(state.count >= MIN_N);
    assert!(state.count >= state.n);
    let mean = state.mean.ok_or("mean missing")?;
    assert!((0.0 .. 12.0).contains(&mean), "mean {mean} outside sample range");
    Ok(())
}
