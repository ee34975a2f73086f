//! Stability sweeps against deterministic solvers.

mod common;

use cf_core::{BatteryConfiguration, ModelKind};
use cf_sim::{
    StabilityClass, SweepOptions, linear_candidates, sweep, sweep_parallel,
};
use cf_solver::{CountingSolver, EquivalentCircuitSolver};
use common::PowerLimited;

fn spm() -> BatteryConfiguration {
    BatteryConfiguration {
        model: ModelKind::Spm,
        ..Default::default()
    }
}

#[test]
fn classifies_each_candidate() {
    let solver = PowerLimited {
        default_limit_kw: 5.0,
        safe_limit_kw: 12.0,
    };
    let report = sweep(
        &solver,
        &spm(),
        &[20.0, 1.0, 8.0, -4.0, 12.0],
        &SweepOptions::default(),
    )
    .unwrap();

    let got: Vec<_> = report.trials.iter().map(|t| (t.power_kw, t.class)).collect();
    assert_eq!(
        got,
        vec![
            (1.0, StabilityClass::StableDefault),
            (-4.0, StabilityClass::StableDefault),
            (8.0, StabilityClass::StableSafe),
            (12.0, StabilityClass::StableSafe),
            (20.0, StabilityClass::Divergent),
        ]
    );
    assert_eq!(report.model, ModelKind::Spm);
    assert_eq!(report.max_stable_on_default(), Some(4.0));
    assert_eq!(report.max_stable(), Some(12.0));
    assert_eq!(report.first_divergent().map(|t| t.power_kw), Some(20.0));
    assert!(report.trials[4].diagnostic.is_some());
    assert!(report.trials[0].final_soc.is_some());
}

#[test]
fn sweep_is_idempotent() {
    let solver = EquivalentCircuitSolver::new();
    let candidates = linear_candidates(1.0, 60.0, 12).unwrap();
    let opts = SweepOptions::default();
    let a = sweep(&solver, &spm(), &candidates, &opts).unwrap();
    let b = sweep(&solver, &spm(), &candidates, &opts).unwrap();
    assert_eq!(a, b);
}

#[test]
fn parallel_matches_sequential() {
    let solver = EquivalentCircuitSolver::new();
    let candidates = linear_candidates(1.0, 100.0, 16).unwrap();
    let opts = SweepOptions::default();
    let seq = sweep(&solver, &spm(), &candidates, &opts).unwrap();
    let par = sweep_parallel(&solver, &spm(), &candidates, &opts).unwrap();
    assert_eq!(seq, par);

    let flagged = sweep(
        &solver,
        &spm(),
        &candidates,
        &SweepOptions {
            parallel: true,
            ..opts
        },
    )
    .unwrap();
    assert_eq!(seq, flagged);
}

#[test]
fn divergent_candidates_were_retried_in_safe_mode() {
    let solver = CountingSolver::new(PowerLimited {
        default_limit_kw: 5.0,
        safe_limit_kw: 10.0,
    });
    let candidates = [2.0, 6.0, 11.0, 30.0];
    let report = sweep(&solver, &spm(), &candidates, &SweepOptions::default()).unwrap();

    // Every candidate gets a default attempt; every default failure gets
    // exactly one safe attempt.
    let escalated = report
        .trials
        .iter()
        .filter(|t| t.class != StabilityClass::StableDefault)
        .count();
    assert_eq!(solver.default_calls(), candidates.len());
    assert_eq!(solver.safe_calls(), escalated);
    assert_eq!(report.count(StabilityClass::Divergent), 2);
}

#[test]
fn reference_solver_boundary_ordering() {
    let solver = EquivalentCircuitSolver::new();
    let report = sweep(
        &solver,
        &spm(),
        &[1.0, 3.0, 15.0, 100.0],
        &SweepOptions::default(),
    )
    .unwrap();
    let classes: Vec<_> = report.trials.iter().map(|t| t.class).collect();
    assert_eq!(
        classes,
        vec![
            StabilityClass::StableDefault,
            StabilityClass::StableDefault,
            StabilityClass::StableSafe,
            StabilityClass::Divergent,
        ]
    );
    assert_eq!(report.recommended_range(), Some(1.0..=3.0));
}

#[test]
fn dfn_is_stable_where_spm_is_not() {
    let solver = EquivalentCircuitSolver::new();
    let dfn = BatteryConfiguration {
        model: ModelKind::Dfn,
        ..Default::default()
    };
    let report = sweep(&solver, &dfn, &[15.0], &SweepOptions::default()).unwrap();
    assert_eq!(report.trials[0].class, StabilityClass::StableDefault);
}

#[test]
fn invalid_candidates_are_rejected() {
    let solver = CountingSolver::new(EquivalentCircuitSolver::new());
    assert!(sweep(&solver, &spm(), &[], &SweepOptions::default()).is_err());
    assert!(sweep(&solver, &spm(), &[1.0, f64::INFINITY], &SweepOptions::default()).is_err());
    assert_eq!(solver.calls(), 0);
}
