//! Reference equivalent-circuit solver.
//!
//! A lumped Thevenin pack: open-circuit voltage as a function of SOC, an
//! ohmic resistance, and one RC polarization branch. The branch time
//! constant shrinks with current relative to the model's stable limit, which
//! makes the system stiff at high power. The explicit stepper halves its step
//! until it sits inside the stability region; running out of halvings is a
//! divergence, just as a stiff electrochemical solver gives up when its step
//! collapses.

use cf_core::{BatteryConfiguration, ModelKind, Tolerances};
use tracing::debug;

use crate::adapter::{CellSolver, IntegrationRequest};
use crate::error::SolverResult;
use crate::outcome::{Sample, SolverOutcome, TruncationReason};
use crate::profile::StabilityProfile;

const SECONDS_PER_HOUR: f64 = 3600.0;
/// Ohmic drop at 1C as a share of nominal voltage.
const OHMIC_DROP_AT_1C: f64 = 0.03;
/// Steady polarization drop at 1C as a share of nominal voltage.
const POLARIZATION_DROP_AT_1C: f64 = 0.02;
const MAX_EVENT_BISECTIONS: usize = 60;

fn relaxation_time_s(model: ModelKind) -> f64 {
    match model {
        ModelKind::Spm => 20.0,
        ModelKind::Spme => 30.0,
        ModelKind::Dfn => 60.0,
    }
}

#[derive(Clone, Copy, Debug)]
struct CircuitParams {
    capacity_ah: f64,
    r0_ohm: f64,
    r1_ohm: f64,
    tau_s: f64,
    stiff_current_a: f64,
    min_v: f64,
    max_v: f64,
}

impl CircuitParams {
    fn for_config(config: &BatteryConfiguration) -> SolverResult<Self> {
        config.validate()?;
        let capacity_ah = config.capacity_ah();
        let limit_a = config.model.stable_power_limit_kw() * 1000.0 / config.nominal_voltage_v;
        Ok(Self {
            capacity_ah,
            r0_ohm: OHMIC_DROP_AT_1C * config.nominal_voltage_v / capacity_ah,
            r1_ohm: POLARIZATION_DROP_AT_1C * config.nominal_voltage_v / capacity_ah,
            tau_s: relaxation_time_s(config.model),
            stiff_current_a: 0.5 * limit_a,
            min_v: config.min_voltage_v,
            max_v: config.max_voltage_v,
        })
    }

    /// Open-circuit voltage: linear core with knees just outside the
    /// cut-off window at both ends.
    fn ocv(&self, soc: f64) -> f64 {
        let span = self.max_v - self.min_v;
        self.min_v + span * (0.08 + 0.84 * soc) - 0.1 * span * (-soc / 0.03).exp()
            + 0.1 * span * ((soc - 1.0) / 0.03).exp()
    }

    fn tau_eff(&self, current_a: f64) -> f64 {
        let r = current_a / self.stiff_current_a;
        self.tau_s / (1.0 + r * r)
    }

    fn terminal_voltage(&self, soc: f64, vp: f64, current_a: f64) -> f64 {
        self.ocv(soc) - current_a * self.r0_ohm - vp
    }

    fn advance(&self, soc: f64, vp: f64, current_a: f64, tau: f64, h: f64) -> (f64, f64) {
        let soc_next = soc - current_a * h / (self.capacity_ah * SECONDS_PER_HOUR);
        let vp_next = vp + h * (current_a * self.r1_ohm - vp) / tau;
        (soc_next, vp_next)
    }

    /// Cut-offs only apply in the direction the current is driving.
    fn cutoff(&self, voltage_v: f64, current_a: f64) -> Option<TruncationReason> {
        if current_a > 0.0 && voltage_v < self.min_v {
            Some(TruncationReason::LowerVoltageCutoff)
        } else if current_a < 0.0 && voltage_v > self.max_v {
            Some(TruncationReason::UpperVoltageCutoff)
        } else {
            None
        }
    }

    fn bound(&self, reason: TruncationReason) -> f64 {
        match reason {
            TruncationReason::LowerVoltageCutoff => self.min_v,
            TruncationReason::UpperVoltageCutoff => self.max_v,
        }
    }
}

/// Largest step inside the stability region, or the number of halvings
/// spent before giving up.
fn select_step(profile: &StabilityProfile, duration_s: f64, tau_s: f64) -> Result<f64, u32> {
    let mut dt = profile.max_step_s.min(duration_s);
    let mut reductions = 0;
    while dt > tau_s {
        if reductions >= profile.max_step_reductions {
            return Err(reductions);
        }
        dt *= 0.5;
        reductions += 1;
    }
    Ok(dt)
}

/// Built-in stiff solver used when no external electrochemical solver is
/// plugged in.
#[derive(Clone, Copy, Debug, Default)]
pub struct EquivalentCircuitSolver;

impl EquivalentCircuitSolver {
    pub fn new() -> Self {
        Self
    }
}

impl CellSolver for EquivalentCircuitSolver {
    fn integrate(&self, request: &IntegrationRequest<'_>) -> SolverOutcome {
        let start = request.window.start_s;
        let end = request.window.end_s;

        let params = match CircuitParams::for_config(request.config) {
            Ok(p) => p,
            Err(e) => {
                return SolverOutcome::Divergence {
                    failure_time_s: start,
                    diagnostic: format!("invalid battery parameters: {e}"),
                };
            }
        };

        let current = request.control.current_a(params.capacity_ah);
        if !current.is_finite() {
            return SolverOutcome::Divergence {
                failure_time_s: start,
                diagnostic: format!("non-finite current {current}"),
            };
        }

        let tau = params.tau_eff(current);
        let dt = match select_step(request.profile, request.window.duration_s(), tau) {
            Ok(dt) => dt,
            Err(reductions) => {
                return SolverOutcome::Divergence {
                    failure_time_s: start,
                    diagnostic: format!(
                        "step size reduced {reductions} times without reaching stability \
                         (I = {current:.2} A, tau = {tau:.3e} s, min step {:.3e} s)",
                        request.profile.min_step_s()
                    ),
                };
            }
        };

        debug!(
            model = %request.config.model,
            profile = %request.profile.kind,
            current_a = current,
            dt_s = dt,
            "integrating window"
        );

        let mut soc = request.initial.soc;
        let span = params.max_v - params.min_v;
        let mut vp = match request.initial.voltage_v {
            Some(v) => (params.ocv(soc) - request.initial.current_a * params.r0_ohm - v)
                .clamp(-span, span),
            None => 0.0,
        };

        let steps = (request.window.duration_s() / dt).ceil() as usize;
        let mut samples = Vec::with_capacity(steps + 1);
        let mut t = start;

        let v0 = params.terminal_voltage(soc, vp, current);
        samples.push(Sample::new(t, v0, current));
        if let Some(reason) = params.cutoff(v0, current) {
            return SolverOutcome::TruncatedSuccess {
                samples,
                truncation_time_s: t,
                reason,
            };
        }

        while t < end && !Tolerances::ROUND_OFF.admits(t, end) {
            if request.deadline_passed() {
                return SolverOutcome::Divergence {
                    failure_time_s: t,
                    diagnostic: "solver deadline exceeded".to_string(),
                };
            }

            let h = dt.min(end - t);
            let (soc_next, vp_next) = params.advance(soc, vp, current, tau, h);
            let v_next = params.terminal_voltage(soc_next, vp_next, current);

            if let Some(reason) = params.cutoff(v_next, current) {
                let bound = params.bound(reason);
                let tol = request.profile.event_tolerance(bound);
                let (mut lo, mut hi) = (0.0_f64, 1.0_f64);
                for _ in 0..MAX_EVENT_BISECTIONS {
                    let (s, p) = params.advance(soc, vp, current, tau, hi * h);
                    if (params.terminal_voltage(s, p, current) - bound).abs() <= tol {
                        break;
                    }
                    let mid = 0.5 * (lo + hi);
                    let (s, p) = params.advance(soc, vp, current, tau, mid * h);
                    if params
                        .cutoff(params.terminal_voltage(s, p, current), current)
                        .is_some()
                    {
                        hi = mid;
                    } else {
                        lo = mid;
                    }
                }
                let t_cross = t + hi * h;
                let (s, p) = params.advance(soc, vp, current, tau, hi * h);
                samples.push(Sample::new(
                    t_cross,
                    params.terminal_voltage(s, p, current),
                    current,
                ));
                return SolverOutcome::TruncatedSuccess {
                    samples,
                    truncation_time_s: t_cross,
                    reason,
                };
            }

            t += h;
            soc = soc_next;
            vp = vp_next;
            samples.push(Sample::new(t, v_next, current));
        }

        SolverOutcome::Success { samples }
    }
}
