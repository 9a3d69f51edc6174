//! Integral-equation cross-check of the Euler trajectory.
//!
//! The SIR infected compartment satisfies
//!
//!   I(t) = I0·e^(-γt) + ∫₀ᵗ β·S(u)·I(u)/N(u) · e^(-γ(t-u)) du
//!
//! which is evaluated here by the composite trapezoidal rule over the
//! recorded pre-step aggregates. N(u) is the population of zones active
//! at u, and I0 is the seeded infection of zones active at t. The
//! estimate is diagnostic only and never feeds back into zone state.

use crate::{
    error::SimResult,
    event::SimEvent,
    subsystem::{SimContext, SimSubsystem},
    time_history::{TimeHistory, TimeHistorySample},
    types::Day,
    world::SimWorld,
};
use serde::{Deserialize, Serialize};

/// How closely the two formulations agree.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Agreement {
    /// Relative error below 1%.
    Converged,
    /// Below 5%.
    Moderate,
    Divergent,
}

impl Agreement {
    pub fn classify(relative_error_pct: f64) -> Self {
        if relative_error_pct < 1.0 {
            Self::Converged
        } else if relative_error_pct < 5.0 {
            Self::Moderate
        } else {
            Self::Divergent
        }
    }
}

/// Euler aggregate vs integral estimate at one tick.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct IntegralComparison {
    pub euler_infected: f64,
    pub integral_estimate: f64,
    pub relative_error_pct: f64,
}

impl IntegralComparison {
    pub fn new(euler_infected: f64, integral_estimate: f64) -> Self {
        Self {
            euler_infected,
            integral_estimate,
            relative_error_pct: relative_error_pct(euler_infected, integral_estimate),
        }
    }

    pub fn agreement(&self) -> Agreement {
        Agreement::classify(self.relative_error_pct)
    }
}

/// |euler - integral| / euler · 100. Zero when there is nothing to compare.
pub fn relative_error_pct(euler_infected: f64, integral_estimate: f64) -> f64 {
    if euler_infected > 0.0 && integral_estimate != 0.0 {
        ((euler_infected - integral_estimate) / euler_infected).abs() * 100.0
    } else {
        0.0
    }
}

#[derive(Debug, Default)]
pub struct IntegralValidator;

impl IntegralValidator {
    pub fn new() -> Self {
        Self
    }

    /// I(t) by the closed-form integral over `history`.
    ///
    /// Returns 0 with fewer than two samples or t <= 0.
    pub fn estimate(
        history: &TimeHistory,
        t: Day,
        i_initial_active: f64,
        beta: f64,
        gamma: f64,
    ) -> f64 {
        let samples = history.samples();
        if samples.len() < 2 || t <= 0.0 {
            return 0.0;
        }

        let term1 = i_initial_active * (-gamma * t).exp();

        let integrand = |u: &TimeHistorySample| {
            if u.n_active > 0.0 {
                beta * u.s_total_active * u.i_total_active / u.n_active * (-gamma * (t - u.t)).exp()
            } else {
                0.0
            }
        };

        let mut integral = 0.0;
        for pair in samples.windows(2) {
            let (prev, curr) = (&pair[0], &pair[1]);
            if curr.t > t {
                break;
            }
            integral += (integrand(prev) + integrand(curr)) / 2.0 * (curr.t - prev.t);
        }

        term1 + integral
    }
}

impl SimSubsystem for IntegralValidator {
    fn name(&self) -> &'static str { "integral_validator" }

    fn update(
        &mut self,
        ctx: &SimContext,
        world: &mut SimWorld,
        _events_in: &[SimEvent],
    ) -> SimResult<Vec<SimEvent>> {
        let estimate = Self::estimate(
            &world.time_history,
            ctx.day,
            world.active_initial_infected(),
            ctx.beta,
            ctx.gamma,
        );
        let comparison = IntegralComparison::new(world.totals().i, estimate);

        log::debug!(
            "tick={} day={} integral: euler={:.1} integral={:.1} err={:.2}%",
            ctx.tick,
            ctx.day,
            comparison.euler_infected,
            comparison.integral_estimate,
            comparison.relative_error_pct
        );

        Ok(vec![SimEvent::IntegralEvaluated {
            tick: ctx.tick,
            day: ctx.day,
            euler_infected: comparison.euler_infected,
            integral_estimate: comparison.integral_estimate,
            relative_error_pct: comparison.relative_error_pct,
        }])
    }

    fn as_any(&self) -> &dyn std::any::Any { self }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(t: f64, s: f64, i: f64, n: f64) -> TimeHistorySample {
        TimeHistorySample {
            t,
            s_total_active: s,
            i_total_active: i,
            i_initial_active: 0.0,
            n_active: n,
        }
    }

    fn history(samples: &[TimeHistorySample]) -> TimeHistory {
        let mut h = TimeHistory::new();
        for s in samples {
            h.push(*s);
        }
        h
    }

    #[test]
    fn needs_two_samples_and_positive_t() {
        let one = history(&[sample(0.5, 90.0, 10.0, 100.0)]);
        assert_eq!(IntegralValidator::estimate(&one, 0.5, 10.0, 0.3, 0.14), 0.0);

        let two = history(&[sample(0.0, 90.0, 10.0, 100.0), sample(0.5, 90.0, 10.0, 100.0)]);
        assert_eq!(IntegralValidator::estimate(&two, 0.0, 10.0, 0.3, 0.14), 0.0);
    }

    #[test]
    fn single_trapezoid_matches_hand_value() {
        let (beta, gamma, t) = (0.3, 0.14, 1.0);
        let h = history(&[sample(0.5, 900.0, 100.0, 1_000.0), sample(1.0, 880.0, 110.0, 1_000.0)]);

        let f_prev = beta * 900.0 * 100.0 / 1_000.0 * (-gamma * 0.5_f64).exp();
        let f_curr = beta * 880.0 * 110.0 / 1_000.0;
        let expected = 100.0 * (-gamma * t).exp() + (f_prev + f_curr) / 2.0 * 0.5;

        let got = IntegralValidator::estimate(&h, t, 100.0, beta, gamma);
        assert!((got - expected).abs() < 1e-9, "got {got}, expected {expected}");
    }

    #[test]
    fn zero_active_population_contributes_nothing() {
        let (beta, gamma) = (0.3, 0.14);
        let h = history(&[
            sample(0.5, 0.0, 0.0, 0.0),
            sample(1.0, 0.0, 0.0, 0.0),
            sample(1.5, 0.0, 0.0, 0.0),
        ]);
        let got = IntegralValidator::estimate(&h, 1.5, 0.0, beta, gamma);
        assert_eq!(got, 0.0);
    }

    #[test]
    fn samples_after_t_are_ignored() {
        let (beta, gamma) = (0.3, 0.14);
        let base = [sample(0.5, 900.0, 100.0, 1_000.0), sample(1.0, 880.0, 110.0, 1_000.0)];
        let mut extended = base.to_vec();
        extended.push(sample(1.5, 1e9, 1e9, 1_000.0));

        let a = IntegralValidator::estimate(&history(&base), 1.0, 100.0, beta, gamma);
        let b = IntegralValidator::estimate(&history(&extended), 1.0, 100.0, beta, gamma);
        assert_eq!(a, b);
    }

    #[test]
    fn relative_error_guards() {
        assert_eq!(relative_error_pct(0.0, 10.0), 0.0);
        assert_eq!(relative_error_pct(10.0, 0.0), 0.0);
        assert!((relative_error_pct(100.0, 97.0) - 3.0).abs() < 1e-12);
        assert_eq!(Agreement::classify(0.5), Agreement::Converged);
        assert_eq!(Agreement::classify(3.0), Agreement::Moderate);
        assert_eq!(Agreement::classify(7.5), Agreement::Divergent);
    }
}
