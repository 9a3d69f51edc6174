//! Accumulated per-emission series and the running infection peak.
//! Both are cleared on reset.

use crate::{
    report::TickReport,
    types::{Day, Tick, ZoneName},
    zone::Zone,
};
use serde::{Deserialize, Serialize};

/// Running maximum of aggregate I. Only a strictly greater value moves
/// it, so `day`/`tick` are where the maximum was first reached.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct PeakTracker {
    pub infected: f64,
    pub day: Day,
    pub tick: Tick,
}

impl PeakTracker {
    /// Returns true if `infected` is a new peak.
    pub fn observe(&mut self, tick: Tick, day: Day, infected: f64) -> bool {
        if infected > self.infected {
            self.infected = infected;
            self.day = day;
            self.tick = tick;
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ZoneSeries {
    pub name: ZoneName,
    pub s: Vec<f64>,
    pub i: Vec<f64>,
    pub r: Vec<f64>,
}

/// Chart-ready series, one point per emission.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RunHistory {
    pub days: Vec<Day>,
    pub total_s: Vec<f64>,
    pub total_i: Vec<f64>,
    pub total_r: Vec<f64>,
    pub total_i_integral: Vec<f64>,
    pub zones: Vec<ZoneSeries>,
}

impl RunHistory {
    pub fn for_zones(zones: &[Zone]) -> Self {
        Self {
            zones: zones
                .iter()
                .map(|z| ZoneSeries {
                    name: z.spec.name.clone(),
                    ..ZoneSeries::default()
                })
                .collect(),
            ..Self::default()
        }
    }

    pub fn record(&mut self, report: &TickReport) {
        self.days.push(report.day);
        self.total_s.push(report.totals.s);
        self.total_i.push(report.totals.i);
        self.total_r.push(report.totals.r);
        self.total_i_integral.push(report.integral_estimate);
        for (series, zone) in self.zones.iter_mut().zip(&report.zones) {
            series.s.push(zone.s);
            series.i.push(zone.i);
            series.r.push(zone.r);
        }
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn zone(&self, name: &str) -> Option<&ZoneSeries> {
        self.zones.iter().find(|z| z.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peak_keeps_first_occurrence() {
        let mut peak = PeakTracker::default();
        assert!(!peak.observe(0, 0.0, 0.0));
        assert!(peak.observe(1, 0.5, 10.0));
        assert!(!peak.observe(2, 1.0, 10.0));
        assert!(!peak.observe(3, 1.5, 4.0));
        assert_eq!(peak, PeakTracker { infected: 10.0, day: 0.5, tick: 1 });
    }
}
