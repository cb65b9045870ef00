//! Wait-time statistics over a vehicle fleet

use ordered_float::OrderedFloat;
use std::fmt;

use super::error::{SimError, SimResult};
use super::vehicle::Vehicle;

/// Summary of `wait_time` across every vehicle, arrived or not
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaitTimeStats {
    pub count: usize,
    pub total: f64,
    pub average: f64,
    pub maximum: f64,
    /// Population standard deviation
    pub std_dev: f64,
}

impl WaitTimeStats {
    pub fn from_vehicles(vehicles: &[Vehicle]) -> SimResult<Self> {
        Self::from_wait_times(vehicles.iter().map(|vehicle| vehicle.wait_time))
    }

    pub fn from_wait_times(wait_times: impl IntoIterator<Item = f32>) -> SimResult<Self> {
        let wait_times: Vec<f64> = wait_times.into_iter().map(f64::from).collect();
        let maximum = wait_times
            .iter()
            .copied()
            .map(OrderedFloat)
            .max()
            .ok_or(SimError::EmptyFleet)?
            .into_inner();

        let count = wait_times.len();
        let total: f64 = wait_times.iter().sum();
        let average = total / count as f64;
        let variance = wait_times
            .iter()
            .map(|wait| (wait - average).powi(2))
            .sum::<f64>()
            / count as f64;

        Ok(Self {
            count,
            total,
            average,
            maximum,
            std_dev: variance.sqrt(),
        })
    }
}

impl fmt::Display for WaitTimeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total waiting time {}", self.total)?;
        writeln!(f, "Average waiting time {}", self.average)?;
        writeln!(f, "Maximum waiting time {}", self.maximum)?;
        writeln!(f, "std. of waiting time {}", self.std_dev)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summarises_wait_times() {
        let stats =
            WaitTimeStats::from_wait_times([2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_eq!(stats.count, 8);
        assert_eq!(stats.total, 40.0);
        assert_eq!(stats.average, 5.0);
        assert_eq!(stats.maximum, 9.0);
        assert!((stats.std_dev - 2.0).abs() < 1e-9);
    }

    #[test]
    fn empty_fleet_is_an_error() {
        assert_eq!(
            WaitTimeStats::from_wait_times(std::iter::empty()),
            Err(SimError::EmptyFleet)
        );
    }

    #[test]
    fn renders_report_lines() {
        let text = WaitTimeStats::from_wait_times([31.0, 32.0]).unwrap().to_string();
        assert!(text.contains("Total waiting time 63"));
        assert!(text.contains("Average waiting time 31.5"));
        assert!(text.contains("Maximum waiting time 32"));
        assert!(text.contains("std. of waiting time 0.5"));
    }
}
