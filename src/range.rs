
// Legal-value tables for range-limited instrument settings.
//
// Discrete settings are addressed on the wire by their position in the instrument's own table, so
// a DiscreteRange lists its values in exactly the instrument's order. Requests between two entries
// round up to the next coarser setting. Anything above the largest entry is rejected, never clamped.

use crate::error::{Allowed, Error, Result};

/// An ordered, strictly increasing set of legal values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiscreteRange {
    pub name: &'static str,
    pub values: &'static [f64],
}

/// A closed interval `[min, max]` of legal values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContinuousRange {
    pub name: &'static str,
    pub min: f64,
    pub max: f64,
}

impl DiscreteRange {
    pub const fn new(name: &'static str, values: &'static [f64]) -> Self {
        Self { name, values }
    }

    pub fn resolve(&self, requested: f64) -> Result<f64> {
        self.resolve_index(requested).map(|(_, value)| value)
    }

    // Returns the resolved value together with its position in the table.
    pub fn resolve_index(&self, requested: f64) -> Result<(usize, f64)> {
        if let Some(idx) = self.values.iter().position(|v| *v == requested) {
            return Ok((idx, requested));
        }

        self.values
            .iter()
            .enumerate()
            .find(|(_, v)| **v > requested)
            .map(|(idx, v)| (idx, *v))
            .ok_or(Error::OutOfRange {
                parameter: self.name,
                requested,
                allowed: Allowed::Discrete(self.values),
            })
    }

    pub fn is_strictly_increasing(&self) -> bool {
        !self.values.is_empty() && self.values.windows(2).all(|w| w[0] < w[1])
    }
}

impl ContinuousRange {
    pub const fn new(name: &'static str, min: f64, max: f64) -> Self {
        Self { name, min, max }
    }

    pub fn contains(&self, value: f64) -> bool { self.min <= value && value <= self.max }

    pub fn check(&self, value: f64) -> Result<f64> {
        if self.contains(value) {
            Ok(value)
        } else {
            Err(Error::OutOfRange {
                parameter: self.name,
                requested: value,
                allowed: Allowed::Interval { min: self.min, max: self.max },
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DECADES: [f64; 4] = [1e-3, 1e-2, 1e-1, 1.0];
    const RANGE: DiscreteRange = DiscreteRange::new("Decade", &DECADES);

    #[test]
    fn exact_members_resolve_to_themselves() {
        for (idx, v) in DECADES.iter().enumerate() {
            assert_eq!(RANGE.resolve_index(*v).unwrap(), (idx, *v));
        }
    }

    #[test]
    fn values_between_members_round_up() {
        for pair in DECADES.windows(2) {
            let between = (pair[0] + pair[1]) / 2.0;
            assert_eq!(RANGE.resolve(between).unwrap(), pair[1]);
        }
    }

    #[test]
    fn values_below_the_minimum_resolve_to_the_minimum() {
        assert_eq!(RANGE.resolve_index(1e-9).unwrap(), (0, 1e-3));
        assert_eq!(RANGE.resolve(0.0).unwrap(), 1e-3);
    }

    #[test]
    fn values_above_the_maximum_are_rejected() {
        match RANGE.resolve(1.5) {
            Err(Error::OutOfRange { parameter, requested, allowed }) => {
                assert_eq!(parameter, "Decade");
                assert_eq!(requested, 1.5);
                assert_eq!(allowed, Allowed::Discrete(&DECADES));
            }
            other => panic!("expected OutOfRange, got {:?}", other),
        }
    }

    #[test]
    fn nan_is_rejected() {
        assert!(matches!(RANGE.resolve(f64::NAN), Err(Error::OutOfRange { .. })));
    }

    #[test]
    fn ordering() {
        assert!(RANGE.is_strictly_increasing());
        assert!(!DiscreteRange::new("Empty", &[]).is_strictly_increasing());
        assert!(!DiscreteRange::new("Repeated", &[1.0, 1.0]).is_strictly_increasing());
    }

    #[test]
    fn continuous_range_is_closed() {
        let level = ContinuousRange::new("Level", 0.004, 5.0);
        assert_eq!(level.check(0.004).unwrap(), 0.004);
        assert_eq!(level.check(5.0).unwrap(), 5.0);
        assert!(matches!(level.check(0.0039), Err(Error::OutOfRange { .. })));
        assert!(matches!(level.check(5.01), Err(Error::OutOfRange { .. })));
        assert!(matches!(level.check(f64::NAN), Err(Error::OutOfRange { .. })));
    }
}
