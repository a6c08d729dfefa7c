/// Continuous box spaces used for observations and actions.

pub mod space;

use rand::distributions::{Distribution, Uniform};
use rand::Rng;

pub use space::Space;

/// A Box-like space over `f64` with per-dimension inclusive bounds.
/// The length is fixed at construction; bounds may be infinite.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoxSpace {
    low: Vec<f64>,
    high: Vec<f64>,
}

impl BoxSpace {
    pub fn new<L: Into<Vec<f64>>, H: Into<Vec<f64>>>(low: L, high: H) -> Self {
        let (low, high) = (low.into(), high.into());
        assert_eq!(low.len(), high.len(), "low and high must have the same length");
        for i in 0..low.len() {
            assert!(low[i] <= high[i], "low[{i}] > high[{i}]");
        }
        Self { low, high }
    }

    /// A box with the same bounds on every one of `dim` dimensions.
    pub fn uniform(dim: usize, low: f64, high: f64) -> Self {
        Self::new(vec![low; dim], vec![high; dim])
    }

    /// Concatenate several boxes into one, in order.
    pub fn concat(parts: &[&BoxSpace]) -> Self {
        let low: Vec<f64> = parts.iter().flat_map(|b| b.low.iter().copied()).collect();
        let high: Vec<f64> = parts.iter().flat_map(|b| b.high.iter().copied()).collect();
        Self::new(low, high)
    }

    pub fn low(&self) -> &[f64] { &self.low }
    pub fn high(&self) -> &[f64] { &self.high }
    pub fn dim(&self) -> usize { self.low.len() }

    /// Membership test on a borrowed slice. NaN components are never contained.
    pub fn contains_slice(&self, elem: &[f64]) -> bool {
        elem.len() == self.low.len()
            && elem
                .iter()
                .zip(self.low.iter().zip(self.high.iter()))
                .all(|(v, (lo, hi))| *lo <= *v && *v <= *hi)
    }

    /// Index and value of the first component outside the bounds, if any.
    pub fn first_violation(&self, elem: &[f64]) -> Option<(usize, f64)> {
        elem.iter()
            .zip(self.low.iter().zip(self.high.iter()))
            .enumerate()
            .find(|(_, (v, (lo, hi)))| !(**lo <= **v && **v <= **hi))
            .map(|(i, (v, _))| (i, *v))
    }
}

impl Space for BoxSpace {
    type Element = Vec<f64>;

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Self::Element {
        // Unbounded sides are replaced by a unit-width window next to the finite side.
        self.low
            .iter()
            .zip(self.high.iter())
            .map(|(&lo, &hi)| {
                let (lo, hi) = match (lo.is_finite(), hi.is_finite()) {
                    (true, true) => (lo, hi),
                    (true, false) => (lo, lo + 1.0),
                    (false, true) => (hi - 1.0, hi),
                    (false, false) => (-1.0, 1.0),
                };
                Uniform::new_inclusive(lo, hi).sample(rng)
            })
            .collect()
    }

    fn contains(&self, elem: &Self::Element) -> bool { self.contains_slice(elem) }
}
