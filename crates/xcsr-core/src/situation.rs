//! Situations (observed state vectors) and their value domain

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{Result, XcsError};

/// A situation vector as reported by the environment
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Situation(pub Vec<f64>);

impl Situation {
    /// Wrap a vector of attribute values
    #[must_use]
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    /// Attribute values
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.0
    }

    /// Number of attributes
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the situation has no attributes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<f64>> for Situation {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

impl std::ops::Index<usize> for Situation {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.0[index]
    }
}

/// Box-shaped value domain of a situation: one `[low, high]` range per attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SituationSpace {
    /// Lower bounds for each attribute
    pub low: Vec<f64>,
    /// Upper bounds for each attribute
    pub high: Vec<f64>,
}

impl SituationSpace {
    /// Create a new situation space
    pub fn new(low: Vec<f64>, high: Vec<f64>) -> Result<Self> {
        if low.len() != high.len() {
            return Err(XcsError::DimensionMismatch {
                expected: low.len(),
                actual: high.len(),
            });
        }
        if let Some(i) = low.iter().zip(&high).position(|(l, h)| !(l <= h)) {
            return Err(XcsError::Environment(format!(
                "attribute {i} has low bound above high bound"
            )));
        }
        Ok(Self { low, high })
    }

    /// A space where every attribute shares the same range
    #[must_use]
    pub fn uniform(dim: usize, low: f64, high: f64) -> Self {
        Self {
            low: vec![low; dim],
            high: vec![high; dim],
        }
    }

    /// Number of attributes
    #[must_use]
    pub fn dim(&self) -> usize {
        self.low.len()
    }

    /// Bounds of attribute `i`
    #[must_use]
    pub fn bounds(&self, i: usize) -> (f64, f64) {
        (self.low[i], self.high[i])
    }

    /// Check if a situation lies within the space
    #[must_use]
    pub fn contains(&self, situation: &Situation) -> bool {
        situation.len() == self.dim()
            && situation
                .values()
                .iter()
                .zip(&self.low)
                .zip(&self.high)
                .all(|((x, l), h)| x >= l && x <= h)
    }

    /// Sample a uniformly random situation
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Situation {
        let values = self
            .low
            .iter()
            .zip(&self.high)
            .map(|(l, h)| l + rng.gen::<f64>() * (h - l))
            .collect();
        Situation(values)
    }

    /// Fail unless `situation` has the dimensionality of this space
    pub fn check_dim(&self, situation: &Situation) -> Result<()> {
        if situation.len() == self.dim() {
            Ok(())
        } else {
            Err(XcsError::DimensionMismatch {
                expected: self.dim(),
                actual: situation.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_rejects_mismatched_bounds() {
        assert!(SituationSpace::new(vec![0.0, 0.0], vec![1.0]).is_err());
        assert!(SituationSpace::new(vec![2.0], vec![1.0]).is_err());
    }

    #[test]
    fn test_samples_stay_in_bounds() {
        let space = SituationSpace::new(vec![-1.0, 0.0, 5.0], vec![1.0, 0.5, 5.0]).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            assert!(space.contains(&space.sample(&mut rng)));
        }
    }
}
