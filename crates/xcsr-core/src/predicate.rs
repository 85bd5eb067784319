//! Interval predicates and the matching rules over them
//!
//! A predicate holds one [`Condition`] per situation attribute. A condition
//! is either the wildcard, which accepts any value, or a closed interval
//! `[lo, hi]`.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{Situation, SituationSpace};

/// Closed interval `[lo, hi]` with `lo <= hi`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    /// Lower bound (inclusive)
    pub lo: f64,
    /// Upper bound (inclusive)
    pub hi: f64,
}

impl Interval {
    /// Build an interval, swapping the bounds if given out of order
    #[must_use]
    pub fn new(a: f64, b: f64) -> Self {
        if a <= b {
            Self { lo: a, hi: b }
        } else {
            Self { lo: b, hi: a }
        }
    }

    /// Random interval around `center`. Each side extends by an independent
    /// `U(0, half_width)` draw, and the result is clipped to `[low, high]`.
    pub fn around<R: Rng + ?Sized>(
        center: f64,
        half_width: f64,
        (low, high): (f64, f64),
        rng: &mut R,
    ) -> Self {
        let lo = center - rng.gen::<f64>() * half_width;
        let hi = center + rng.gen::<f64>() * half_width;
        Self {
            lo: lo.clamp(low, high),
            hi: hi.clamp(low, high),
        }
    }

    /// Whether `x` lies in the interval
    #[must_use]
    pub fn contains(&self, x: f64) -> bool {
        self.lo <= x && x <= self.hi
    }

    /// Whether `other` lies entirely inside this interval
    #[must_use]
    pub fn covers(&self, other: &Interval) -> bool {
        self.lo <= other.lo && other.hi <= self.hi
    }

    /// `hi - lo`
    #[must_use]
    pub fn width(&self) -> f64 {
        self.hi - self.lo
    }
}

/// Per-attribute condition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    /// Matches any value
    Wildcard,
    /// Matches values inside the interval
    Range(Interval),
}

impl Condition {
    /// Whether the attribute value passes this condition
    #[must_use]
    pub fn accepts(&self, x: f64) -> bool {
        match self {
            Self::Wildcard => true,
            Self::Range(interval) => interval.contains(x),
        }
    }

    /// Whether every value accepted by `other` is accepted by `self`
    #[must_use]
    pub fn is_at_least_as_general(&self, other: &Condition) -> bool {
        match (self, other) {
            (Self::Wildcard, _) => true,
            (Self::Range(_), Self::Wildcard) => false,
            (Self::Range(a), Self::Range(b)) => a.covers(b),
        }
    }

    /// Whether this is the wildcard
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::Wildcard)
    }
}

/// Ordered list of conditions, one per situation attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate(pub Vec<Condition>);

impl Predicate {
    /// Predicate made only of wildcards
    #[must_use]
    pub fn general(dim: usize) -> Self {
        Self(vec![Condition::Wildcard; dim])
    }

    /// Covering predicate for `situation`: each attribute is the wildcard
    /// with probability `p_sharp`, otherwise a random interval around the
    /// situation value.
    pub fn cover<R: Rng + ?Sized>(
        situation: &Situation,
        space: &SituationSpace,
        p_sharp: f64,
        half_width: f64,
        rng: &mut R,
    ) -> Self {
        let conditions = situation
            .values()
            .iter()
            .enumerate()
            .map(|(i, &x)| {
                if rng.gen::<f64>() < p_sharp {
                    Condition::Wildcard
                } else {
                    Condition::Range(Interval::around(x, half_width, space.bounds(i), rng))
                }
            })
            .collect();
        Self(conditions)
    }

    /// Number of attributes
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the predicate has no attributes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Conditions in attribute order
    #[must_use]
    pub fn conditions(&self) -> &[Condition] {
        &self.0
    }

    /// Mutable access to the conditions
    pub fn conditions_mut(&mut self) -> &mut [Condition] {
        &mut self.0
    }

    /// True iff every attribute of `situation` passes its condition
    #[must_use]
    pub fn matches(&self, situation: &Situation) -> bool {
        self.0.len() == situation.len()
            && self
                .0
                .iter()
                .zip(situation.values())
                .all(|(c, &x)| c.accepts(x))
    }

    /// True iff this predicate accepts a superset of what `other` accepts
    #[must_use]
    pub fn is_more_general(&self, other: &Predicate) -> bool {
        self.0.len() == other.0.len()
            && self
                .0
                .iter()
                .zip(&other.0)
                .all(|(a, b)| a.is_at_least_as_general(b))
    }

    /// Number of wildcard conditions
    #[must_use]
    pub fn wildcards(&self) -> usize {
        self.0.iter().filter(|c| c.is_wildcard()).count()
    }

    /// Summed interval width over the non-wildcard conditions
    #[must_use]
    pub fn interval_width(&self) -> f64 {
        self.0
            .iter()
            .map(|c| match c {
                Condition::Wildcard => 0.0,
                Condition::Range(i) => i.width(),
            })
            .sum()
    }

    /// Swap the conditions in `[from, to)` between two predicates.
    ///
    /// Bounds are clamped to the predicate length.
    pub fn swap_segment(&mut self, other: &mut Predicate, from: usize, to: usize) {
        let to = to.min(self.0.len()).min(other.0.len());
        for i in from..to {
            std::mem::swap(&mut self.0[i], &mut other.0[i]);
        }
    }
}

impl std::fmt::Display for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (i, c) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            match c {
                Condition::Wildcard => write!(f, "#")?,
                Condition::Range(r) => write!(f, "{:.3}..{:.3}", r.lo, r.hi)?,
            }
        }
        write!(f, "]")
    }
}
