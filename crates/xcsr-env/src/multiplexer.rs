//! Single-step real-valued multiplexers

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use xcsr_core::{
    Action, ActionSpace, Environment, Outcome, Result, Situation, SituationSpace, XcsError,
};

/// Real-valued multiplexer configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiplexerConfig {
    /// Number of address attributes `k`; the situation has `k + 2^k` values
    pub address_bits: u32,
}

impl Default for MultiplexerConfig {
    fn default() -> Self {
        Self { address_bits: 2 }
    }
}

/// Real-valued multiplexer.
///
/// Every attribute is drawn uniformly from `[0, 1]` and read as a bit by
/// rounding at 0.5. The first `k` bits address one of the `2^k` data bits;
/// the correct action is the addressed bit. Every commit ends the episode
/// and draws a fresh situation.
pub struct RealMultiplexer {
    config: MultiplexerConfig,
    space: SituationSpace,
    current: Situation,
    rng: StdRng,
}

impl RealMultiplexer {
    /// Multiplexer seeded with `seed`
    pub fn new(config: MultiplexerConfig, seed: u64) -> Result<Self> {
        if config.address_bits == 0 || config.address_bits > 10 {
            return Err(XcsError::Environment(format!(
                "multiplexer needs 1..=10 address bits, got {}",
                config.address_bits
            )));
        }
        let dim = config.address_bits as usize + (1usize << config.address_bits);
        let space = SituationSpace::uniform(dim, 0.0, 1.0);
        let mut rng = StdRng::seed_from_u64(seed);
        let current = space.sample(&mut rng);
        tracing::debug!(address_bits = config.address_bits, dim, "multiplexer created");
        Ok(Self {
            config,
            space,
            current,
            rng,
        })
    }

    /// Correct action for `situation`
    #[must_use]
    pub fn correct_action(&self, situation: &Situation) -> Action {
        let k = self.config.address_bits as usize;
        let bit = |x: f64| usize::from(x >= 0.5);
        let address = situation.values()[..k]
            .iter()
            .fold(0usize, |acc, &x| (acc << 1) | bit(x));
        Action(bit(situation[k + address]))
    }
}

impl Environment for RealMultiplexer {
    fn name(&self) -> &str {
        "multiplexer"
    }

    fn situation_space(&self) -> &SituationSpace {
        &self.space
    }

    fn action_space(&self) -> ActionSpace {
        ActionSpace::new(2)
    }

    fn situation(&self) -> Situation {
        self.current.clone()
    }

    fn commit(&mut self, action: Action) -> Result<Outcome> {
        if !self.action_space().contains(action) {
            return Err(XcsError::InvalidAction(format!("{action} on a binary multiplexer")));
        }
        let reward = if action == self.correct_action(&self.current) { 1.0 } else { 0.0 };
        self.current = self.space.sample(&mut self.rng);
        Ok(Outcome::terminal(reward))
    }

    fn reset(&mut self) -> Result<()> {
        self.current = self.space.sample(&mut self.rng);
        Ok(())
    }

    fn is_terminated(&self) -> bool {
        false
    }
}
