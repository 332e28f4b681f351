//! Seeded layer assignment for new nodes.
//!
//! Levels follow `P(level = L) ∝ exp(-L / mL)` with `mL = 1/ln(M)`. The
//! uniform source is a 32-bit linear congruential generator, so a seed and a
//! call sequence fully determine every level and therefore the graph shape.

/// Highest level a node can be assigned.
pub const MAX_LEVEL: usize = 15;

const LCG_MUL: u32 = 0x0019_660D;
const LCG_INC: u32 = 0x3C6E_F35F;

/// Deterministic level generator.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelGenerator {
    seed: u64,
    state: u32,
    level_mult: f64,
    draws: u64,
}

impl LevelGenerator {
    /// Creates a generator for an index with `max_connections` neighbors per node.
    ///
    /// Only the low 32 bits of `seed` feed the generator state.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // Reason: truncation to the low 32 bits is the seeding rule
    pub fn new(seed: u64, max_connections: usize) -> Self {
        Self {
            seed,
            state: seed as u32,
            level_mult: level_multiplier(max_connections),
            draws: 0,
        }
    }

    /// Seed this generator was created with.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of levels drawn so far.
    #[must_use]
    pub fn draws(&self) -> u64 {
        self.draws
    }

    /// Next uniform value in `[0, 1)`.
    fn next_uniform(&mut self) -> f64 {
        self.state = self.state.wrapping_mul(LCG_MUL).wrapping_add(LCG_INC);
        f64::from(self.state) / 4_294_967_296.0
    }

    /// Draws the level for the next node.
    // SAFETY: -ln(u) is non-negative for u in (0, 1] and the result is capped at MAX_LEVEL.
    // - cast_possible_truncation: floor() result is capped before use
    // - cast_sign_loss: the operand is never negative
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn next_level(&mut self) -> usize {
        let uniform = self.next_uniform().max(f64::MIN_POSITIVE);
        self.draws += 1;
        let level = (-uniform.ln() * self.level_mult).floor();
        (level as usize).min(MAX_LEVEL)
    }

    /// Level the next call to [`Self::next_level`] will return, without
    /// consuming it.
    #[must_use]
    pub fn peek_level(&self) -> usize {
        self.clone().next_level()
    }

    /// Discards the next `n` draws.
    pub fn skip(&mut self, n: u64) {
        for _ in 0..n {
            let _ = self.next_level();
        }
    }
}

/// `1 / ln(M)`, the normalization factor of the level distribution.
#[allow(clippy::cast_precision_loss)] // Reason: M is a small neighbor count
#[must_use]
pub fn level_multiplier(max_connections: usize) -> f64 {
    1.0 / (max_connections as f64).ln()
}
