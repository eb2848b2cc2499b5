use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of randomness for every stochastic decision in the pipeline.
pub trait Entropy: Send {
    /// Uniform value in `[0, 1)`.
    fn unit(&mut self) -> f64;

    /// Uniform index in `0..len`. `len` must be non-zero.
    fn index(&mut self, len: usize) -> usize {
        let i = (self.unit() * len as f64) as usize;
        i.min(len.saturating_sub(1))
    }

    /// True with probability `p`.
    fn chance(&mut self, p: f64) -> bool {
        self.unit() < p
    }

    /// Uniform integer in `lo..=hi`.
    fn between(&mut self, lo: i64, hi: i64) -> i64 {
        if hi <= lo {
            return lo;
        }
        lo + self.index((hi - lo + 1) as usize) as i64
    }
}

/// OS-seeded generator used at runtime.
#[derive(Debug)]
pub struct ThreadEntropy(StdRng);

impl ThreadEntropy {
    pub fn new() -> Self {
        Self(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl Default for ThreadEntropy {
    fn default() -> Self {
        Self::new()
    }
}

impl Entropy for ThreadEntropy {
    fn unit(&mut self) -> f64 {
        self.0.gen_range(0.0..1.0)
    }
}

/// Replays a fixed sequence of unit values, cycling when exhausted.
#[derive(Debug, Clone)]
pub struct ScriptedEntropy {
    values: Vec<f64>,
    pos: usize,
}

impl ScriptedEntropy {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values, pos: 0 }
    }

    /// Always returns `v`.
    pub fn constant(v: f64) -> Self {
        Self::new(vec![v])
    }
}

impl Entropy for ScriptedEntropy {
    fn unit(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let v = self.values[self.pos % self.values.len()];
        self.pos += 1;
        v.clamp(0.0, 0.999_999)
    }
}
