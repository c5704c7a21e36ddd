//! Instance-local random sources.
//!
//! Every engine owns its source; nothing reads a global generator, so
//! sessions can run on any thread and tests can pin the draws.

use std::f64::consts::PI;

use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};
use rand_pcg::Pcg64;

/// Source of uniform and standard-normal deviates.
pub trait RandomSource {
    /// Uniform draw in `[0, 1)`.
    fn next_uniform(&mut self) -> f64;

    /// Standard normal draw (mean 0, stddev 1).
    ///
    /// The default is the Box-Muller transform over two uniforms. A zero
    /// first uniform is resampled since `ln(0)` is undefined.
    fn next_standard_normal(&mut self) -> f64 {
        let mut u1 = self.next_uniform();
        while u1 <= 0.0 {
            u1 = self.next_uniform();
        }
        let u2 = self.next_uniform();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }

    /// Uniform draw in `[low, high]`.
    #[inline]
    fn uniform_between(&mut self, low: f64, high: f64) -> f64 {
        low + self.next_uniform() * (high - low)
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn next_uniform(&mut self) -> f64 {
        (**self).next_uniform()
    }

    fn next_standard_normal(&mut self) -> f64 {
        (**self).next_standard_normal()
    }
}

impl<R: RandomSource + ?Sized> RandomSource for Box<R> {
    fn next_uniform(&mut self) -> f64 {
        (**self).next_uniform()
    }

    fn next_standard_normal(&mut self) -> f64 {
        (**self).next_standard_normal()
    }
}

/// PCG-backed source.
pub struct PcgSource {
    rng: Pcg64,
}

impl PcgSource {
    /// Seeded when `seed` is given, otherwise seeded from OS entropy.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => Pcg64::seed_from_u64(s),
            None => Pcg64::from_entropy(),
        };
        Self { rng }
    }
}

impl RandomSource for PcgSource {
    #[inline]
    fn next_uniform(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    #[inline]
    fn next_standard_normal(&mut self) -> f64 {
        StandardNormal.sample(&mut self.rng)
    }
}

/// Replays fixed sequences of normals and uniforms, wrapping around at the end.
///
/// An empty normal sequence yields `0.0` and an empty uniform sequence yields
/// `0.5`.
#[derive(Debug, Clone, Default)]
pub struct SequenceSource {
    normals: Vec<f64>,
    uniforms: Vec<f64>,
    normal_pos: usize,
    uniform_pos: usize,
}

impl SequenceSource {
    pub fn new(normals: Vec<f64>, uniforms: Vec<f64>) -> Self {
        Self {
            normals,
            uniforms,
            normal_pos: 0,
            uniform_pos: 0,
        }
    }

    /// Every normal draw is `z`, every uniform draw is `u`.
    pub fn constant(z: f64, u: f64) -> Self {
        Self::new(vec![z], vec![u])
    }

    pub fn normals_drawn(&self) -> usize {
        self.normal_pos
    }

    pub fn uniforms_drawn(&self) -> usize {
        self.uniform_pos
    }
}

impl RandomSource for SequenceSource {
    fn next_uniform(&mut self) -> f64 {
        if self.uniforms.is_empty() {
            return 0.5;
        }
        let u = self.uniforms[self.uniform_pos % self.uniforms.len()];
        self.uniform_pos += 1;
        u
    }

    fn next_standard_normal(&mut self) -> f64 {
        if self.normals.is_empty() {
            return 0.0;
        }
        let z = self.normals[self.normal_pos % self.normals.len()];
        self.normal_pos += 1;
        z
    }
}
