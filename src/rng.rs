use serde::{Deserialize, Serialize};

const LCG_MULTIPLIER: u64 = 6_364_136_223_846_793_005;
const LCG_INCREMENT: u64 = 1_442_695_040_888_963_407;
const UNIT_SCALE: f64 = 1.0 / (1u64 << 53) as f64;

/// Source of uniform variates in `[0, 1)`.
pub trait RandomSource {
    fn next_unit(&mut self) -> f64;
}

/// 64-bit linear congruential generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lcg {
    state: u64,
}

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(LCG_MULTIPLIER)
            .wrapping_add(LCG_INCREMENT);
        self.state
    }
}

impl RandomSource for Lcg {
    fn next_unit(&mut self) -> f64 {
        // High bits only; the low bits of a power-of-two LCG cycle quickly.
        (self.next_u64() >> 11) as f64 * UNIT_SCALE
    }
}

/// Unit normal variates by the polar Box-Muller method.
///
/// Each accepted pair yields two variates; the second is kept as a spare and
/// returned by the next call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GaussianSampler {
    spare: Option<f64>,
}

impl GaussianSampler {
    pub fn new() -> Self {
        Self { spare: None }
    }

    pub fn unit_normal<R: RandomSource + ?Sized>(&mut self, source: &mut R) -> f64 {
        if let Some(spare) = self.spare.take() {
            return spare;
        }

        loop {
            let v1 = 2.0 * source.next_unit() - 1.0;
            let v2 = 2.0 * source.next_unit() - 1.0;
            let rsq = v1 * v1 + v2 * v2;
            if rsq >= 1.0 || rsq == 0.0 {
                continue;
            }

            let factor = (-2.0 * rsq.ln() / rsq).sqrt();
            self.spare = Some(v1 * factor);
            return v2 * factor;
        }
    }

    /// Zero-mean normal variate with the given standard deviation.
    pub fn normal<R: RandomSource + ?Sized>(&mut self, source: &mut R, std_dev: f64) -> f64 {
        std_dev * self.unit_normal(source)
    }

    pub fn has_spare(&self) -> bool {
        self.spare.is_some()
    }
}

/// A uniform source paired with its own Gaussian sampler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Noise<R = Lcg> {
    source: R,
    sampler: GaussianSampler,
}

impl<R: RandomSource> Noise<R> {
    pub fn new(source: R) -> Self {
        Self {
            source,
            sampler: GaussianSampler::new(),
        }
    }

    pub fn uniform(&mut self) -> f64 {
        self.source.next_unit()
    }

    pub fn normal(&mut self, std_dev: f64) -> f64 {
        self.sampler.normal(&mut self.source, std_dev)
    }
}

impl Noise<Lcg> {
    pub fn seeded(seed: u64) -> Self {
        Self::new(Lcg::new(seed))
    }
}
