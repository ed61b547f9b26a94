//! Measurement simulator - dips a virtual test strip into a solution
//!
//! A reading is the solution's reference pH plus uniform noise in
//! `[-amplitude/2, +amplitude/2]`, clamped to the pH scale. The strip takes
//! `delay` to develop, modelled with `tokio::time::sleep`; this is the only
//! suspending operation in the crate. Dropping or aborting the returned future
//! before it resolves cancels the measurement.
//!
//! ```rust
//! use std::time::Duration;
//! use ph_lab::catalog::SolutionCatalog;
//! use ph_lab::simulator::{FixedNoise, MeasurementSimulator};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> ph_lab::Result<()> {
//! let catalog = SolutionCatalog::builtin();
//! let mut simulator =
//!     MeasurementSimulator::new(FixedNoise::new(0.5), 0.2, Duration::from_millis(10));
//!
//! let reading = simulator.measure(catalog.by_id("lemon")?).await;
//! assert!((reading - 2.1).abs() < 1e-9);
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::catalog::{Solution, PH_MAX, PH_MIN};

/// Source of measurement noise.
///
/// Each call yields a fraction in `[-0.5, 0.5]` which the simulator scales by
/// its amplitude.
pub trait NoiseSource: Send {
    /// Next noise fraction.
    fn sample(&mut self) -> f64;
}

/// Uniform noise from any `rand` generator.
#[derive(Debug, Clone)]
pub struct RngNoise<R> {
    rng: R,
}

impl<R: Rng> RngNoise<R> {
    /// Wrap an existing generator.
    pub const fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngNoise<StdRng> {
    /// Reproducible noise from a fixed seed.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// Noise seeded from host entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng + Send> NoiseSource for RngNoise<R> {
    fn sample(&mut self) -> f64 {
        self.rng.gen_range(-0.5..=0.5)
    }
}

/// Constant noise, for deterministic tests and demos.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedNoise(f64);

impl FixedNoise {
    /// Constant fraction, clamped to `[-0.5, 0.5]`.
    #[must_use]
    pub fn new(fraction: f64) -> Self {
        Self(fraction.clamp(-0.5, 0.5))
    }
}

impl NoiseSource for FixedNoise {
    fn sample(&mut self) -> f64 {
        self.0
    }
}

/// Turns a reference pH into a noisy, delayed reading.
pub struct MeasurementSimulator {
    noise: Box<dyn NoiseSource>,
    amplitude: f64,
    delay: Duration,
}

impl MeasurementSimulator {
    /// Create a simulator.
    ///
    /// # Arguments
    ///
    /// * `noise` - Noise source (use `RngNoise::seeded` for reproducible runs)
    /// * `amplitude` - Full width of the noise band in pH units (0.2-0.3 is typical)
    /// * `delay` - How long the strip takes to develop
    #[must_use]
    pub fn new(noise: impl NoiseSource + 'static, amplitude: f64, delay: Duration) -> Self {
        Self {
            noise: Box::new(noise),
            amplitude,
            delay,
        }
    }

    /// Noise band width.
    #[must_use]
    pub const fn amplitude(&self) -> f64 {
        self.amplitude
    }

    /// Strip development time.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Draw a reading immediately, without the development delay.
    pub fn read(&mut self, true_ph: f64) -> f64 {
        let offset = self.noise.sample() * self.amplitude;
        (true_ph + offset).clamp(PH_MIN, PH_MAX)
    }

    /// Start a measurement of `solution`.
    ///
    /// The reading is drawn when this is called, so the order of noise samples
    /// follows the order of requests. The returned future resolves to it after
    /// the development delay.
    pub fn measure(&mut self, solution: &Solution) -> impl Future<Output = f64> + Send + 'static {
        let reading = self.read(solution.true_ph());
        let delay = self.delay;
        async move {
            tokio::time::sleep(delay).await;
            reading
        }
    }
}

impl std::fmt::Debug for MeasurementSimulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeasurementSimulator")
            .field("amplitude", &self.amplitude)
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lemon() -> Solution {
        Solution::new("lemon", "Lemon juice", 2.0)
    }

    #[test]
    fn test_fixed_noise_offsets_reading() {
        let mut sim = MeasurementSimulator::new(FixedNoise::new(0.5), 0.2, Duration::ZERO);
        assert!((sim.read(2.0) - 2.1).abs() < 1e-9);

        let mut sim = MeasurementSimulator::new(FixedNoise::new(-0.5), 0.3, Duration::ZERO);
        assert!((sim.read(7.0) - 6.85).abs() < 1e-9);
    }

    #[test]
    fn test_fixed_noise_is_clamped() {
        assert_eq!(FixedNoise::new(3.0), FixedNoise::new(0.5));
        assert_eq!(FixedNoise::new(-3.0), FixedNoise::new(-0.5));
    }

    #[test]
    fn test_reading_clamped_to_scale() {
        let mut sim = MeasurementSimulator::new(FixedNoise::new(-0.5), 0.3, Duration::ZERO);
        assert!(sim.read(0.0).abs() < f64::EPSILON);

        let mut sim = MeasurementSimulator::new(FixedNoise::new(0.5), 0.3, Duration::ZERO);
        assert!((sim.read(14.0) - 14.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_seeded_noise_is_reproducible() {
        let mut a = MeasurementSimulator::new(RngNoise::seeded(42), 0.3, Duration::ZERO);
        let mut b = MeasurementSimulator::new(RngNoise::seeded(42), 0.3, Duration::ZERO);
        for _ in 0..20 {
            assert!((a.read(5.0) - b.read(5.0)).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn test_random_noise_within_band() {
        let mut sim = MeasurementSimulator::new(RngNoise::seeded(7), 0.3, Duration::ZERO);
        for _ in 0..1000 {
            let reading = sim.read(9.0);
            assert!((reading - 9.0).abs() <= 0.15 + 1e-12, "reading {reading}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_measure_waits_for_delay() {
        let mut sim =
            MeasurementSimulator::new(FixedNoise::new(0.0), 0.2, Duration::from_millis(1500));
        let start = tokio::time::Instant::now();

        let reading = sim.measure(&lemon()).await;

        assert!((reading - 2.0).abs() < f64::EPSILON);
        assert!(start.elapsed() >= Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_measure_can_be_cancelled() {
        use tokio::time::{timeout, Duration};

        let mut sim =
            MeasurementSimulator::new(FixedNoise::new(0.0), 0.2, Duration::from_millis(1500));

        // Dropped by the timeout before the strip develops
        let result = timeout(Duration::from_millis(500), sim.measure(&lemon())).await;
        assert!(result.is_err());
    }
}
