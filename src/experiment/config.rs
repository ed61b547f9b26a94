//! Experiment configuration - mode, thresholds, noise and timing

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::catalog::{SolutionCatalog, BUILTIN_LEN};
use crate::{Error, Result};

/// Default noise band width in pH units.
pub const DEFAULT_NOISE_AMPLITUDE: f64 = 0.3;

/// Default strip development time.
pub const DEFAULT_MEASUREMENT_DELAY: Duration = Duration::from_millis(1500);

/// Distinct solutions the accuracy lab asks for.
pub const DEFAULT_REQUIRED_MEASUREMENTS: usize = 5;

/// Block id reported to the hosting page when none is configured.
pub const DEFAULT_BLOCK_ID: &str = "68551dec83bf93908974ebe6";

/// Which scoring policy drives the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Score each reading's accuracy against the known pH.
    Continuous,
    /// Measure every mystery beaker, then match letters to names.
    Identify,
}

/// Engine configuration.
///
/// Accepted as JSON from the hosting page (camelCase keys, delay in
/// milliseconds):
///
/// ```rust
/// use ph_lab::experiment::{ExperimentConfig, Mode};
///
/// let config = ExperimentConfig::from_json(
///     r#"{ "mode": "identify", "requiredDistinctMeasurements": 7, "measurementDelayMs": 1000 }"#,
/// )?;
/// assert_eq!(config.mode(), Mode::Identify);
/// assert_eq!(config.measurement_delay().as_millis(), 1000);
/// # Ok::<(), ph_lab::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentConfig {
    mode: Mode,
    #[serde(default = "default_required")]
    required_distinct_measurements: usize,
    #[serde(default = "default_noise")]
    noise_amplitude: f64,
    #[serde(
        rename = "measurementDelayMs",
        default = "default_delay",
        with = "delay_millis"
    )]
    measurement_delay: Duration,
    #[serde(default = "default_block_id")]
    block_id: String,
    #[serde(default = "default_auto_advance")]
    auto_advance: bool,
    #[serde(default)]
    seed: Option<u64>,
}

const fn default_required() -> usize {
    DEFAULT_REQUIRED_MEASUREMENTS
}

const fn default_noise() -> f64 {
    DEFAULT_NOISE_AMPLITUDE
}

const fn default_delay() -> Duration {
    DEFAULT_MEASUREMENT_DELAY
}

fn default_block_id() -> String {
    DEFAULT_BLOCK_ID.to_string()
}

const fn default_auto_advance() -> bool {
    true
}

mod delay_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(delay: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(delay.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

impl ExperimentConfig {
    /// The accuracy lab: five distinct solutions, 0.3 noise, 1.5 s strips.
    #[must_use]
    pub fn continuous() -> Self {
        Self::builder(Mode::Continuous).build()
    }

    /// The identification lab over a catalog of `catalog_size` beakers.
    #[must_use]
    pub fn identify(catalog_size: usize) -> Self {
        Self::builder(Mode::Identify)
            .required_distinct_measurements(catalog_size)
            .build()
    }

    /// Create a builder with the defaults for `mode`.
    ///
    /// Identify mode defaults to the built-in catalog's size.
    #[must_use]
    pub fn builder(mode: Mode) -> ExperimentConfigBuilder {
        ExperimentConfigBuilder::new(mode)
    }

    /// Parse a JSON config.
    ///
    /// # Errors
    ///
    /// Returns `Error::Serialization` on malformed JSON or an unknown mode.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Check the config against the catalog it will run on.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` if the required count is zero or larger
    /// than the catalog, the noise amplitude is negative or not finite, the
    /// block id is blank, or identify mode runs on an unlettered catalog or
    /// requires fewer than every solution.
    pub fn validate(&self, catalog: &SolutionCatalog) -> Result<()> {
        let required = self.required_distinct_measurements;
        if required == 0 || required > catalog.len() {
            return Err(Error::InvalidConfig(format!(
                "requiredDistinctMeasurements must be in 1..={}, got {required}",
                catalog.len()
            )));
        }
        if !self.noise_amplitude.is_finite() || self.noise_amplitude < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "noiseAmplitude must be a non-negative number, got {}",
                self.noise_amplitude
            )));
        }
        if self.block_id.trim().is_empty() {
            return Err(Error::InvalidConfig("blockId must not be blank".to_string()));
        }
        if self.mode == Mode::Identify {
            if !catalog.fully_lettered() {
                return Err(Error::InvalidConfig(
                    "identify mode needs a letter on every solution".to_string(),
                ));
            }
            if required != catalog.len() {
                return Err(Error::InvalidConfig(format!(
                    "identify mode must measure all {} solutions, got {required}",
                    catalog.len()
                )));
            }
        }
        Ok(())
    }

    /// Scoring policy.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Distinct solutions to measure before leaving the measuring phase.
    #[must_use]
    pub const fn required_distinct_measurements(&self) -> usize {
        self.required_distinct_measurements
    }

    /// Noise band width.
    #[must_use]
    pub const fn noise_amplitude(&self) -> f64 {
        self.noise_amplitude
    }

    /// Strip development time.
    #[must_use]
    pub const fn measurement_delay(&self) -> Duration {
        self.measurement_delay
    }

    /// Block id carried by the completion event.
    #[must_use]
    pub fn block_id(&self) -> &str {
        &self.block_id
    }

    /// Whether identify mode enters the associating phase on its own.
    #[must_use]
    pub const fn auto_advance(&self) -> bool {
        self.auto_advance
    }

    /// Noise seed, if reproducible readings were requested.
    #[must_use]
    pub const fn seed(&self) -> Option<u64> {
        self.seed
    }
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self::continuous()
    }
}

/// Builder for `ExperimentConfig`.
#[derive(Debug)]
pub struct ExperimentConfigBuilder {
    config: ExperimentConfig,
}

impl ExperimentConfigBuilder {
    /// Create a new builder with the defaults for `mode`.
    #[must_use]
    pub fn new(mode: Mode) -> Self {
        let required = match mode {
            Mode::Continuous => DEFAULT_REQUIRED_MEASUREMENTS,
            Mode::Identify => BUILTIN_LEN,
        };
        Self {
            config: ExperimentConfig {
                mode,
                required_distinct_measurements: required,
                noise_amplitude: DEFAULT_NOISE_AMPLITUDE,
                measurement_delay: DEFAULT_MEASUREMENT_DELAY,
                block_id: default_block_id(),
                auto_advance: true,
                seed: None,
            },
        }
    }

    /// Set the number of distinct solutions to measure.
    #[must_use]
    pub fn required_distinct_measurements(mut self, count: usize) -> Self {
        self.config.required_distinct_measurements = count;
        self
    }

    /// Set the noise band width.
    #[must_use]
    pub fn noise_amplitude(mut self, amplitude: f64) -> Self {
        self.config.noise_amplitude = amplitude;
        self
    }

    /// Set the strip development time.
    #[must_use]
    pub fn measurement_delay(mut self, delay: Duration) -> Self {
        self.config.measurement_delay = delay;
        self
    }

    /// Set the block id reported on completion.
    #[must_use]
    pub fn block_id(mut self, block_id: impl Into<String>) -> Self {
        self.config.block_id = block_id.into();
        self
    }

    /// Require an explicit `advance()` before associating.
    #[must_use]
    pub fn auto_advance(mut self, enabled: bool) -> Self {
        self.config.auto_advance = enabled;
        self
    }

    /// Seed the noise source.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Build the `ExperimentConfig`.
    #[must_use]
    pub fn build(self) -> ExperimentConfig {
        self.config
    }
}
