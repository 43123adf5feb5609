//! Typed, validated run configuration.
//!
//! Deserialized from TOML by the CLI driver via `serde`; [`Config::validate`]
//! is a mandatory second pass that checks the cross-field invariants plain
//! deserialization cannot express (fractions summing to one, block size
//! dividing resolution, at least one image channel selected).

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Which coefficient source supplies the plugged physical model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    /// Analytic formula model (thin-disk synchrotron toy model).
    Formula,
    /// Volumetric fluid-snapshot model.
    Simulation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraModel {
    Plane,
    Pinhole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationPolicy {
    Additive,
    Multiplicative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlasmaModel {
    TiTeBeta,
    CodeKappa,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeometryConfig {
    /// Dimensionless black-hole spin a* in (-1, 1).
    pub spin: f64,
    /// Black hole mass in solar masses (used for SI unit conversions only;
    /// geodesic integration runs in geometric units with M = 1).
    pub mass_solar: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CameraConfig {
    pub model: CameraModel,
    pub radius: f64,
    pub inclination_deg: f64,
    pub azimuth_deg: f64,
    pub width: f64,
    pub resolution: u32,
    #[serde(default)]
    pub polar_axis: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RayTracingConfig {
    #[serde(default)]
    pub ray_flat: bool,
    pub termination_policy: TerminationPolicy,
    pub termination_factor: f64,
    pub initial_step: f64,
    pub max_steps: usize,
    pub max_retries: usize,
    pub tolerance_abs: f64,
    pub tolerance_rel: f64,
    #[serde(default = "default_min_step_factor")]
    pub min_step_factor: f64,
    #[serde(default = "default_max_step_factor")]
    pub max_step_factor: f64,
}

fn default_min_step_factor() -> f64 {
    0.2
}
fn default_max_step_factor() -> f64 {
    5.0
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ImageSelection {
    #[serde(default)]
    pub light: bool,
    #[serde(default)]
    pub time: bool,
    #[serde(default)]
    pub length: bool,
    #[serde(default)]
    pub lambda: bool,
    #[serde(default)]
    pub emission: bool,
    #[serde(default)]
    pub tau: bool,
    #[serde(default)]
    pub lambda_ave: bool,
    #[serde(default)]
    pub emission_ave: bool,
    #[serde(default)]
    pub tau_int: bool,
    #[serde(default)]
    pub render: bool,
}

impl ImageSelection {
    pub fn any_selected(&self) -> bool {
        self.light
            || self.time
            || self.length
            || self.lambda
            || self.emission
            || self.tau
            || self.lambda_ave
            || self.emission_ave
            || self.tau_int
            || self.render
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlasmaConfig {
    pub model: PlasmaModel,
    /// Electron-to-ion temperature ratio parameters (ti_te_beta model only).
    #[serde(default)]
    pub t_ratio_low_beta: Option<f64>,
    #[serde(default)]
    pub t_ratio_high_beta: Option<f64>,
    /// Kappa-distribution index (code_kappa model only).
    #[serde(default)]
    pub kappa_index: Option<f64>,
    /// Electron-population fractions (thermal, kappa, power-law); must sum to 1.
    pub population_fractions: [f64; 3],
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SlowLightConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub interpolate: bool,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default)]
    pub t_start: f64,
    #[serde(default = "default_dt")]
    pub dt: f64,
}

fn default_chunk_size() -> usize {
    1
}
fn default_dt() -> f64 {
    1.0
}

impl Default for SlowLightConfig {
    fn default() -> Self {
        Self { enabled: false, interpolate: false, chunk_size: default_chunk_size(), t_start: 0.0, dt: default_dt() }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RefinementCriterion {
    #[serde(default)]
    pub enabled: bool,
    pub cut: f64,
    pub fraction: f64,
}

impl Default for RefinementCriterion {
    fn default() -> Self {
        Self { enabled: false, cut: f64::INFINITY, fraction: 1.0 }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AdaptiveConfig {
    pub max_level: u32,
    pub block_size: u32,
    #[serde(default)]
    pub value: RefinementCriterion,
    #[serde(default)]
    pub gradient_abs: RefinementCriterion,
    #[serde(default)]
    pub gradient_rel: RefinementCriterion,
    #[serde(default)]
    pub laplacian_abs: RefinementCriterion,
    #[serde(default)]
    pub laplacian_rel: RefinementCriterion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureType {
    Rise,
    Fall,
    Fill,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RenderFeature {
    pub feature_type: FeatureType,
    pub value: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RenderImageConfig {
    pub name: String,
    pub features: Vec<RenderFeature>,
}

/// The full, validated run configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub model_type: ModelType,
    pub geometry: GeometryConfig,
    pub camera: CameraConfig,
    pub ray_tracing: RayTracingConfig,
    #[serde(default)]
    pub image_selection: ImageSelection,
    #[serde(default)]
    pub polarization: bool,
    pub plasma: PlasmaConfig,
    #[serde(default)]
    pub slow_light: SlowLightConfig,
    pub adaptive: AdaptiveConfig,
    #[serde(default)]
    pub render_images: Vec<RenderImageConfig>,
    #[serde(default)]
    pub num_threads: Option<usize>,
    #[serde(default)]
    pub fallback_nan: bool,
}

impl Config {
    /// Check cross-field invariants plain deserialization cannot express.
    /// Called by the CLI driver before constructing a [`crate::render::Renderer`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(-1.0..=1.0).contains(&self.geometry.spin) {
            return Err(ConfigError::SpinOutOfRange(self.geometry.spin));
        }
        if self.camera.resolution % self.adaptive.block_size != 0 {
            return Err(ConfigError::ResolutionNotDivisible {
                resolution: self.camera.resolution,
                block_size: self.adaptive.block_size,
            });
        }
        if !self.image_selection.any_selected() {
            return Err(ConfigError::NoImageSelected);
        }
        let sum: f64 = self.plasma.population_fractions.iter().sum();
        if (sum - 1.0).abs() > 1e-6 {
            return Err(ConfigError::FractionsDoNotSumToOne(sum));
        }
        if self.plasma.model == PlasmaModel::CodeKappa && self.plasma.kappa_index.is_none() {
            return Err(ConfigError::MissingField("plasma.kappa_index", self.model_type));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> Config {
        Config {
            model_type: ModelType::Formula,
            geometry: GeometryConfig { spin: 0.9, mass_solar: 1.0 },
            camera: CameraConfig {
                model: CameraModel::Pinhole,
                radius: 100.0,
                inclination_deg: 60.0,
                azimuth_deg: 0.0,
                width: 20.0,
                resolution: 64,
                polar_axis: false,
            },
            ray_tracing: RayTracingConfig {
                ray_flat: false,
                termination_policy: TerminationPolicy::Additive,
                termination_factor: 1e-3,
                initial_step: 0.01,
                max_steps: 10_000,
                max_retries: 20,
                tolerance_abs: 1e-8,
                tolerance_rel: 1e-8,
                min_step_factor: 0.2,
                max_step_factor: 5.0,
            },
            image_selection: ImageSelection { light: true, ..Default::default() },
            polarization: false,
            plasma: PlasmaConfig {
                model: PlasmaModel::TiTeBeta,
                t_ratio_low_beta: Some(1.0),
                t_ratio_high_beta: Some(10.0),
                kappa_index: None,
                population_fractions: [1.0, 0.0, 0.0],
            },
            slow_light: SlowLightConfig::default(),
            adaptive: AdaptiveConfig {
                max_level: 2,
                block_size: 16,
                value: RefinementCriterion::default(),
                gradient_abs: RefinementCriterion::default(),
                gradient_rel: RefinementCriterion::default(),
                laplacian_abs: RefinementCriterion::default(),
                laplacian_rel: RefinementCriterion::default(),
            },
            render_images: vec![],
            num_threads: None,
            fallback_nan: true,
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(sample_config().validate().is_ok());
    }

    #[test]
    fn resolution_must_divide_by_block_size() {
        let mut cfg = sample_config();
        cfg.camera.resolution = 65;
        assert!(matches!(cfg.validate(), Err(ConfigError::ResolutionNotDivisible { .. })));
    }

    #[test]
    fn at_least_one_image_required() {
        let mut cfg = sample_config();
        cfg.image_selection = ImageSelection::default();
        assert!(matches!(cfg.validate(), Err(ConfigError::NoImageSelected)));
    }

    #[test]
    fn fractions_must_sum_to_one() {
        let mut cfg = sample_config();
        cfg.plasma.population_fractions = [0.5, 0.5, 0.5];
        assert!(matches!(cfg.validate(), Err(ConfigError::FractionsDoNotSumToOne(_))));
    }
}
