//! The top-level orchestrator: wires the camera, metric, coefficient model,
//! and transfer integrator together into a full adaptive render.
//!
//! One [`Renderer`] is built per run from a validated [`Config`]. Rendering
//! proceeds level by level: every tile at the current level is traced once
//! (one ray through its center pixel, in parallel across tiles via `rayon`),
//! the resulting value is fanned out to every device pixel the tile covers,
//! and a refinement pass decides which tiles split for the next level.

use std::collections::HashMap;

use rayon::prelude::*;

use crate::adaptive::{PlaneSample, RefinementController, Tile};
use crate::camera::{Camera, PixelModel};
use crate::coefficients::{CoefficientBinder, CoefficientModel, FormulaModel, SimulationModel, UniformGrid};
use crate::config::{CameraModel, Config, ModelType};
use crate::error::BlacklightError;
use crate::geodesic::{IntegrationOptions, integrate};
use crate::metric::{HamiltonianGradient, Kerr, Metric, Minkowski, Orbit};
use crate::pyramid::Pyramid;
use crate::sampler::resample;
use crate::tensor::MetricTensor4;
use crate::transfer::{polarized, unpolarized, StokesVector};

/// The spacetime a render traces through: either the configured Kerr
/// geometry, or flat Minkowski when `ray_tracing.ray_flat` substitutes it
/// for validation against the closed-form transfer solution (spec scenario
/// S3). The coefficient model still sizes itself off the Kerr geometry's
/// ISCO regardless of which metric traces the rays.
enum ActiveMetric {
    Kerr(Kerr),
    Flat(Minkowski),
}

impl Metric for ActiveMetric {
    fn covariant(&self, x: [f64; 3]) -> MetricTensor4 {
        match self {
            ActiveMetric::Kerr(m) => m.covariant(x),
            ActiveMetric::Flat(m) => m.covariant(x),
        }
    }

    fn contravariant(&self, x: [f64; 3]) -> MetricTensor4 {
        match self {
            ActiveMetric::Kerr(m) => m.contravariant(x),
            ActiveMetric::Flat(m) => m.contravariant(x),
        }
    }

    fn mass(&self) -> f64 {
        match self {
            ActiveMetric::Kerr(m) => m.mass(),
            ActiveMetric::Flat(m) => m.mass(),
        }
    }

    fn spin(&self) -> f64 {
        match self {
            ActiveMetric::Kerr(m) => m.spin(),
            ActiveMetric::Flat(m) => m.spin(),
        }
    }

    fn event_horizon(&self) -> f64 {
        match self {
            ActiveMetric::Kerr(m) => m.event_horizon(),
            ActiveMetric::Flat(m) => m.event_horizon(),
        }
    }

    fn hamiltonian_gradient(&self, x: [f64; 3], p: [f64; 4]) -> HamiltonianGradient {
        match self {
            ActiveMetric::Kerr(m) => m.hamiltonian_gradient(x, p),
            ActiveMetric::Flat(m) => m.hamiltonian_gradient(x, p),
        }
    }

    fn kerr_schild_radius(&self, x: [f64; 3]) -> f64 {
        match self {
            ActiveMetric::Kerr(m) => m.kerr_schild_radius(x),
            ActiveMetric::Flat(m) => m.kerr_schild_radius(x),
        }
    }
}

/// The EHT-band observing frequency this renderer evaluates coefficients
/// at, absent a dedicated config field for it.
const DEFAULT_OBSERVING_FREQUENCY_HZ: f64 = 2.3e11;

/// The auxiliary scalar channels named in `ImageSelection`, besides
/// `light`/`render` (carried in `intensity`). Only populated in unpolarized
/// mode, since the Stokes transport doesn't track these integrals.
const AUX_CHANNELS: [&str; 8] =
    ["time", "length", "lambda", "emission", "tau", "lambda_ave", "emission_ave", "tau_int"];

fn aux_channel_value(result: &unpolarized::UnpolarizedResult, channel: &str) -> f64 {
    match channel {
        "time" => result.emission_time,
        "length" => result.emission_length,
        "lambda" => result.total_lambda,
        "emission" => result.emission_integral,
        "tau" => result.optical_depth,
        "lambda_ave" => result.lambda_ave(),
        "emission_ave" => result.emission_ave(),
        "tau_int" => result.tau_integral,
        _ => 0.0,
    }
}

/// One finished render: a dense intensity buffer, plus a sparse polarized
/// buffer when `config.polarization` was set, plus one dense buffer per
/// selected auxiliary channel (spec's image-selection diagnostic maps).
pub struct RenderOutput {
    pub width: u32,
    pub height: u32,
    pub intensity: Vec<f64>,
    pub stokes: Option<HashMap<(u32, u32), StokesVector>>,
    pub channels: HashMap<String, Vec<f64>>,
    pub levels_run: u32,
}

/// A fully constructed render pipeline for one spacetime and one physical
/// model, ready to trace every pixel of its camera.
pub struct Renderer {
    metric: ActiveMetric,
    camera: Camera,
    model: Box<dyn CoefficientModel>,
    options: IntegrationOptions,
    refinement: RefinementController,
    polarization: bool,
    fallback_nan: bool,
    nu_camera: f64,
    image_selection: crate::config::ImageSelection,
}

impl Renderer {
    /// Build a renderer from a config that has already passed
    /// [`Config::validate`]. Construction never fails once validated --
    /// the model-type branch here runs exactly once, not per-ray.
    pub fn from_config(config: &Config) -> Result<Self, BlacklightError> {
        config.validate()?;

        // The coefficient model always sizes itself off the real Kerr
        // geometry; `ray_flat` only substitutes the metric the geodesic
        // integrator traces through, for the flat-slab validation in S3.
        let kerr = Kerr::new(1.0, config.geometry.spin);
        let orbit = if config.geometry.spin >= 0.0 { Orbit::Prograde } else { Orbit::Retrograde };
        let r_isco = kerr.isco(orbit);
        let metric = if config.ray_tracing.ray_flat { ActiveMetric::Flat(Minkowski) } else { ActiveMetric::Kerr(kerr) };

        let pixel_model = match config.camera.model {
            CameraModel::Plane => PixelModel::Plane,
            CameraModel::Pinhole => PixelModel::Pinhole,
        };
        let camera = Camera::new(
            config.camera.radius,
            config.camera.inclination_deg,
            config.camera.azimuth_deg,
            config.camera.width,
            config.camera.resolution,
            pixel_model,
            config.camera.polar_axis,
        );

        let model: Box<dyn CoefficientModel> = match config.model_type {
            ModelType::Formula => {
                Box::new(FormulaModel::new(kerr, 1.0, 40.0 * r_isco.max(1.0), 1.0))
            }
            ModelType::Simulation => Box::new(SimulationModel::new(UniformGrid {
                r_in: r_isco,
                r_out: 40.0 * r_isco.max(1.0),
                density_0: 1.0,
                temperature_0: 1e10,
                b_field_0: 10.0,
                power_law_index: 1.5,
            })),
        };

        let options = IntegrationOptions {
            tolerance_abs: config.ray_tracing.tolerance_abs,
            tolerance_rel: config.ray_tracing.tolerance_rel,
            initial_step: config.ray_tracing.initial_step,
            max_steps: config.ray_tracing.max_steps,
            max_retries: config.ray_tracing.max_retries,
            escape_radius: config.camera.radius * 2.0,
            min_step: config.ray_tracing.initial_step * config.ray_tracing.min_step_factor,
            max_step: config.ray_tracing.initial_step * config.ray_tracing.max_step_factor * 100.0,
            ..Default::default()
        };

        let refinement = RefinementController::new(config.adaptive.clone());

        Ok(Self {
            metric,
            camera,
            model,
            options,
            refinement,
            polarization: config.polarization,
            fallback_nan: config.fallback_nan,
            nu_camera: DEFAULT_OBSERVING_FREQUENCY_HZ,
            image_selection: config.image_selection.clone(),
        })
    }

    /// Run the full adaptive render to completion.
    pub fn render(&self) -> RenderOutput {
        let width = self.camera.resolution;
        let height = self.camera.resolution;

        let mut intensity_pyramid = Pyramid::new(width, height);
        let mut stokes_map: Option<HashMap<(u32, u32), StokesVector>> =
            self.polarization.then(HashMap::new);

        let selected_aux: Vec<&str> = AUX_CHANNELS
            .iter()
            .copied()
            .filter(|name| match *name {
                "time" => self.image_selection.time,
                "length" => self.image_selection.length,
                "lambda" => self.image_selection.lambda,
                "emission" => self.image_selection.emission,
                "tau" => self.image_selection.tau,
                "lambda_ave" => self.image_selection.lambda_ave,
                "emission_ave" => self.image_selection.emission_ave,
                "tau_int" => self.image_selection.tau_int,
                _ => false,
            })
            .collect();
        let mut aux_pyramids: HashMap<&str, Pyramid> =
            selected_aux.iter().map(|name| (*name, Pyramid::new(width, height))).collect();

        let mut tiles = self.refinement.base_tiles(width, height);
        let mut levels_run = 0;

        loop {
            let binder = CoefficientBinder::new(self.model.as_ref(), self.nu_camera, self.fallback_nan);

            let results: Vec<(Tile, f64, Option<StokesVector>, Option<unpolarized::UnpolarizedResult>)> = tiles
                .par_iter()
                .map(|tile| {
                    let cx = (tile.x0 + tile.size / 2).min(width - 1);
                    let cy = (tile.y0 + tile.size / 2).min(height - 1);
                    let ray = self.camera.initial_ray(&self.metric, cx, cy);
                    let trajectory = integrate(&ray, &self.metric, &self.options);
                    let samples = resample(&trajectory, &self.metric);

                    if self.polarization {
                        let result =
                            polarized::transport(&samples, &binder, &self.metric, |_| [1.0, 0.0, 0.0, 0.0]);
                        (*tile, result.stokes.i, Some(result.stokes), None)
                    } else {
                        let result =
                            unpolarized::transport(&samples, &binder, &self.metric, |_| [1.0, 0.0, 0.0, 0.0]);
                        (*tile, result.intensity, None, Some(result))
                    }
                })
                .collect();

            for (tile, value, stokes, aux) in &results {
                intensity_pyramid.fill_tile(tile, *value);
                if let (Some(map), Some(s)) = (stokes_map.as_mut(), stokes) {
                    for dy in 0..tile.size {
                        for dx in 0..tile.size {
                            map.insert((tile.x0 + dx, tile.y0 + dy), *s);
                        }
                    }
                }
                if let Some(aux) = aux {
                    for name in &selected_aux {
                        let pyramid = aux_pyramids.get_mut(name).expect("pyramid pre-allocated per selected channel");
                        pyramid.fill_tile(tile, aux_channel_value(aux, name));
                    }
                }
            }

            let flat = intensity_pyramid.flatten(f64::NAN);
            let plane = PlaneSample { width, height, values: &flat };

            let mut next_tiles = Vec::new();
            for (tile, _, _, _) in &results {
                if self.refinement.should_refine(tile, &plane) {
                    next_tiles.extend(tile.split());
                }
            }

            levels_run += 1;
            if next_tiles.is_empty() {
                break;
            }
            tiles = next_tiles;
        }

        let channels = aux_pyramids
            .into_iter()
            .map(|(name, pyramid)| (name.to_string(), pyramid.flatten(0.0)))
            .collect();

        RenderOutput {
            width,
            height,
            intensity: intensity_pyramid.flatten(0.0),
            stokes: stokes_map,
            channels,
            levels_run,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::*;

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
                resolution: 8,
                polar_axis: false,
            },
            ray_tracing: RayTracingConfig {
                ray_flat: false,
                termination_policy: TerminationPolicy::Additive,
                termination_factor: 1e-3,
                initial_step: 0.05,
                max_steps: 2_000,
                max_retries: 20,
                tolerance_abs: 1e-6,
                tolerance_rel: 1e-6,
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
                max_level: 1,
                block_size: 4,
                value: RefinementCriterion::default(),
                gradient_abs: RefinementCriterion::default(),
                gradient_rel: RefinementCriterion::default(),
                laplacian_abs: RefinementCriterion::default(),
                laplacian_rel: RefinementCriterion::default(),
            },
            render_images: Vec::new(),
            num_threads: None,
            fallback_nan: false,
        }
    }

    #[test]
    fn renders_a_full_intensity_buffer() {
        let config = sample_config();
        let renderer = Renderer::from_config(&config).unwrap();
        let output = renderer.render();
        assert_eq!(output.intensity.len(), (output.width * output.height) as usize);
        assert!(output.intensity.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn polarization_populates_the_stokes_map() {
        let mut config = sample_config();
        config.polarization = true;
        let renderer = Renderer::from_config(&config).unwrap();
        let output = renderer.render();
        assert!(output.stokes.is_some());
        assert!(!output.stokes.unwrap().is_empty());
    }
}
