//! The crate's error taxonomy.
//!
//! Per-ray failures (geometry, integrator divergence, transfer anomalies)
//! never abort a render; they flag the offending pixel and the renderer
//! continues. Configuration and I/O errors are fatal and propagate to the
//! driver.

use thiserror::Error;

/// Invalid or inconsistent run configuration. Fatal at construction.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required field `{0}` for model_type = {1:?}")]
    MissingField(&'static str, crate::config::ModelType),

    #[error("spin a* = {0} is out of range (-1, 1)")]
    SpinOutOfRange(f64),

    #[error("camera resolution {resolution} is not divisible by adaptive block size {block_size}")]
    ResolutionNotDivisible { resolution: u32, block_size: u32 },

    #[error("no image selected: at least one of {{light, time, length, lambda, emission, tau, lambda_ave, emission_ave, tau_int, render}} must be true")]
    NoImageSelected,

    #[error("electron population fractions sum to {0}, expected 1.0 (+- 1e-6)")]
    FractionsDoNotSumToOne(f64),

    #[error("unknown plasma model `{0}`")]
    UnknownPlasmaModel(String),
}

/// Per-ray geometry failure: the implicit Kerr-Schild radial solve or a
/// metric inversion did not converge to a finite result.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("Kerr-Schild radial solve diverged at x = {0:?}")]
    RadialSolveDiverged([f64; 3]),

    #[error("metric inversion produced a non-finite component at x = {0:?}")]
    SingularMetric([f64; 3]),
}

/// Per-ray integrator failure: the geodesic stepper could not make progress.
#[derive(Debug, Error)]
pub enum IntegratorError {
    #[error("adaptive step size underflowed below the minimum after {0} retries")]
    RetriesExhausted(usize),

    #[error("geodesic state went non-finite after {0} steps")]
    NonFiniteState(usize),
}

/// Per-sample radiative-transfer anomaly. Recovered by clamping, not fatal.
#[derive(Debug, Error)]
pub enum TransferAnomaly {
    #[error("negative absorptivity alpha_I = {0} at sample; clamped to 0")]
    NegativeAbsorptivity(f64),

    #[error("non-finite Stokes vector produced at optical depth {0}")]
    NonFiniteStokes(f64),
}

/// Checkpoint or output file I/O failure. Fatal, propagated to the driver.
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("bad magic header: expected {expected:?}, found {found:?}")]
    BadMagic { expected: [u8; 4], found: [u8; 4] },

    #[error("unsupported checkpoint version {found}, expected {expected}")]
    UnsupportedVersion { expected: u32, found: u32 },

    #[error("shape mismatch: checkpoint has {checkpoint_dims:?}, renderer expects {renderer_dims:?}")]
    ShapeMismatch { checkpoint_dims: Vec<usize>, renderer_dims: Vec<usize> },

    #[error("encoding error: {0}")]
    Encoding(#[from] Box<bincode::ErrorKind>),
}

/// The unified error type crossing the library/driver boundary.
#[derive(Debug, Error)]
pub enum BlacklightError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
