//! Physical observables and astrophysical models.

pub mod disk;
pub mod redshift;
pub mod spectrum;
