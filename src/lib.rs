pub mod config;
pub mod dispersion;
pub mod environment;
pub mod export;
pub mod web;

pub use config::ServiceConfig;
pub use dispersion::{generate_dispersion_field, DispersionField, DispersionModel, SimulationInput};
