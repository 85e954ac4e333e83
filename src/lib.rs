pub mod aggregator;
pub mod cell_projector;
pub mod config;
pub mod constants;
pub mod controller;
pub mod data_loader;
pub mod error;
pub mod geo_json;
pub mod hex_prototype;
pub mod instance_registry;
pub mod math_utils;
pub mod readings;
pub mod scene;
pub mod spring;
pub mod time_series;

pub use error::{Result, SolarHexError};
