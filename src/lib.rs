//! Booking core for a hair salon: input validation, the four entity
//! repositories, hairdresser scheduling and service pricing.

pub mod auth;
pub mod booking;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod pricing;
pub mod repo;
pub mod schedule;
pub mod state;
pub mod validation;

pub use config::Config;
pub use error::{BookingError, Result};
pub use state::AppState;
