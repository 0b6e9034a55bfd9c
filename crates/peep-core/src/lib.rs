//! Core Peep library (config, OAuth, People API client).

pub mod auth;
pub mod config;
pub mod interrupt;
pub mod logging;
pub mod people;
