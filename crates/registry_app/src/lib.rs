//! Registry scraper binary support: configuration, logging and the
//! search runner that writes JSON lines.
pub mod config;
pub mod logging;
pub mod runner;
