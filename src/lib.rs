//! HazardMap Library
//!
//! This library provides the core of a disaster-response hazard map viewer:
//! grouping KML data files into togglable categories, keeping layer
//! visibility consistent with group, file and zoom state, and correlating
//! deep links against the loaded markers.

// Module declarations
pub mod cli;
pub mod config;
pub mod constants;
pub mod map;
pub mod models;
pub mod parser;
pub mod services;
