//! HTTP front end for the grade predictor

pub mod api;
pub mod config;
