pub mod classifier;
pub mod config;
pub mod confirm;
pub mod consts;
pub mod error;
pub mod evaluation;
pub mod features;
pub mod landmarks;
pub mod pipeline;
pub mod poses;
pub mod telemetry;
pub mod trace;
// cmd and reports are binary modules (see main.rs).
