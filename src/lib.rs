//! AutoML Studio - train, save, load and predict with AutoML
//!
//! A small web demo that trains an AutoML model on the wine dataset, saves it
//! to disk, loads it back and shows predictions on the held-out rows.
//!
//! # Modules
//!
//! ## Library
//! - [`dataset`] - Bundled wine dataset and train/test splitting
//! - [`training`] - AutoML search over classifier families
//! - [`export`] - Saving and loading trained models
//!
//! ## Demo
//! - [`workflow`] - Session state and the setup / train / predict workflows
//! - [`ui`] - Form description and HTML rendering
//! - [`config`] - Demo settings
//!
//! ## Services
//! - [`server`] - HTTP server hosting the demo
//! - [`cli`] - Command-line interface

pub mod error;

pub mod dataset;
pub mod training;
pub mod export;

pub mod config;
pub mod workflow;
pub mod ui;

pub mod server;
pub mod cli;

pub use error::{Result, StudioError};
