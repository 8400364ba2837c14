// Library interface for the graphpad tab session core
// This allows tests and embedding UIs to drive the controller directly

pub mod app;
pub mod config;
pub mod input;
pub mod logging;
pub mod model;
pub mod services;
pub mod view;
