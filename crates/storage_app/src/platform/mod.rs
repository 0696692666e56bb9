mod app;
mod config;
mod demo;
mod logging;

pub use app::run_app;
