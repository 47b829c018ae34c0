pub mod config;
pub mod engine;
pub mod logging;
pub mod runner;
pub mod verify;
pub mod view;
