pub mod ai;
pub mod app;
pub mod config;
pub mod content;
pub mod engine;
pub mod event;
pub mod exercise;
pub mod logging;
pub mod ui;
pub mod validate;
