pub mod api;
pub mod config;
pub mod dashboard;
pub mod guard;
pub mod insights;
pub mod live;
pub mod logging;
pub mod model;
pub mod render;
pub mod simulation;
pub mod sync;
pub mod theme;
