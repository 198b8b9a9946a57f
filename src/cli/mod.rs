pub mod plan;
pub mod setup;
pub mod targets;
pub mod ui;
