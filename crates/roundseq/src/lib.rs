pub mod app;
pub mod config;
pub mod dispatch;
pub mod events;
pub mod midi;
pub mod notes;
pub mod sys;
