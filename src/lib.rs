// Library interface for testing

// Declare all modules
pub mod config;
pub mod constants;
pub mod recognition;
pub mod schedule;
pub mod serve;
pub mod store;
pub mod videos;
