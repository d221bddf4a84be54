pub mod config;
pub mod db;
pub mod listing;
pub mod params;
pub mod script_runner;
pub mod state;
pub mod ttl_cache;
