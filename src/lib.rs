pub mod config;
pub mod db;
pub mod logger;
pub mod services;
pub mod sweeper;
