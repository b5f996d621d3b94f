pub mod config;
pub mod extensions;
pub mod generate;
pub mod models;
