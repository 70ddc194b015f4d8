pub mod bin;
pub mod config;
pub mod info;
