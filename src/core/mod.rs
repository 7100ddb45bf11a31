pub mod catalog;
pub mod client;
pub mod config;
pub mod dom;
pub mod formatter;
pub mod models;
