pub mod app;
pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod render;
pub mod session;
