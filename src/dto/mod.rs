pub mod auth;
pub mod screens;
