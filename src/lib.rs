pub mod aggregate;
pub mod auth;
pub mod config;
pub mod db;
pub mod dto;
pub mod entity;
pub mod error;
pub mod fetchers;
pub mod ids;
pub mod middleware;
pub mod models;
pub mod response;
pub mod roles;
pub mod routes;
pub mod screens;
pub mod session;
pub mod state;
pub mod store;
pub mod view;
