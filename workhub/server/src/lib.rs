pub mod attendance;
pub mod auth;
pub mod config;
pub mod employee;
pub mod entities;
pub mod project;
pub mod web;
