// src/handlers/mod.rs

pub mod auth;
pub mod play;
pub mod quiz;
pub mod session;
