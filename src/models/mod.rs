// src/models/mod.rs

pub mod quiz;
pub mod score;
pub mod session;
pub mod user;
