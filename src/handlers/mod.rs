// src/handlers/mod.rs

pub mod live;
pub mod live_ws;
