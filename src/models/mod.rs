// src/models/mod.rs

pub mod answer;
pub mod message;
pub mod participant;
pub mod question;
pub mod session;
