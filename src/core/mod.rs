// src/core/mod.rs

pub mod reflection;
pub mod search;
pub mod state;
pub mod tracker;
pub mod types;
