// src/lib.rs — Library root for PromptTune

pub mod cli;
pub mod core;
pub mod infra;
pub mod provider;
pub mod scoring;
