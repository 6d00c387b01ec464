// src/cli/mod.rs — CLI definition (clap derive)

pub mod best;
pub mod optimize;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "prompttune", about = "Judge-scored prompt instruction optimizer", version)]
pub struct Cli {
    /// Seed instruction to optimize (default command when no subcommand given)
    #[arg(trailing_var_arg = true)]
    pub seed: Vec<String>,

    /// JSON file of training examples [{"task_input": ..., "reference_output": ...}]
    #[arg(short, long)]
    pub examples: Option<String>,

    /// JSON file of validation examples (scored, never shown to reflection)
    #[arg(long)]
    pub validation: Option<String>,

    /// Override the call budget from config
    #[arg(short, long)]
    pub budget: Option<u32>,

    /// Override evaluation parallelism from config
    #[arg(short, long)]
    pub parallelism: Option<usize>,

    /// After optimizing, generate once with the best instruction on this input
    #[arg(long)]
    pub showcase: Option<String>,

    /// Suppress progress output (only emit the final instruction)
    #[arg(long)]
    pub quiet: bool,

    /// Config file path
    #[arg(long)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the durably recorded best instruction
    Best,
}
