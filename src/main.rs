// src/main.rs — PromptTune entry point

use clap::Parser;

use prompttune::cli::{optimize, Cli, Commands};
use prompttune::infra::config::Config;
use prompttune::infra::logger;

#[tokio::main]
async fn main() {
    // Respects RUST_LOG
    logger::init_logging("warn");

    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = if let Some(ref path) = cli.config {
        let mut c = Config::load_from(std::path::Path::new(path))?;
        c.models.apply_env_overrides();
        c
    } else {
        Config::load()?
    };

    match cli.command {
        Some(Commands::Best) => prompttune::cli::best::show_best(),
        None => {
            let seed = cli.seed.join(" ");
            if seed.trim().is_empty() {
                anyhow::bail!(
                    "No seed instruction given. Usage: prompttune \"<instruction to optimize>\""
                );
            }
            optimize::run_optimize(
                &seed,
                &config,
                optimize::OptimizeArgs {
                    examples: cli.examples,
                    validation: cli.validation,
                    budget: cli.budget,
                    parallelism: cli.parallelism,
                    showcase: cli.showcase,
                    quiet: cli.quiet,
                },
            )
            .await
        }
    }
}
