// src/cli/optimize.rs — Default command: optimize a seed instruction

use std::path::Path;
use std::sync::Arc;

use crate::core::search::{ProgressEvent, ReflectiveSearch};
use crate::core::tracker::BestTracker;
use crate::core::types::{Criterion, Example, ExampleSet};
use crate::infra::config::Config;
use crate::infra::paths;
use crate::provider::ollama::OllamaBackend;
use crate::provider::retry::{self, RetryConfig};
use crate::provider::roles::BackendRoles;
use crate::provider::{ChatRequest, Message};
use crate::scoring::ComplianceScorer;

pub struct OptimizeArgs {
    pub examples: Option<String>,
    pub validation: Option<String>,
    pub budget: Option<u32>,
    pub parallelism: Option<usize>,
    pub showcase: Option<String>,
    pub quiet: bool,
}

/// Run one optimization and print the result.
pub async fn run_optimize(seed: &str, config: &Config, args: OptimizeArgs) -> anyhow::Result<()> {
    config.scoring.validate()?;

    let mut search_config = config.search.clone();
    if let Some(budget) = args.budget {
        search_config.calls_budget = budget;
    }
    if let Some(parallelism) = args.parallelism {
        search_config.parallelism = parallelism;
    }

    // Fail fast if the backend is down, with bounded backoff instead of
    // polling forever.
    let readiness = OllamaBackend::new(Some(config.models.execution_endpoint.clone()));
    retry::wait_until_ready(&readiness, &RetryConfig::default()).await?;
    if !args.quiet {
        eprintln!("Backend ready at {}", config.models.execution_endpoint);
    }

    let examples = load_examples(&args)?;
    let roles = BackendRoles::from_config(&config.models);
    let criteria: Vec<Criterion> = config.criteria.iter().map(Criterion::from).collect();
    let scorer = ComplianceScorer::new(roles.reflection.clone(), criteria, config.scoring.clone());
    let tracker = Arc::new(BestTracker::open(paths::best_record_path()));

    let mut search = ReflectiveSearch::new(&roles, scorer, tracker.clone(), search_config);
    if !args.quiet {
        search = search.with_progress(|event| match event {
            ProgressEvent::Evaluated { example, score, best } => {
                eprintln!("  example {:>2}  score {:.3}  best {:.3}", example + 1, score, best);
            }
            ProgressEvent::Reflected { ordinal } => {
                eprintln!("  reflected -> candidate #{ordinal}");
            }
            ProgressEvent::Complete { calls_used, calls_budget, best_score } => {
                eprintln!("  done: {calls_used}/{calls_budget} calls, best {best_score:.3}");
            }
        });
    }

    let outcome = search.run(seed, &examples).await;

    if let Some(ref warning) = outcome.warning {
        eprintln!("warning: {warning}");
    }
    if !args.quiet {
        eprintln!();
        eprintln!("============================================================");
        eprintln!(
            "BEST INSTRUCTION  (score {:.3}, {}, {} calls, {} evaluations)",
            outcome.best_score, outcome.origin, outcome.calls_used, outcome.evaluations,
        );
        eprintln!("============================================================");
    }
    println!("{}", outcome.best_instruction);

    if let Some(ref input) = args.showcase {
        showcase(&roles, &outcome.best_instruction, input).await;
    }

    Ok(())
}

fn load_examples(args: &OptimizeArgs) -> anyhow::Result<ExampleSet> {
    let mut set = match args.examples {
        Some(ref path) => ExampleSet::train_only(read_examples_file(Path::new(path))?),
        None => ExampleSet::builtin_demo(),
    };
    if let Some(ref path) = args.validation {
        set.validation = read_examples_file(Path::new(path))?;
    }
    if set.is_empty() {
        anyhow::bail!("No training examples to optimize against");
    }
    Ok(set)
}

fn read_examples_file(path: &Path) -> anyhow::Result<Vec<Example>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Cannot read examples file {}: {}", path.display(), e))?;
    let examples: Vec<Example> = serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Invalid examples file {}: {}", path.display(), e))?;
    Ok(examples)
}

/// One off-budget generation with the winning instruction, for eyeballing.
async fn showcase(roles: &BackendRoles, instruction: &str, input: &str) {
    let role = &roles.execution;
    let request = ChatRequest {
        model: role.model.clone(),
        messages: vec![Message::user(input)],
        max_tokens: Some(role.max_tokens),
        temperature: Some(role.temperature),
        system: Some(instruction.to_string()),
        timeout: Some(role.timeout),
    };
    match role.backend.chat(request).await {
        Ok(resp) => {
            eprintln!();
            eprintln!("SHOWCASE ({input}):");
            println!("{}", resp.content);
        }
        Err(e) => eprintln!("showcase generation failed: {e}"),
    }
}
