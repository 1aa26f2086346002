use std::sync::Arc;

use clap::Parser;
use tokio::io::BufReader;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use novel_reasoning::{
    cli::{self, Cli, CliResult, Commands, EvaluationDriver},
    config::{Config, LogFormat},
    llm::{OpenAiClient, TextCompletion},
    reasoning::ReasoningEngine,
    store::RuleStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    init_logging(&config);

    info!(version = env!("CARGO_PKG_VERSION"), "Novel reasoning starting...");

    // Initialize completion client
    let mut client = match OpenAiClient::new(&config.llm, config.request.clone()) {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "Failed to initialize completion client");
            return Err(e.into());
        }
    };
    if let Some(model) = args.model {
        client = client.with_model(model);
    }
    info!(base_url = %client.base_url(), model = %client.model(), "Completion client initialized");
    let completion: Arc<dyn TextCompletion> = Arc::new(client);

    let result = match args.command {
        Commands::Evaluate {
            challenges,
            solutions,
            limit,
            samples,
            temperature,
            mode,
            pipeline,
            output,
        } => {
            let mut engine = if pipeline {
                Some(open_engine(&config, completion.clone()).await?)
            } else {
                None
            };
            let driver = match engine.as_mut() {
                Some(engine) => EvaluationDriver::Pipeline(engine),
                None => EvaluationDriver::Sampling {
                    completion,
                    samples,
                    temperature,
                    mode,
                },
            };
            cli::execute_evaluate(driver, &challenges, &solutions, limit, output.as_deref()).await
        }
        Commands::Solve {
            problem,
            context,
            json,
        } => {
            let mut engine = open_engine(&config, completion).await?;
            cli::execute_solve(&mut engine, &problem, &context, json).await
        }
        Commands::Rules { rule_id } => {
            let engine = open_engine(&config, completion).await?;
            cli::execute_rules(&engine, rule_id.as_deref())
        }
        Commands::Interactive => {
            let mut engine = open_engine(&config, completion).await?;
            let stdin = BufReader::new(tokio::io::stdin());
            match cli::run_interactive(&mut engine, stdin).await {
                Ok(()) => CliResult::success(""),
                Err(e) => CliResult::error(format!("Failed to read input: {}", e)),
            }
        }
    };

    if result.exit_code == 0 {
        if !result.message.is_empty() {
            println!("{}", result.message);
        }
    } else {
        eprintln!("{}", result.message);
        std::process::exit(result.exit_code);
    }

    Ok(())
}

/// Load the rule store and build the engine around it
async fn open_engine(
    config: &Config,
    completion: Arc<dyn TextCompletion>,
) -> anyhow::Result<ReasoningEngine> {
    let store = match RuleStore::from_config(&config.rules).await {
        Ok(s) => {
            info!(location = %s.location(), rules = s.len(), "Rule store initialized");
            s
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize rule store");
            return Err(e.into());
        }
    };

    Ok(ReasoningEngine::new(completion, store).with_pipeline_config(&config.pipeline))
}

/// Initialize tracing/logging
fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
