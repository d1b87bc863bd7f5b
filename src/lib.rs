pub mod cli;
pub mod config;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod prompt;
pub mod providers;

use anyhow::{Context, Result};
use clap::Parser;
use reqwest::Client;
use tracing::info;

use cli::Args;
use config::ConfigStore;
use pipeline::AnswerPipeline;

pub async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    logging::init();

    let args = Args::parse();

    if args.config_example {
        let path = config::create_example()?;
        println!("Example configuration created at {}", path.display());
        return Ok(());
    }

    let Some(question) = args.question else {
        Args::missing_question_error().exit();
    };

    let mut store = ConfigStore::new()?;
    let cfg = store.get();
    info!(provider = %cfg.provider, model = %cfg.model, "loaded configuration");

    let client = Client::builder()
        .build()
        .context("Failed to initialize HTTP client")?;

    let pipeline = AnswerPipeline::from_config(&client, cfg)?;
    let answer = pipeline.answer(&question).await?;
    println!("{}", answer.trim());
    Ok(())
}
