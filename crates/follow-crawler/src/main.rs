use anyhow::Context;
use follow_crawler::persistence::write_outputs;
use follow_crawler::report::GraphSummary;
use follow_crawler::{CrawlerConfig, GraphCrawler, HttpSocialApi};
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "follow_crawler=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let config = CrawlerConfig::from_env()?;
    let api = Arc::new(HttpSocialApi::new(&config)?);

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Interrupted, stopping crawl...");
            ctrl_c.cancel();
        }
    });

    let handle = prompt_handle()?;
    let crawler = GraphCrawler::from_config(api, &config, cancel);

    let outcome = match crawler.crawl(&handle, config.target_nodes).await {
        Ok(outcome) => outcome,
        Err(abort) => {
            eprintln!("Sanitize the username. Don't include any assignment characters");
            eprintln!("{}", abort);
            std::process::exit(1);
        }
    };

    let summary = GraphSummary::compute(&outcome.graph);
    print!("{}", summary.render());

    let written = write_outputs(&config.output_dir, &outcome, &summary)
        .with_context(|| format!("Failed to write outputs to {:?}", config.output_dir))?;
    println!(
        "Results saved to {}",
        written
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );

    Ok(())
}

fn prompt_handle() -> anyhow::Result<String> {
    print!("Enter the desired user's name, without any @'s or /'s ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read username")?;
    Ok(line.trim().to_string())
}
