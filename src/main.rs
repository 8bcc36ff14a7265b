use anyhow::Result;
use blog_search::config::EngineConfig;
use blog_search::domain::article::ArticleRepository;
use blog_search::infrastructure::{
    elasticsearch::EngineClient, repositories::ElasticsearchArticleRepository,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    if let Err(err) = bootstrap().await {
        tracing::error!(error = %err, "fatal error");
        eprintln!("fatal error: {err}");
        std::process::exit(1);
    }
}

/// Make sure the article index exists with the declared mapping and report
/// how many articles it holds.
async fn bootstrap() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = EngineConfig::from_env()?;
    tracing::info!(url = %config.url(), index = config.index(), "connecting to search engine");

    let client = EngineClient::new(config)?;
    let repository = ElasticsearchArticleRepository::new(client);

    if repository.create_index().await? {
        tracing::info!("article index initialised");
    }

    let count = repository.count().await?;
    tracing::info!(count, "article index ready");

    Ok(())
}

fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG")
        .ok()
        .unwrap_or_else(|| "info,reqwest=warn".to_string());

    let subscriber = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(env_filter))
        .with(tracing_subscriber::fmt::layer());

    if subscriber.try_init().is_err() {
        tracing::warn!("tracing subscriber already initialised");
    }
}
