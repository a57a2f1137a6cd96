//! Wiring from configuration to engine, store and sink.

use std::sync::Arc;

use anyhow::{Context, Result};
use cloudcost_engine::{AggregationEngine, DeliveryPipeline, EngineSettings, MattermostSink};
use cloudcost_fetch::{FetchContext, RetryPolicy, StaticRateConverter};
use cloudcost_providers::ProviderRegistry;
use cloudcost_store::{Config, SqliteAccountStore};
use tracing::debug;

use crate::Cli;

/// Loads the configuration named on the command line or the default one.
pub fn load_config(cli: &Cli) -> Result<Config> {
    let path = cli.config.clone().unwrap_or_else(Config::default_path);
    debug!(path = %path.display(), "Using config");
    Config::load_or_default(&path).with_context(|| format!("loading {}", path.display()))
}

/// Opens the account database.
pub fn open_store(config: &Config) -> Result<Arc<SqliteAccountStore>> {
    let path = config.database_path();
    let store = SqliteAccountStore::open(&path).with_context(|| format!("opening {}", path.display()))?;
    Ok(Arc::new(store))
}

/// Builds the adapter context with the configured rates.
pub fn fetch_context(config: &Config) -> Arc<FetchContext> {
    let converter = StaticRateConverter::from_rates(config.currency.rates.iter().map(|(code, rate)| (code, *rate)));
    Arc::new(
        FetchContext::builder()
            .currency(Arc::new(converter))
            .build(),
    )
}

/// Builds an engine over the stored accounts and built-in adapters.
pub fn engine(config: &Config, ctx: Arc<FetchContext>) -> Result<AggregationEngine> {
    let store = open_store(config)?;
    Ok(AggregationEngine::new(
        store,
        Arc::new(ProviderRegistry::builtin()),
        ctx,
        EngineSettings::from_config(&config.engine),
    ))
}

/// Builds the delivery pipeline. `None` without a `[mattermost]` section.
pub fn delivery(config: &Config, ctx: &FetchContext) -> Result<Option<DeliveryPipeline>> {
    let Some(mattermost) = &config.mattermost else {
        return Ok(None);
    };
    let token = mattermost.resolve_token()?;
    let sink = MattermostSink::new(ctx.http.clone(), &mattermost.server, &mattermost.channel_id, token);
    Ok(Some(DeliveryPipeline::new(
        Arc::new(sink),
        RetryPolicy::new(config.delivery.max_attempts),
    )))
}
