use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use prompter_provider::{
    register_from_configs, register_stub_providers, ProviderConfig, ProviderRegistry,
    SuggestionGenerator,
};
use prompter_relay::RelayService;
use prompter_server::state::AppState;
use prompter_server::storage::MemStorage;

#[derive(Parser)]
#[command(name = "prompter-server", version, about = "Interview copilot relay server")]
struct Cli {
    #[arg(long, default_value = "127.0.0.1:5000", help = "Address to bind")]
    addr: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut providers = ProviderRegistry::new();
    let configs = ProviderConfig::from_env();
    if configs.is_empty() {
        tracing::warn!("no provider API keys in environment; using stub providers");
        register_stub_providers(&mut providers);
    } else {
        register_from_configs(&mut providers, &configs)?;
    }

    let relay = Arc::new(RelayService::new(SuggestionGenerator::new(providers)));
    let state = AppState::new(relay, Arc::new(MemStorage::new()));

    prompter_server::serve(state, &cli.addr).await
}
