use microlearn::{
    config::Config,
    db::Database,
    llm::LlmClient,
    memory::ConversationMemory,
    server::{self, AppState},
    tutor::Tutor,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Starting MicroLearn with {:?}", config);

    let db = Database::new(&config)?;
    db.execute_init()?;
    db.seed_catalog(&config.concepts)?;
    if config.seed_sample_content {
        db.seed_sample_content()?;
    }

    let llm_client = LlmClient::new(&config)?;
    let memory = Arc::new(ConversationMemory::new(
        config.memory_max_entries,
        config.memory_max_users,
    ));
    let tutor = Tutor::new(Arc::new(llm_client), memory, &config);

    server::serve(AppState::new(db, tutor, config)).await
}
