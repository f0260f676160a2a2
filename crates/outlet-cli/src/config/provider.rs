//! Service wiring from CLI configuration.

use std::sync::Arc;

use anyhow::Context;
use outlet_rig::chat::ChatService;
use outlet_rig::provider::{Embedder, LanguageModel, ProviderConfig};
use outlet_rig::rag::{InitializationGuard, RetrievalEngine};
use outlet_rig::tool::ToolRegistry;

use super::{Cli, TRACING_TARGET_CONFIG};

/// Creates the chat service with its catalog, index, tools and model.
///
/// The index is not built here: the first conversation (or
/// `--eager-index`) builds it.
pub fn create_chat_service(cli: &Cli) -> anyhow::Result<ChatService> {
    let catalog = cli.catalog.create_service()?;
    let (embedder, model) = create_providers(&cli.provider)?;

    let engine = RetrievalEngine::new(embedder, cli.rag.clone());
    let tools = ToolRegistry::with_outlet_tools(engine.clone(), catalog.clone())
        .context("failed to register tools")?;
    let guard = InitializationGuard::new(catalog, engine);

    tracing::debug!(
        target: TRACING_TARGET_CONFIG,
        tools = tools.len(),
        model = model.model_name(),
        "Chat service wired"
    );

    Ok(ChatService::new(guard, tools, model, cli.agent.clone()))
}

/// Creates the OpenAI-backed embedding and completion providers.
#[cfg(not(feature = "mock"))]
fn create_providers(
    config: &ProviderConfig,
) -> anyhow::Result<(Arc<dyn Embedder>, Arc<dyn LanguageModel>)> {
    use outlet_rig::provider::{CompletionProvider, EmbeddingProvider};

    config
        .validate()
        .context("invalid provider configuration")?;

    let embedder =
        EmbeddingProvider::openai(config).context("failed to create embedding provider")?;
    let model =
        CompletionProvider::openai(config).context("failed to create completion provider")?;

    Ok((Arc::new(embedder), Arc::new(model)))
}

/// Creates offline providers; the provider configuration is ignored.
#[cfg(feature = "mock")]
fn create_providers(
    _config: &ProviderConfig,
) -> anyhow::Result<(Arc<dyn Embedder>, Arc<dyn LanguageModel>)> {
    use outlet_rig::mock::{HashingEmbedder, RetrievalEchoModel};

    tracing::warn!(
        target: TRACING_TARGET_CONFIG,
        "Using offline hashing embedder and retrieval-echo model"
    );

    Ok((Arc::new(HashingEmbedder::default()), Arc::new(RetrievalEchoModel)))
}
