use anyhow::Context;
use convo_memory::cli::output::Output;
use convo_memory::cli::{Cli, Commands};
use convo_memory::db::DocumentStore;
use convo_memory::types::{InteractionInput, MemoryError, RequestContext};
use convo_memory::utils::config::{ConfigManager, LoggingConfig, MemoryConfig};
use convo_memory::MemoryCoordinator;
use tracing::debug;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    let config = match ConfigManager::new(&cli.config) {
        Ok(manager) => manager.config(),
        Err(e) => {
            output.error(&e.to_string());
            std::process::exit(2);
        }
    };

    init_tracing(&config.logging, cli.verbose)?;
    debug!(config = ?cli.config, "Configuration loaded");

    if let Commands::Config { validate } = &cli.command {
        show_config(&output, &cli, &config, *validate);
        return Ok(());
    }

    let store = config
        .store_provider()
        .create_store()
        .await
        .context("failed to open document store")?;
    let memory = MemoryCoordinator::new(store.clone(), &config.memory);
    let ctx = match &cli.user {
        Some(user) => RequestContext::for_user(user),
        None => RequestContext::anonymous(),
    };

    let mutating = cli.command.is_mutating();
    let result = run(&memory, &ctx, cli.command, &output).await;

    if mutating {
        persist(store.as_ref()).await?;
    }

    if let Err(e) = result {
        output.error(&e.to_string());
        std::process::exit(if e.is_client_error() { 1 } else { 3 });
    }
    Ok(())
}

fn init_tracing(logging: &LoggingConfig, verbose: bool) -> anyhow::Result<()> {
    let level = if verbose { "debug" } else { logging.level.as_str() };
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("convo_memory={level},convo_docstore={level}")))
        .context("invalid log level")?;

    let registry = tracing_subscriber::registry().with(env_filter);
    if logging.json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
    Ok(())
}

async fn persist(store: &dyn DocumentStore) -> anyhow::Result<()> {
    store
        .persist()
        .await
        .context("failed to persist document store")
}

async fn run(
    memory: &MemoryCoordinator,
    ctx: &RequestContext,
    command: Commands,
    output: &Output,
) -> Result<(), MemoryError> {
    match command {
        Commands::Create { name } => {
            let id = memory.create_conversation(ctx, name.as_deref()).await?;
            output.success(&format!("Created conversation {}", id));
        }
        Commands::Put {
            conversation_id,
            input,
            prompt,
            response,
            agent,
            metadata,
        } => {
            let input = InteractionInput::new(input, prompt, response, agent, metadata);
            let id = memory.put_interaction(ctx, &conversation_id, input).await?;
            output.success(&format!("Stored interaction {}", id));
        }
        Commands::List { from, max_results } => {
            let request = memory.page_request(Some(from), max_results);
            let page = memory.list_conversations_page(ctx, request).await?;
            if page.items.is_empty() {
                output.info("No conversations");
            }
            for meta in &page.items {
                output.conversation_line(meta);
            }
            output.next_token(page.next_token);
        }
        Commands::Interactions {
            conversation_id,
            from,
            max_results,
            all,
        } => {
            if !memory.conversations().check_access(ctx, &conversation_id).await? {
                return Err(MemoryError::access_denied(ctx, &conversation_id));
            }
            if all {
                let interactions = memory.get_all_interactions(&conversation_id).await?;
                if interactions.is_empty() {
                    output.info("No interactions");
                }
                for interaction in &interactions {
                    output.interaction(interaction);
                }
                return Ok(());
            }
            let request = memory.page_request(Some(from), max_results);
            let page = memory
                .get_interactions_page(&conversation_id, request)
                .await?;
            if page.items.is_empty() {
                output.info("No interactions");
            }
            for interaction in &page.items {
                output.interaction(interaction);
            }
            output.next_token(page.next_token);
        }
        Commands::Show { conversation_id } => {
            match memory.get_conversation(ctx, &conversation_id).await? {
                Some(meta) => output.conversation(&meta),
                None => {
                    return Err(MemoryError::NotFound(format!(
                        "conversation {}",
                        conversation_id
                    )))
                }
            }
        }
        Commands::Delete { conversation_id } => {
            if memory.delete_conversation(ctx, &conversation_id).await? {
                output.success(&format!("Deleted conversation {}", conversation_id));
            } else {
                output.warning("Conversation deleted but some interactions remain; run delete again");
            }
        }
        Commands::Config { .. } => {}
    }
    Ok(())
}

fn show_config(output: &Output, cli: &Cli, config: &MemoryConfig, validate: bool) {
    if validate {
        output.success("Configuration is valid");
        return;
    }
    output.header("Configuration");
    output.kv("file", &cli.config.display().to_string());
    output.kv("provider", &format!("{:?}", config.store.provider).to_lowercase());
    output.kv(
        "path",
        &config
            .store
            .path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "-".to_string()),
    );
    output.kv("refresh on write", &config.store.refresh_on_write.to_string());
    output.kv("access control", &config.memory.access_control.to_string());
    output.kv("drain page size", &config.memory.drain_page_size.to_string());
    output.kv("default max results", &config.memory.default_max_results.to_string());
    output.kv("log level", &config.logging.level);
}
