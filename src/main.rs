use anyhow::Context;
use delve::{
    AgentRegistry, AppState, DelveConfig, PipelineEvent, ResearchPipeline,
    api::routes::create_app,
    cli::{Cli, Commands, output::Output},
    types::ResearchRequest,
    utils::config::ServerConfig,
};
use futures::StreamExt;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    let config = match DelveConfig::load(&cli.config) {
        Ok(config) => Arc::new(config),
        Err(e) => {
            output.error(&format!("Failed to load {}: {}", cli.config.display(), e));
            output.hint("Copy delve.toml from the repository root and adjust the providers");
            std::process::exit(1);
        }
    };

    init_tracing(&config.server, cli.verbose, cli.json);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config, &output).await,
        Commands::Research {
            query,
            stream,
            browse,
        } => research(config, &output, query, stream, browse).await,
        Commands::Check => check(&config, &output),
    }
}

/// Logs go to stderr so `research` output on stdout stays clean.
fn init_tracing(server: &ServerConfig, verbose: bool, json: bool) {
    let level = if verbose {
        "debug"
    } else {
        server.log_level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "delve={level},delve_server={level},tower_http={level}"
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);
    if json || server.log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn build_pipeline(config: &Arc<DelveConfig>) -> anyhow::Result<ResearchPipeline> {
    let agents = AgentRegistry::from_config(Arc::clone(config))
        .build()
        .await
        .context("failed to create research agents")?;
    Ok(ResearchPipeline::new(agents, config.pipeline.clone()))
}

async fn serve(config: Arc<DelveConfig>, output: &Output) -> anyhow::Result<()> {
    output.banner();

    let pipeline = Arc::new(build_pipeline(&config).await?);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState { pipeline };

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    output.success(&format!("Listening on http://{}", addr));
    #[cfg(feature = "swagger-ui")]
    output.info(&format!("API docs at http://{}/swagger-ui/", addr));
    tracing::info!(%addr, "Server started");

    axum::serve(listener, create_app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}

async fn research(
    config: Arc<DelveConfig>,
    output: &Output,
    query: String,
    stream: bool,
    browse: bool,
) -> anyhow::Result<()> {
    let pipeline = Arc::new(build_pipeline(&config).await?);
    let request = ResearchRequest {
        query,
        browse: browse.then_some(true),
    };

    if !stream {
        output.info("Researching, this can take a few minutes...");
        let response = pipeline.run(&request).await?;
        output.report(&response);
        return Ok(());
    }

    let mut events = pipeline.stream(request)?;
    while let Some(event) = events.next().await {
        output.event(&event);
        if let PipelineEvent::Error { message, .. } = event {
            anyhow::bail!(message);
        }
    }
    Ok(())
}

fn check(config: &DelveConfig, output: &Output) -> anyhow::Result<()> {
    let registry = delve::ProviderRegistry::from_config(Arc::new(config.clone()));

    output.success("Configuration is valid");

    output.header("Server");
    output.kv("address", &format!("{}:{}", config.server.host, config.server.port));
    output.kv("log", &format!("{} ({})", config.server.log_level, config.server.log_format));

    output.header("Models");
    for name in registry.model_names() {
        match registry.provider_for_model(name) {
            Ok(provider) if provider.is_enabled() => {
                output.list_item(&format!("{} -> {}", name, provider.name()))
            }
            Ok(provider) => output.warning(&format!(
                "{} -> {} (not compiled in)",
                name,
                provider.name()
            )),
            Err(e) => output.warning(&format!("{}: {}", name, e)),
        }
    }

    output.header("Agents");
    let agents = &config.agents;
    output.kv("planner", &agents.planner.model);
    output.kv("search", &agents.search.model);
    output.kv("writer", &agents.writer.model);
    output.kv(
        "browser",
        agents.browser.as_ref().map_or("(none)", |b| b.model.as_str()),
    );

    output.header("Pipeline");
    let pipeline = &config.pipeline;
    output.kv("agent timeout", &format!("{}s", pipeline.agent_timeout_secs));
    output.kv("browse by default", &pipeline.browse.to_string());
    output.kv("max searches", &pipeline.max_searches.to_string());
    output.kv("chart service", &config.charts.base_url);

    Ok(())
}
