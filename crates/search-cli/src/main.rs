//! Helios FHIR Search (hfs-search)
//!
//! Resolves one FHIR type-level search, including `_include`,
//! `_revinclude`, and `:iterate` directives, against the Elasticsearch
//! indices of a Helios store and prints the searchset Bundle.

mod config;

use std::sync::Arc;

use clap::Parser;
use helios_search::SearchOrchestrator;
use helios_search::backends::elasticsearch::ElasticsearchBackend;
use helios_search::collaborators::ReferenceInclusionDeriver;
use tracing::info;

use crate::config::CliConfig;

/// Initializes the tracing subscriber, honoring `RUST_LOG` when set.
fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("helios_search={},hfs_search={}", level, level))
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();
    init_logging(&config.log_level);

    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    let es_config = config.elasticsearch_config();
    info!(
        nodes = ?es_config.nodes,
        index_prefix = %es_config.index_prefix,
        "Initializing Elasticsearch backend"
    );
    let backend = ElasticsearchBackend::new(es_config)
        .map_err(|e| anyhow::anyhow!("Failed to create Elasticsearch backend: {}", e))?;

    if config.health_check {
        backend
            .health_check()
            .await
            .map_err(|e| anyhow::anyhow!("Elasticsearch is not healthy: {}", e))?;
        info!("Elasticsearch health check passed");
    }

    let orchestrator = SearchOrchestrator::new(Arc::new(backend))
        .with_deriver(Arc::new(
            ReferenceInclusionDeriver::new().with_max_results(config.max_include_results),
        ))
        .with_config(config.search_config());

    let request = config.request();
    info!(
        resource_type = %request.resource_type,
        params = request.params.len(),
        fhir_version = %request.fhir_version,
        "Running search"
    );

    let bundle = orchestrator.search(&request).await?;
    info!(
        total = bundle.total,
        entries = bundle.entries.len(),
        "Search finished"
    );

    let json = bundle.to_json();
    let output = if config.compact {
        serde_json::to_string(&json)?
    } else {
        serde_json::to_string_pretty(&json)?
    };
    println!("{}", output);

    Ok(())
}
