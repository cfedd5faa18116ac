// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use graph_memory::utils::logging::{
    format_error, format_heading, format_info, format_step, format_success, format_warning,
};
use graph_memory::{
    Config, DataSource, GraphMemory, GraphProvider, NodeType, PruneOptions, SearchRequest,
    SearchType, Validator, VectorProvider,
};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "graph_memory")]
#[command(author = "graph_memory contributors")]
#[command(version = "0.1.0")]
#[command(about = "Knowledge graph memory: add, cognify, search and prune", long_about = None)]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config/default.toml"
    )]
    config: PathBuf,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    /// Override the configured graph provider (json, memory)
    #[arg(long, value_name = "PROVIDER")]
    graph_provider: Option<GraphProvider>,

    /// Override the configured vector provider (lancedb, memory)
    #[arg(long, value_name = "PROVIDER")]
    vector_provider: Option<VectorProvider>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register text, files or directories into a dataset
    Add {
        /// Raw text, a file path or a directory (file:// prefixes accepted)
        #[arg(required = true)]
        sources: Vec<String>,

        #[arg(short, long, default_value = "main_dataset")]
        dataset: String,

        /// Tag added content with one or more node sets
        #[arg(short, long, value_delimiter = ',')]
        node_set: Vec<String>,
    },

    /// Build the knowledge graph for pending data
    Cognify {
        /// Datasets to process; every dataset when omitted
        datasets: Vec<String>,
    },

    /// Add sources and cognify them in one step
    Ingest {
        #[arg(required = true)]
        sources: Vec<String>,

        #[arg(short, long, default_value = "main_dataset")]
        dataset: String,

        #[arg(short, long, value_delimiter = ',')]
        node_set: Vec<String>,
    },

    /// Search the knowledge graph
    Search {
        /// Search query text
        query: String,

        /// insights, chunks, summaries or graph_completion
        #[arg(short = 't', long = "type", default_value = "insights")]
        query_type: SearchType,

        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Restrict graph completion to these node sets
        #[arg(short, long, value_delimiter = ',')]
        node_set: Vec<String>,
    },

    /// Print graph completion context for a question
    Context {
        query: String,

        #[arg(short, long, value_delimiter = ',')]
        node_set: Vec<String>,

        #[arg(long, default_value = "NodeSet")]
        node_type: NodeType,
    },

    /// Show the search history of the default user
    History {
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// List datasets and their data items
    Datasets,

    Stats,

    Health,

    Export {
        #[arg(short, long, default_value = "./exports")]
        output: PathBuf,

        #[arg(short, long)]
        pretty: bool,
    },

    /// Delete ingested data and/or persisted system state
    Prune {
        /// Remove the data root directory
        #[arg(long)]
        data: bool,

        /// Empty the graph and vector stores
        #[arg(long)]
        system: bool,

        /// Also remove users, datasets and search history
        #[arg(long)]
        metadata: bool,

        #[arg(long)]
        confirm: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    graph_memory::utils::logging::init_logger(cli.color, cli.verbose);
    colored::control::set_override(cli.color);

    info!("Graph Memory");
    info!("Loading configuration from: {}", cli.config.display());

    let config = if cli.config.exists() {
        Config::load(Some(cli.config.as_path())).context("Failed to load configuration")?
    } else {
        warn!(
            "Config file {} not found, using default configuration",
            cli.config.display()
        );
        Config::load(None).unwrap_or_else(|e| {
            warn!("Falling back to built-in defaults: {}", e);
            Config::default_config()
        })
    };

    let mut memory = GraphMemory::new(config).context("Invalid configuration")?;
    if let Some(provider) = cli.graph_provider {
        memory.set_graph_database_provider(provider);
    }
    if let Some(provider) = cli.vector_provider {
        memory.set_vector_db_provider(provider);
    }

    match cli.command {
        Commands::Add {
            sources,
            dataset,
            node_set,
        } => {
            cmd_add(&memory, &sources, &dataset, &node_set).await?;
        }
        Commands::Cognify { datasets } => {
            cmd_cognify(&memory, &datasets).await?;
        }
        Commands::Ingest {
            sources,
            dataset,
            node_set,
        } => {
            cmd_ingest(&memory, &sources, &dataset, &node_set).await?;
        }
        Commands::Search {
            query,
            query_type,
            top_k,
            node_set,
        } => {
            cmd_search(&memory, &query, query_type, top_k, node_set).await?;
        }
        Commands::Context {
            query,
            node_set,
            node_type,
        } => {
            cmd_context(&memory, &query, node_type, node_set).await?;
        }
        Commands::History { limit } => {
            cmd_history(&memory, limit).await?;
        }
        Commands::Datasets => {
            cmd_datasets(&memory).await?;
        }
        Commands::Stats => {
            cmd_stats(&memory).await?;
        }
        Commands::Health => {
            cmd_health(&memory).await?;
        }
        Commands::Export { output, pretty } => {
            cmd_export(&memory, output, pretty).await?;
        }
        Commands::Prune {
            data,
            system,
            metadata,
            confirm,
        } => {
            cmd_prune(&memory, data, system, metadata, confirm).await?;
        }
    }

    Ok(())
}

async fn cmd_add(
    memory: &GraphMemory,
    sources: &[String],
    dataset: &str,
    node_set: &[String],
) -> Result<()> {
    info!("Adding {} source(s) to dataset {}", sources.len(), dataset);

    let sources: Vec<DataSource> = sources.iter().map(|s| DataSource::infer(s)).collect();
    let node_set = (!node_set.is_empty()).then_some(node_set);

    let added = memory
        .add(&sources, dataset, node_set)
        .await
        .context("Failed to add data")?;

    for data in &added {
        info!("Registered {} ({}, {})", data.name, data.mime_type, data.id);
    }
    println!(
        "{}",
        format_success(&format!("Added {} item(s) to {}", added.len(), dataset))
    );

    Ok(())
}

async fn cmd_cognify(memory: &GraphMemory, datasets: &[String]) -> Result<()> {
    let start_time = Instant::now();
    let names: Vec<&str> = datasets.iter().map(String::as_str).collect();

    let stats = memory
        .cognify(&names)
        .await
        .context("Cognify pipeline failed")?;

    info!(
        "Cognify complete in {:.2}s",
        start_time.elapsed().as_secs_f64()
    );

    if stats.documents_failed > 0 {
        println!(
            "{}",
            format_warning(&format!(
                "{} item(s) failed, rerun cognify to retry them",
                stats.documents_failed
            ))
        );
    }
    println!(
        "{}",
        format_success(&format!(
            "Processed {} item(s): {} chunks, {} entities",
            stats.documents_processed, stats.chunks_created, stats.entities_extracted
        ))
    );

    Ok(())
}

async fn cmd_ingest(
    memory: &GraphMemory,
    sources: &[String],
    dataset: &str,
    node_set: &[String],
) -> Result<()> {
    println!("{}", format_step(1, 2, "add"));
    cmd_add(memory, sources, dataset, node_set).await?;

    println!("{}", format_step(2, 2, "cognify"));
    cmd_cognify(memory, &[dataset.to_string()]).await
}

async fn cmd_search(
    memory: &GraphMemory,
    query: &str,
    query_type: SearchType,
    top_k: Option<usize>,
    node_set: Vec<String>,
) -> Result<()> {
    info!("Searching ({}) for: {}", query_type, query);

    let mut request = SearchRequest::new(query_type, query);
    if let Some(top_k) = top_k {
        request = request.with_top_k(top_k);
    }
    if !node_set.is_empty() {
        request = request.with_node_set(NodeType::NodeSet, node_set);
    }

    let results = memory.search_with(request).await.context("Search failed")?;

    if results.is_empty() {
        println!("{}", format_info("No results found"));
        return Ok(());
    }

    println!(
        "{}",
        format_heading(&format!("{} result(s) for '{}'", results.len(), query))
    );
    for (i, result) in results.iter().enumerate() {
        println!("{}. {}", i + 1, result.format_summary(200));
    }

    Ok(())
}

async fn cmd_context(
    memory: &GraphMemory,
    query: &str,
    node_type: NodeType,
    node_set: Vec<String>,
) -> Result<()> {
    Validator::validate_query(query)?;

    let retriever = memory
        .graph_completion_retriever(Some(node_type), node_set)
        .await?;
    let context = retriever
        .get_context(query)
        .await
        .context("Failed to build context")?;

    if context.is_empty() {
        println!("{}", format_info("No matching nodes"));
    } else {
        println!("{}", context);
    }

    Ok(())
}

async fn cmd_history(memory: &GraphMemory, limit: Option<usize>) -> Result<()> {
    let user = memory.default_user().await?;
    let history = memory.get_history(&user.id, limit).await?;

    println!(
        "{}",
        format_heading(&format!("Search history of {} ({})", user.email, history.len()))
    );
    for entry in &history {
        println!(
            "{} [{}] {:?}: {}",
            entry.created_at.format("%Y-%m-%d %H:%M:%S"),
            entry.query_type,
            entry.kind,
            Validator::truncate_text(&entry.text, 120)
        );
    }

    Ok(())
}

async fn cmd_datasets(memory: &GraphMemory) -> Result<()> {
    let datasets = memory.list_datasets().await?;

    if datasets.is_empty() {
        println!("{}", format_info("No datasets yet"));
        return Ok(());
    }

    for dataset in &datasets {
        println!(
            "{} ({} item(s), created {})",
            dataset.name,
            dataset.data_ids.len(),
            dataset.created_at.format("%Y-%m-%d")
        );
    }

    Ok(())
}

async fn cmd_stats(memory: &GraphMemory) -> Result<()> {
    info!("Gathering statistics");

    let stats = memory.stats().await?;
    println!("{}", serde_json::to_string_pretty(&stats)?);

    Ok(())
}

async fn cmd_health(memory: &GraphMemory) -> Result<()> {
    let report = memory.health().await;
    println!("{}", report.format());

    if !report.is_healthy() {
        error!("One or more components are unhealthy");
        return Err(anyhow::anyhow!("Health check failed"));
    }

    Ok(())
}

async fn cmd_export(memory: &GraphMemory, output: PathBuf, pretty: bool) -> Result<()> {
    info!("Initializing JSON export");

    let manifest = memory
        .export_graph(output, pretty)
        .await
        .context("Export failed")?;

    info!(
        "Export complete: {} nodes, {} edges",
        manifest.total_nodes, manifest.total_edges
    );
    println!(
        "{}",
        format_success(&format!("Wrote {}", manifest.files.join(", ")))
    );

    Ok(())
}

async fn cmd_prune(
    memory: &GraphMemory,
    data: bool,
    system: bool,
    metadata: bool,
    confirm: bool,
) -> Result<()> {
    if !data && !system {
        println!("{}", format_info("Nothing to prune, pass --data and/or --system"));
        return Ok(());
    }

    if !confirm {
        println!(
            "{}",
            format_error("This will delete stored data. Use --confirm to proceed")
        );
        return Ok(());
    }

    if data {
        warn!("Removing data root directory");
        memory.prune_data().await.context("Failed to prune data")?;
        println!("{}", format_success("Data pruned"));
    }

    if system {
        warn!("Pruning system state (metadata: {})", metadata);
        memory
            .prune_system(PruneOptions {
                graph: true,
                vector: true,
                metadata,
            })
            .await
            .context("Failed to prune system")?;
        println!("{}", format_success("System pruned"));
    }

    Ok(())
}
