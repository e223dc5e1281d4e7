//! Component graph CLI.
//!
//! Provides the `compgraph` binary: build local and runtime component
//! graphs, inspect saved graphs, and plan deployments by diffing a local
//! graph against a runtime one.
//!
//! Results are printed as JSON on stdout; logs and errors go to stderr.
//! Exit codes: 0 = success, 1 = invalid input, 2 = runtime unreachable,
//! 3 = I/O error.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use compgraph_analysis::{
    deployment_order, find_cycles, full_deployment_order, plan_deployment,
    transitive_dependencies,
};
use compgraph_builder::{
    build_local_graph_from_config, build_runtime_graph, BuilderError, CompgraphConfig,
    HttpRuntimeAdapter, RuntimeAdapter,
};
use compgraph_core::{ComponentGraph, ComponentId, GraphNode};

const EXIT_INPUT: i32 = 1;
const EXIT_UNREACHABLE: i32 = 2;
const EXIT_IO: i32 = 3;

const DEFAULT_CONFIG_FILE: &str = "compgraph.toml";

/// Component dependency graphs for workflow runtimes.
#[derive(Parser)]
#[command(name = "compgraph", about = "Component dependency graphs for workflow runtimes")]
struct Cli {
    /// Config file (default: ./compgraph.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a graph from local definition files.
    Local {
        /// Root directory to scan (default: `local.root` from config).
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Also scan hidden directories.
        #[arg(long)]
        include_hidden: bool,

        /// Write the graph here instead of stdout.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Build a graph from a deployed runtime.
    Runtime {
        #[arg(short, long)]
        env: Option<String>,

        #[arg(short, long)]
        domain: Option<String>,

        /// Write the graph here instead of stdout.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Node and edge counts of a saved graph.
    Stats {
        #[arg(short, long)]
        graph: PathBuf,
    },

    /// Direct and transitive dependencies of one component.
    Deps {
        #[arg(short, long)]
        graph: PathBuf,

        /// Component id, `domain/flow/key@version`.
        #[arg(short, long)]
        id: String,
    },

    /// Deployment order of the given ids (all nodes when none are given).
    Order {
        #[arg(short, long)]
        graph: PathBuf,

        ids: Vec<String>,
    },

    /// Dependency cycles in a saved graph.
    Cycles {
        #[arg(short, long)]
        graph: PathBuf,
    },

    /// Deployment plan for a local graph over a runtime graph.
    Diff {
        #[arg(short, long)]
        local: PathBuf,

        #[arg(short, long)]
        runtime: PathBuf,
    },

    /// Check that the runtime answers.
    Ping {
        #[arg(short, long)]
        env: Option<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("compgraph=info,warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(code) => process::exit(code),
    };

    let exit_code = match cli.command {
        Commands::Local {
            root,
            include_hidden,
            out,
        } => run_local(config, root, include_hidden, out.as_deref()),
        Commands::Runtime { env, domain, out } => run_runtime(config, env, domain, out.as_deref()),
        Commands::Stats { graph } => run_stats(&graph),
        Commands::Deps { graph, id } => run_deps(&graph, &id),
        Commands::Order { graph, ids } => run_order(&graph, &ids),
        Commands::Cycles { graph } => run_cycles(&graph),
        Commands::Diff { local, runtime } => run_diff(&local, &runtime),
        Commands::Ping { env } => run_ping(config, env),
    };
    process::exit(exit_code);
}

/// Loads the config file, then applies `COMPGRAPH_API_TOKEN` and
/// `COMPGRAPH_BASE_URL`.
fn load_config(path: Option<&Path>) -> Result<CompgraphConfig, i32> {
    let mut config = match path {
        Some(path) => CompgraphConfig::load(path).map_err(|e| report(&e))?,
        None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
            CompgraphConfig::load(Path::new(DEFAULT_CONFIG_FILE)).map_err(|e| report(&e))?
        }
        None => CompgraphConfig::default(),
    };
    config.apply_overrides(
        std::env::var("COMPGRAPH_API_TOKEN").ok(),
        std::env::var("COMPGRAPH_BASE_URL").ok(),
    );
    Ok(config)
}

fn exit_code_for(err: &BuilderError) -> i32 {
    match err {
        BuilderError::Io { .. } => EXIT_IO,
        BuilderError::Unreachable(_) | BuilderError::Adapter(_) => EXIT_UNREACHABLE,
        BuilderError::Config(_) | BuilderError::Core(_) => EXIT_INPUT,
    }
}

/// Prints `err` and returns its exit code.
fn report(err: &BuilderError) -> i32 {
    eprintln!("Error: {}", err);
    exit_code_for(err)
}

/// Prints `value` as JSON to `out`, or stdout when `out` is `None`.
fn emit<T: Serialize>(value: &T, out: Option<&Path>) -> i32 {
    let json = match serde_json::to_string_pretty(value) {
        Ok(json) => json,
        Err(e) => {
            eprintln!("Error: failed to serialize output: {}", e);
            return EXIT_INPUT;
        }
    };
    match out {
        Some(path) => match std::fs::write(path, json) {
            Ok(()) => 0,
            Err(e) => {
                eprintln!("Error: failed to write '{}': {}", path.display(), e);
                EXIT_IO
            }
        },
        None => {
            println!("{}", json);
            0
        }
    }
}

fn read_graph(path: &Path) -> Result<ComponentGraph, i32> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        eprintln!("Error: failed to read '{}': {}", path.display(), e);
        EXIT_IO
    })?;
    ComponentGraph::from_json(&content).map_err(|e| {
        eprintln!("Error: invalid graph '{}': {}", path.display(), e);
        EXIT_INPUT
    })
}

fn async_runtime() -> Result<tokio::runtime::Runtime, i32> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| {
            eprintln!("Error: failed to start async runtime: {}", e);
            EXIT_IO
        })
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

fn run_local(
    mut config: CompgraphConfig,
    root: Option<PathBuf>,
    include_hidden: bool,
    out: Option<&Path>,
) -> i32 {
    if let Some(root) = root {
        config.local.root = root;
    }
    config.local.include_hidden |= include_hidden;

    let build = match build_local_graph_from_config(&config.local, &config.defaults) {
        Ok(build) => build,
        Err(e) => return report(&e),
    };
    for skipped in &build.skipped {
        eprintln!("skipped {}: {}", skipped.path.display(), skipped.reason);
    }
    emit(&build.graph.to_serialized(), out)
}

fn run_runtime(
    mut config: CompgraphConfig,
    env: Option<String>,
    domain: Option<String>,
    out: Option<&Path>,
) -> i32 {
    if let Some(env) = env {
        config.runtime.env = env;
    }
    if let Some(domain) = domain {
        config.runtime.domain = domain;
    }

    let adapter = match HttpRuntimeAdapter::new(&config.runtime) {
        Ok(adapter) => adapter,
        Err(e) => return report(&BuilderError::from(e)),
    };
    let rt = match async_runtime() {
        Ok(rt) => rt,
        Err(code) => return code,
    };

    let build = match rt.block_on(build_runtime_graph(&adapter, &config.runtime, &config.defaults))
    {
        Ok(build) => build,
        Err(e) => return report(&e),
    };
    match serde_json::to_string_pretty(&build.report) {
        Ok(json) => eprintln!("{}", json),
        Err(e) => tracing::warn!(error = %e, "failed to serialize build report"),
    }
    emit(&build.graph.to_serialized(), out)
}

fn run_ping(mut config: CompgraphConfig, env: Option<String>) -> i32 {
    if let Some(env) = env {
        config.runtime.env = env;
    }
    let adapter = match HttpRuntimeAdapter::new(&config.runtime) {
        Ok(adapter) => adapter,
        Err(e) => return report(&BuilderError::from(e)),
    };
    let rt = match async_runtime() {
        Ok(rt) => rt,
        Err(code) => return code,
    };

    let reachable = rt.block_on(adapter.test_connection(&config.runtime.env));
    let code = emit(
        &serde_json::json!({
            "baseUrl": config.runtime.base_url,
            "env": config.runtime.env,
            "reachable": reachable,
        }),
        None,
    );
    if reachable {
        code
    } else {
        EXIT_UNREACHABLE
    }
}

// ---------------------------------------------------------------------------
// Queries over saved graphs
// ---------------------------------------------------------------------------

fn run_stats(path: &Path) -> i32 {
    match read_graph(path) {
        Ok(graph) => emit(&graph.stats(), None),
        Err(code) => code,
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DepsOutput {
    id: ComponentId,
    dependencies: Vec<ComponentId>,
    transitive: Vec<ComponentId>,
    dependents: Vec<ComponentId>,
}

fn run_deps(path: &Path, id: &str) -> i32 {
    let graph = match read_graph(path) {
        Ok(graph) => graph,
        Err(code) => return code,
    };
    let id = ComponentId::new(id);
    if !graph.has_node(id.as_str()) {
        eprintln!("Error: component '{}' not found", id);
        return EXIT_INPUT;
    }

    let output = DepsOutput {
        dependencies: node_ids(graph.dependencies(id.as_str())),
        transitive: node_ids(transitive_dependencies(&graph, id.as_str())),
        dependents: node_ids(graph.dependents(id.as_str())),
        id,
    };
    emit(&output, None)
}

fn node_ids(nodes: Vec<&GraphNode>) -> Vec<ComponentId> {
    nodes.iter().map(|n| n.id()).collect()
}

fn run_order(path: &Path, ids: &[String]) -> i32 {
    let graph = match read_graph(path) {
        Ok(graph) => graph,
        Err(code) => return code,
    };
    let order = if ids.is_empty() {
        full_deployment_order(&graph)
    } else {
        let ids: Vec<ComponentId> = ids.iter().map(ComponentId::new).collect();
        deployment_order(&graph, &ids)
    };
    emit(&order, None)
}

fn run_cycles(path: &Path) -> i32 {
    match read_graph(path) {
        Ok(graph) => emit(&find_cycles(&graph), None),
        Err(code) => code,
    }
}

fn run_diff(local: &Path, runtime: &Path) -> i32 {
    let local = match read_graph(local) {
        Ok(graph) => graph,
        Err(code) => return code,
    };
    let runtime = match read_graph(runtime) {
        Ok(graph) => graph,
        Err(code) => return code,
    };
    emit(&plan_deployment(&local, &runtime), None)
}
