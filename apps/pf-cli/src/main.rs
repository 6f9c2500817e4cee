use clap::{Parser, Subcommand};
use pf_app::{
    AppResult, Engine, EngineOptions, RunResponse, RunTiming, project_service, run_service,
};
use pf_core::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "pf-cli")]
#[command(about = "PlantFlow CLI - techno-economic plant composition tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate project file syntax and structure
    Validate {
        /// Path to the project YAML file
        project_path: PathBuf,
    },
    /// List technologies in a project
    Technologies {
        /// Path to the project YAML file
        project_path: PathBuf,
    },
    /// Assemble the plant and print its evaluation order
    Order {
        /// Path to the project YAML file
        project_path: PathBuf,
    },
    /// Export the assembled plant graph in DOT format
    Graph {
        /// Path to the project YAML file
        project_path: PathBuf,
        /// Output file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Evaluate the plant
    Run {
        /// Path to the project YAML file
        project_path: PathBuf,
        /// Skip the sub-simulation cache
        #[arg(long)]
        no_cache: bool,
        /// Cache directory (defaults to <project dir>/.plantflow/cache)
        #[arg(long)]
        cache_dir: Option<PathBuf>,
        /// Write every node's outputs as JSON to this file
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Inspect or clear the sub-simulation cache of a project
    #[command(subcommand)]
    Cache(CacheCommands),
}

#[derive(Subcommand)]
enum CacheCommands {
    /// List cache entries
    List {
        /// Path to the project YAML file
        project_path: PathBuf,
    },
    /// Remove every cache entry
    Clear {
        /// Path to the project YAML file
        project_path: PathBuf,
    },
}

fn main() -> AppResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { project_path } => cmd_validate(&project_path),
        Commands::Technologies { project_path } => cmd_technologies(&project_path),
        Commands::Order { project_path } => cmd_order(&project_path),
        Commands::Graph {
            project_path,
            output,
        } => cmd_graph(&project_path, output.as_deref()),
        Commands::Run {
            project_path,
            no_cache,
            cache_dir,
            json,
        } => {
            let mut options = EngineOptions::default();
            if no_cache {
                options = options.without_cache();
            }
            if let Some(dir) = cache_dir {
                options = options.with_cache_dir(dir);
            }
            cmd_run(&project_path, options, json.as_deref())
        }
        Commands::Cache(CacheCommands::List { project_path }) => cmd_cache_list(&project_path),
        Commands::Cache(CacheCommands::Clear { project_path }) => cmd_cache_clear(&project_path),
    }
}

fn cmd_validate(project_path: &Path) -> AppResult<()> {
    println!("Validating project: {}", project_path.display());
    let project = project_service::load_project(project_path)?;
    project_service::validate_project(&project)?;
    let plant = Engine::default().assemble(&project)?;
    println!(
        "✓ Project is valid ({} nodes, {} edges)",
        plant.graph().nodes().len(),
        plant.graph().edges().len()
    );
    Ok(())
}

fn cmd_technologies(project_path: &Path) -> AppResult<()> {
    let project = project_service::load_project(project_path)?;
    let techs = project_service::list_technologies(&project);

    if techs.is_empty() {
        println!("No technologies found in project");
        return Ok(());
    }
    println!("Technologies in project:");
    for tech in techs {
        if !tech.feedstocks.is_empty() {
            println!("  {} - feedstocks: {}", tech.name, tech.feedstocks.join(", "));
            continue;
        }
        let slot = |m: &Option<String>| m.clone().unwrap_or_else(|| "-".to_string());
        println!(
            "  {} - performance: {}, cost: {}, financial: {}",
            tech.name,
            slot(&tech.performance_model),
            slot(&tech.cost_model),
            slot(&tech.financial_model)
        );
    }
    Ok(())
}

fn cmd_order(project_path: &Path) -> AppResult<()> {
    let project = project_service::load_project(project_path)?;
    let plant = Engine::default().assemble(&project)?;
    println!("Evaluation order:");
    for (i, name) in plant.order().iter().enumerate() {
        let kind = plant
            .node(name)
            .map(|n| n.kind().to_string())
            .unwrap_or_default();
        println!("  {:>2}. {} ({})", i + 1, name, kind);
    }
    Ok(())
}

fn cmd_graph(project_path: &Path, output: Option<&Path>) -> AppResult<()> {
    let project = project_service::load_project(project_path)?;
    let plant = Engine::default().assemble(&project)?;
    let dot = plant.to_dot();
    match output {
        Some(path) => {
            std::fs::write(path, dot)?;
            info!(path = %path.display(), "wrote plant diagram");
            println!("✓ Wrote {}", path.display());
        }
        None => print!("{}", dot),
    }
    Ok(())
}

fn cmd_run(project_path: &Path, options: EngineOptions, json: Option<&Path>) -> AppResult<()> {
    println!("Running plant: {}", project_path.display());
    debug!(
        use_cache = options.use_cache,
        cache_dir = ?options.cache_dir,
        "engine options"
    );
    let response = run_service::run_project(project_path, options)?;
    println!("✓ Evaluated {} nodes", response.results.order().len());
    print_summary(&response);
    print_timing_summary(&response.timing);

    if let Some(path) = json {
        let content = serde_json::to_string_pretty(&response.results)
            .map_err(|e| pf_app::AppError::Project(format!("Failed to serialize results: {}", e)))?;
        std::fs::write(path, content)?;
        println!("✓ Wrote results to {}", path.display());
    }
    Ok(())
}

fn print_summary(response: &RunResponse) {
    let results = &response.results;
    match &response.cache_dir {
        Some(dir) => println!(
            "  Cache: {} hits, {} misses ({})",
            results.cache_hits(),
            results.cache_misses(),
            dir.display()
        ),
        None => println!("  Cache: disabled"),
    }

    for name in results.order() {
        let Some(ports) = results.node(name) else {
            continue;
        };
        let scalars: Vec<String> = ports
            .iter()
            .filter_map(|(port, value)| match value {
                Value::Scalar(v) => Some(format!("{}={:.4e}", port, v)),
                Value::Series(_) => None,
            })
            .collect();
        if !scalars.is_empty() {
            println!("  {}: {}", name, scalars.join(", "));
        }
    }

    if let (Some(capex), Some(opex)) = (results.total_capex(), results.total_opex()) {
        println!("\nPlant totals:");
        println!("  CapEx: {:.2} USD", capex);
        println!("  OpEx:  {:.2} USD/year", opex);
    }
    if let Some(cost) = results.levelized_cost() {
        println!("  Levelized cost: {:.4} USD/kg", cost);
    }
}

fn print_timing_summary(timing: &RunTiming) {
    println!("\nTiming summary:");
    println!("  Compile:  {:.3}s", timing.compile_time_s);
    println!("  Evaluate: {:.3}s", timing.evaluate_time_s);
    println!("  Total:    {:.3}s", timing.total_time_s);
}

fn cmd_cache_list(project_path: &Path) -> AppResult<()> {
    let entries = run_service::list_cache(project_path, &EngineOptions::default())?;
    if entries.is_empty() {
        println!("No cache entries for project");
        return Ok(());
    }
    println!("Cache entries:");
    for entry in entries {
        println!(
            "  {}  {}  {} ({} fields)",
            entry.key.get(..12).unwrap_or(&entry.key),
            entry.created_at,
            entry.namespace,
            entry.fields.len()
        );
    }
    Ok(())
}

fn cmd_cache_clear(project_path: &Path) -> AppResult<()> {
    let removed = run_service::clear_cache(project_path, &EngineOptions::default())?;
    println!("✓ Removed {} cache entries", removed);
    Ok(())
}
