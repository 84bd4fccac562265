use clap::Parser;
use colored::Colorize;
use miette::Result;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

use deadfield::config::ExtractionConfig;
use deadfield::{
    Confidence, Config, FileStats, GraphBuilder, ModuleFinder, ParallelGraphBuilder,
    ReachabilityAnalyzer, ReportFormat, Reporter,
};

/// deadfield - find dead model fields and methods in Odoo-style addons
#[derive(Parser, Debug)]
#[command(name = "deadfield")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the addons directory to analyze
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Addon directories to analyze (can be specified multiple times)
    #[arg(short, long)]
    target: Vec<PathBuf>,

    /// Patterns to exclude (can be specified multiple times)
    #[arg(short, long)]
    exclude: Vec<String>,

    /// Symbol name patterns to never report as dead (can be specified multiple times)
    #[arg(short, long)]
    retain: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "terminal")]
    format: OutputFormat,

    /// Output file (for json format)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable parallel processing for faster analysis
    #[arg(long)]
    parallel: bool,

    /// List references that resolved to no declaration
    #[arg(long)]
    show_dangling: bool,

    /// Include used symbols in the report
    #[arg(long)]
    include_used: bool,

    /// Minimum confidence for reported dead symbols
    #[arg(long, value_enum, default_value = "low")]
    min_confidence: MinConfidence,

    /// Disable the heuristic scan of view attribute expressions
    #[arg(long)]
    no_view_expressions: bool,

    /// Skip embedded server action and cron code
    #[arg(long)]
    no_automation_code: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode - only output results
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug, Default)]
enum OutputFormat {
    #[default]
    Terminal,
    Json,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
enum MinConfidence {
    #[default]
    Low,
    High,
}

impl From<OutputFormat> for ReportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Terminal => ReportFormat::Terminal,
            OutputFormat::Json => ReportFormat::Json,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    info!("deadfield v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&cli)?;
    run_analysis(&config, &cli)
}

fn run_analysis(config: &Config, cli: &Cli) -> Result<()> {
    let start_time = Instant::now();

    let finder = ModuleFinder::new(config);
    let files = finder.find_files(&cli.path)?;

    if files.is_empty() {
        println!("{}", "No Python or XML files found.".yellow());
        return Ok(());
    }

    let stats = FileStats::from_files(&files);
    info!(
        "Discovered {} files ({} Python, {} XML, {} manifests)",
        stats.total(),
        stats.python_files,
        stats.xml_files,
        stats.manifest_files
    );

    let extraction = ExtractionConfig {
        view_expressions: config.extraction.view_expressions && !cli.no_view_expressions,
        automation_code: config.extraction.automation_code && !cli.no_automation_code,
    };

    let (registry, graph) = if cli.parallel {
        ParallelGraphBuilder::with_config(extraction).build_from_files(&files)?
    } else {
        let mut builder = GraphBuilder::with_config(extraction);
        for file in &files {
            if let Err(e) = builder.process_file(file) {
                warn!("Skipping file: {e}");
            }
        }
        builder.build()
    };

    info!(
        "Registry: {} models, {} symbols; graph: {} referenced symbols, {} edges, {} dangling",
        registry.model_count(),
        registry.symbol_count(),
        graph.symbol_count(),
        graph.edge_count(),
        graph.dangling().len()
    );

    let analyzer = ReachabilityAnalyzer::new();
    let verdicts: Vec<_> = analyzer
        .analyze(&registry, &graph)
        .into_iter()
        .filter(|v| !config.should_retain(&v.symbol.name))
        .filter(|v| {
            cli.min_confidence == MinConfidence::Low
                || !v.is_dead()
                || v.confidence == Confidence::High
        })
        .collect();

    let show_dangling = cli.show_dangling || config.report.show_dangling;
    let include_used = cli.include_used || config.report.include_used;
    Reporter::new(cli.format.clone().into(), cli.output.clone())
        .include_used(include_used)
        .show_dangling(show_dangling)
        .report(&verdicts, graph.dangling())?;

    info!("Analysis completed in {:.2?}", start_time.elapsed());
    Ok(())
}

fn init_logging(verbose: bool, quiet: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else {
        Config::from_default_locations(&cli.path)?
    };

    // Command-line arguments extend the file configuration.
    config.targets.extend(cli.target.iter().cloned());
    config.exclude.extend(cli.exclude.iter().cloned());
    config.retain_patterns.extend(cli.retain.iter().cloned());

    Ok(config)
}
