use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use akhaan::analysis::{Analyzer, AnalyzerOptions, GroqClient, LiteralFiller};
use akhaan::collector::Collector;
use akhaan::config::{self, PipelineConfig};
use akhaan::env::{self, core::LogLevel, EnvVar};
use akhaan::eval::{self, Embedder, HttpEmbedder};
use akhaan::merge;
use akhaan::network::HttpFetcher;
use akhaan::present::ProverbIndex;
use akhaan::storage::{dataset, CacheStore};
use akhaan::{ErrorCategory, MergedEntry, PipelineError, PipelineResult};

#[derive(Parser)]
#[command(name = "akhaan", version, about = "Collect, analyze and search Punjabi proverbs")]
struct Cli {
    /// Config file (default: first of akhaan.toml, .akhaan.toml, ~/.config/akhaan/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// trace, debug, info, warn or error (default: AKHAAN_LOG_LEVEL, then info)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scrape every category of the proverb site
    Scrape {
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Fill in missing literal translations
    Fill {
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Analyze every proverb, reusing cached results
    Analyze {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        cache: Option<PathBuf>,
    },
    /// Join proverbs with their successful analyses
    Merge {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        cache: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Find proverbs by romanized spelling
    Search {
        query: String,
        #[arg(long)]
        data: Option<PathBuf>,
        /// Show the analysis of the N-th candidate (1-based)
        #[arg(long)]
        pick: Option<usize>,
    },
    /// Show one proverb's analysis
    Show {
        id: u64,
        #[arg(long)]
        data: Option<PathBuf>,
    },
    /// Score generated meanings against the gold-standard set
    Evaluate {
        #[arg(long)]
        gold: Option<PathBuf>,
        #[arg(long)]
        cache: Option<PathBuf>,
        /// Also write the report as JSON
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Inspect or prune the analysis cache
    Cache {
        #[arg(long)]
        cache: Option<PathBuf>,
        #[command(subcommand)]
        action: CacheAction,
    },
    /// Print the effective configuration as TOML
    Config,
    /// Serve the search page
    #[cfg(feature = "web")]
    Serve {
        #[arg(long)]
        data: Option<PathBuf>,
        #[arg(long)]
        port: Option<u16>,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Entry and error counts
    Stats,
    /// Drop cached errors so the next run retries them
    ClearErrors,
    /// Drop one entry by its exact Gurmukhi text
    Forget { proverb: String },
}

fn init_tracing(cli_level: Option<&str>) {
    let level = cli_level
        .map(str::to_string)
        .or_else(|| LogLevel::lookup().ok().flatten())
        .unwrap_or_else(|| "info".to_string());
    let filter = EnvFilter::try_new(format!("akhaan={level}"))
        .unwrap_or_else(|_| EnvFilter::new("akhaan=info"));
    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
    {
        eprintln!("Warning: logging disabled: {e}");
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    // .env 中可能设置了日志级别
    config::load_dotenv();
    init_tracing(cli.log_level.as_deref());

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(category = ?e.category(), fatal = e.is_fatal(), "command failed");
            eprintln!("Error: {e}");
            exit_code(e.category())
        }
    }
}

fn exit_code(category: ErrorCategory) -> ExitCode {
    match category {
        ErrorCategory::Configuration => ExitCode::from(2),
        ErrorCategory::Input => ExitCode::from(3),
        ErrorCategory::Evaluation => ExitCode::from(4),
        _ => ExitCode::FAILURE,
    }
}

fn run(cli: Cli) -> PipelineResult<()> {
    let (config, _) = PipelineConfig::load(cli.config.as_deref())?;
    let path_or = |flag: Option<PathBuf>, default: &str| flag.unwrap_or_else(|| PathBuf::from(default));

    match cli.command {
        Command::Scrape { output } => {
            let output = path_or(output, &config.files.proverbs);
            let fetcher = HttpFetcher::new(config.scraper.user_agent.clone(), config.api.timeout)?;
            let (proverbs, _) = Collector::new(fetcher, &config.scraper)?
                .with_output(&output)
                .collect()?;
            println!(
                "Scraped {} proverbs into {}",
                proverbs.len(),
                output.display()
            );
        }
        Command::Fill { input } => {
            let input = path_or(input, &config.files.proverbs);
            let client = GroqClient::from_config(&config)?;
            let report = LiteralFiller::new(client, &config).fill_file(&input)?;
            println!(
                "Updated {} literal translations ({} left for a later run, {} failed)",
                report.updated, report.rate_limited, report.failed
            );
        }
        Command::Analyze { input, cache } => {
            let input = path_or(input, &config.files.proverbs);
            let cache = CacheStore::open(path_or(cache, &config.files.cache))?;
            let client = GroqClient::from_config(&config)?;
            let mut analyzer =
                Analyzer::new(client, cache).with_options(AnalyzerOptions::from_config(&config));
            let summary = analyzer.analyze_file(&input)?;
            let cache_stats = analyzer.cache().stats();
            tracing::info!(
                hits = cache_stats.hits,
                misses = cache_stats.misses,
                writes = cache_stats.writes,
                "cache usage"
            );
            println!(
                "Analyzed {} proverbs: {} new, {} from cache, {} failed, {} skipped",
                summary.total,
                summary.stats.analyzed,
                summary.stats.cache_hits,
                summary.stats.failed,
                summary.skipped
            );
        }
        Command::Merge {
            input,
            cache,
            output,
        } => {
            let output = path_or(output, &config.files.app_data);
            let count = merge::merge_files(
                &path_or(input, &config.files.proverbs),
                &path_or(cache, &config.files.cache),
                &output,
            )?;
            println!(
                "Merged {} proverbs with analysis into {}",
                count,
                output.display()
            );
        }
        Command::Search { query, data, pick } => {
            let index = ProverbIndex::load(&path_or(data, &config.files.app_data), &config.search)?;
            let hits = index.search(&query);
            if hits.is_empty() {
                println!("No close match found for '{query}'.");
                return Ok(());
            }
            for (position, hit) in hits.iter().enumerate() {
                println!(
                    "{}. {} ({}) [score {}, id {}]",
                    position + 1,
                    hit.proverb_gurmukhi,
                    hit.romanized,
                    hit.score,
                    hit.id
                );
            }
            if let Some(pick) = pick {
                let hit = pick
                    .checked_sub(1)
                    .and_then(|index| hits.get(index))
                    .ok_or_else(|| {
                        PipelineError::InvalidInput(format!(
                            "--pick must be between 1 and {}",
                            hits.len()
                        ))
                    })?;
                if let Some(entry) = index.get(hit.id) {
                    println!();
                    print_entry(entry);
                }
            }
        }
        Command::Show { id, data } => {
            let index = ProverbIndex::load(&path_or(data, &config.files.app_data), &config.search)?;
            let entry = index
                .get(id)
                .ok_or_else(|| PipelineError::InvalidInput(format!("no proverb with id {id}")))?;
            print_entry(entry);
        }
        Command::Evaluate {
            gold,
            cache,
            output,
        } => {
            let gold = dataset::load_gold(&path_or(gold, &config.files.gold))?;
            let cache = CacheStore::open(path_or(cache, &config.files.cache))?;
            let client = GroqClient::from_config(&config)?;
            let mut analyzer =
                Analyzer::new(client, cache).with_options(AnalyzerOptions::from_config(&config));
            let embedder = HttpEmbedder::from_config(&config)?;

            let report = eval::evaluate(
                &mut analyzer,
                &gold,
                embedder.as_ref().map(|e| e as &dyn Embedder),
            )?;
            println!("{}", report.summary());
            if let Some(output) = output {
                report.save(&output)?;
                println!("Report written to {}", output.display());
            }
        }
        Command::Cache { cache, action } => {
            let path = path_or(cache, &config.files.cache);
            run_cache_action(&path, action)?;
        }
        Command::Config => {
            print!("{}", config.to_toml()?);
            println!("\n# Environment variables");
            for (name, description) in env::describe_all() {
                println!("# {name}: {description}");
            }
        }
        #[cfg(feature = "web")]
        Command::Serve { data, port } => {
            let index = ProverbIndex::load(&path_or(data, &config.files.app_data), &config.search)?;
            let mut web_config = config.web.clone();
            if let Some(port) = port {
                web_config.port = port;
            }
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(akhaan::present::web::WebServer::new(web_config, index).start())?;
        }
    }

    Ok(())
}

fn run_cache_action(path: &Path, action: CacheAction) -> PipelineResult<()> {
    let mut cache = CacheStore::open(path)?;
    match action {
        CacheAction::Stats => {
            println!(
                "{}: {} entries, {} errors",
                path.display(),
                cache.len(),
                cache.error_count()
            );
        }
        CacheAction::ClearErrors => {
            let removed = cache.clear_errors()?;
            println!("Removed {removed} cached errors");
        }
        CacheAction::Forget { proverb } => {
            if cache.remove(&proverb)? {
                println!("Removed '{proverb}'");
            } else {
                println!("'{proverb}' is not cached");
            }
        }
    }
    Ok(())
}

fn print_entry(entry: &MergedEntry) {
    println!("{}", entry.proverb_gurmukhi);
    if let Some(ref romanized) = entry.romanized_form {
        println!("{romanized}");
    }
    if !entry.literal_translation.is_empty() {
        println!("\nLiteral translation:\n{}", entry.literal_translation);
    }
    println!("\nMeaning:\n{}", entry.analysis.actual_translation);
    println!("\nDeeper analysis:\n{}", entry.analysis.deeper_analysis);
}
