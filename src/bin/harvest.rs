//! harvest: run LinkedIn automation pipelines and export the results
//!
//! Usage:
//!   # Post details plus likers and comments, exported to ./outputs
//!   harvest post https://www.linkedin.com/posts/... --likers --comments
//!
//!   # Posts by decision-makers for a keyword, last week only
//!   harvest decision-makers "generative ai" --time-range past-week --limit 50
//!
//!   # Enrich a spreadsheet of profile URLs
//!   harvest batch leads.xlsx --output-dir ./enriched
//!
//!   # Flatten a saved payload to CSV on stdout
//!   harvest normalize payload.json
//!
//! Credentials come from flags or the environment; a `.env` file in the
//! working directory is loaded first.

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use harvest::comments::{CommentGenerator, InferenceClient, SHEET_NAME};
use harvest::jobs::{resolve_automation, SystemClock};
use harvest::pipeline::search::{DEFAULT_PEOPLE_SEARCH, DEFAULT_POST_SEARCH};
use harvest::pipeline::{
    AutomationKind, CompanyOptions, PostOptions, PostSearchOptions, PostedBy, ProfileOptions,
    SortOrder, TimeRange, LINKEDIN_PLATFORM_ID,
};
use harvest::report::write_table;
use harvest::{
    input, telemetry, InferenceSettings, JobClient, KeywordSet, Orchestrator, PipelineRun,
    ProviderSettings, ReportAssembler, TableNormalizer, TabularResult, TexauClient,
};
use serde_json::Value;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "harvest")]
#[command(about = "Run LinkedIn automation pipelines and export flat tables", long_about = None)]
struct Cli {
    #[command(flatten)]
    provider: ProviderArgs,

    /// Directory for exported sheets (one CSV per sheet)
    #[arg(long, short = 'o', global = true, default_value = "outputs")]
    output_dir: PathBuf,

    /// Rows of the main table to print after a run
    #[arg(long, global = true, default_value_t = 10)]
    preview: usize,

    /// File with one decision-maker keyword per line (replaces the built-in list)
    #[arg(long, global = true, value_name = "FILE")]
    keywords: Option<PathBuf>,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct ProviderArgs {
    #[arg(long, env = "TEXAU_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Connected LinkedIn account the jobs run under
    #[arg(long, env = "TEXAU_ACCOUNT_ID", global = true)]
    account_id: Option<String>,

    #[arg(long, env = "TEXAU_BASE_URL", global = true)]
    base_url: Option<String>,

    /// Workspace context sent with every request
    #[arg(long, env = "TEXAU_CONTEXT", global = true)]
    context: Option<String>,

    #[arg(long, env = "TEXAU_TIMEZONE", global = true)]
    timezone: Option<String>,
}

#[derive(Args, Debug)]
struct SearchArgs {
    /// Keyword or LinkedIn search URL
    query: String,

    /// past-24h, past-week or past-month
    #[arg(long)]
    time_range: Option<TimeRange>,

    /// date_posted or relevance
    #[arg(long)]
    sort: Option<SortOrder>,

    /// first, me or following
    #[arg(long)]
    posted_by: Option<PostedBy>,

    /// Posts to extract (1-2500)
    #[arg(long, default_value_t = DEFAULT_POST_SEARCH)]
    limit: u32,
}

impl SearchArgs {
    fn options(&self) -> PostSearchOptions {
        PostSearchOptions {
            time_range: self.time_range,
            sort: self.sort,
            posted_by: self.posted_by,
            limit: self.limit,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Post details, optionally with likers and comments
    Post {
        url: String,
        #[arg(long)]
        likers: bool,
        #[arg(long)]
        comments: bool,
    },

    /// Profile details, sections, and optional activity exports
    Profile {
        url: String,
        /// Export recent activity (default count 10)
        #[arg(long, value_name = "COUNT", num_args = 0..=1, default_missing_value = "10")]
        activity: Option<u32>,
        /// Export recent posts (default count 5)
        #[arg(long, value_name = "COUNT", num_args = 0..=1, default_missing_value = "5")]
        posts: Option<u32>,
    },

    /// Company details, optionally with decision-maker employees and activity
    Company {
        url: String,
        #[arg(long)]
        employees: bool,
        #[arg(long)]
        activity: bool,
    },

    /// Post search, unfiltered
    Search(SearchArgs),

    /// Post search keeping authors with decision-maker headlines
    DecisionMakers(SearchArgs),

    /// People search keeping decision-maker headlines
    People {
        query: String,
        /// Profiles to extract (1-1000)
        #[arg(long, default_value_t = DEFAULT_PEOPLE_SEARCH)]
        limit: u32,
    },

    /// Enrich a CSV/Excel file of profile URLs (column liPublicProfileURL)
    Batch { file: PathBuf },

    /// Suggest a comment for every post in a CSV/Excel file (column liPostContent)
    Comments {
        file: PathBuf,
        #[arg(long, env = "HF_ENDPOINT")]
        hf_endpoint: Option<String>,
        #[arg(long, env = "HF_TOKEN", hide_env_values = true)]
        hf_token: Option<String>,
    },

    /// Flatten a saved JSON payload (or NDJSON) and print it as CSV
    Normalize { file: Option<PathBuf> },

    /// List automations offered by the provider
    Automations {
        /// Show only the first automation whose label contains this text
        #[arg(long)]
        label: Option<String>,
        /// List the automations the pipelines use instead
        #[arg(long)]
        builtin: bool,
    },
}

fn main() -> Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    telemetry::init(cli.verbose);

    match &cli.command {
        Command::Normalize { file } => normalize(file.as_deref()),
        Command::Comments { file, hf_endpoint, hf_token } => {
            comments(&cli, file, hf_endpoint.clone(), hf_token.clone())
        }
        Command::Automations { label, builtin } => automations(&cli, label.as_deref(), *builtin),
        _ => run_pipeline(&cli),
    }
}

fn provider_settings(args: &ProviderArgs) -> Result<ProviderSettings> {
    let settings = ProviderSettings::new(
        args.api_key.clone(),
        args.account_id.clone(),
        args.base_url.clone(),
        args.context.clone(),
        args.timezone.clone(),
    )?;
    Ok(settings)
}

fn run_pipeline(cli: &Cli) -> Result<()> {
    let settings = provider_settings(&cli.provider)?;
    let client = TexauClient::new(&settings);
    let clock = SystemClock;
    let mut orchestrator = Orchestrator::new(&client, &clock, &settings);
    if let Some(path) = &cli.keywords {
        let keywords = KeywordSet::from_file(path)?;
        info!(count = keywords.len(), "loaded decision-maker keywords");
        orchestrator = orchestrator.with_keywords(keywords);
    }

    let run = match &cli.command {
        Command::Post { url, likers, comments } => orchestrator.post(
            url,
            &PostOptions {
                likers: *likers,
                comments: *comments,
            },
        )?,
        Command::Profile { url, activity, posts } => orchestrator.profile(
            url,
            &ProfileOptions {
                activity: *activity,
                posts: *posts,
            },
        )?,
        Command::Company { url, employees, activity } => orchestrator.company(
            url,
            &CompanyOptions {
                employees: *employees,
                activity: *activity,
            },
        )?,
        Command::Search(args) => orchestrator.post_search(&args.query, &args.options())?,
        Command::DecisionMakers(args) => orchestrator.decision_maker_posts(&args.query, &args.options())?,
        Command::People { query, limit } => orchestrator.people_search(query, *limit)?,
        Command::Batch { file } => {
            let table = input::read_table(file)?;
            let batch = orchestrator.batch_profiles(&table)?;
            println!("Extracted {}/{} profiles", batch.processed, batch.total);
            if let Some(error) = batch.errors.first() {
                eprintln!(
                    "Batch stopped at {}: {}. Remaining profiles were not attempted.",
                    error.identifier, error.failure
                );
            }
            batch.run
        }
        other => bail!("{:?} is not a pipeline command", other),
    };

    finish(cli, run)
}

/// Print warnings and a preview, then export every non-empty sheet
fn finish(cli: &Cli, run: PipelineRun) -> Result<()> {
    for warning in &run.warnings {
        eprintln!("warning: {}", warning);
    }

    for (sheet, table) in run.sheets() {
        println!("{}: {} rows, {} columns", sheet, table.len(), table.width());
    }
    print_preview(&run.preview_table(), cli.preview)?;

    export(cli, run.into_report())
}

fn export(cli: &Cli, report: ReportAssembler) -> Result<()> {
    if report.exportable().next().is_none() {
        warn!("nothing to export");
        return Ok(());
    }
    for path in report.write_csv_dir(&cli.output_dir)? {
        println!("wrote {}", path.display());
    }
    Ok(())
}

fn print_preview(table: &TabularResult, rows: usize) -> Result<()> {
    if rows == 0 || table.is_empty() {
        return Ok(());
    }
    println!();
    write_table(&table.head(rows), std::io::stdout().lock())?;
    println!();
    Ok(())
}

fn comments(cli: &Cli, file: &Path, endpoint: Option<String>, token: Option<String>) -> Result<()> {
    let settings = InferenceSettings::new(endpoint, token)?;
    let table = input::read_table(file)?;
    println!("Loaded {} rows from {}", table.len(), file.display());

    let client = InferenceClient::new(&settings);
    let clock = SystemClock;
    let generator = CommentGenerator::new(&client, &clock, settings.pause);

    info!("testing inference endpoint");
    if let Err(e) = generator.check_connection() {
        bail!(
            "Connection failed: {}. The endpoint may be cold starting; retry in a minute or two.",
            e
        );
    }

    let result = generator.annotate(&table)?;
    println!(
        "Generated {}/{} comments ({} failed, {} without content)",
        result.generated,
        result.table.len(),
        result.failed,
        result.skipped
    );
    print_preview(&result.table, cli.preview)?;

    let mut report = ReportAssembler::new();
    report.add(SHEET_NAME, result.table);
    export(cli, report)
}

fn automations(cli: &Cli, label: Option<&str>, builtin: bool) -> Result<()> {
    if builtin {
        for kind in AutomationKind::ALL {
            let (name, description) = kind.label();
            println!("{}  {:<26} {}", kind.id(), name, description);
        }
        return Ok(());
    }

    let settings = provider_settings(&cli.provider)?;
    let client = TexauClient::new(&settings);
    let automations = client
        .list_automations(LINKEDIN_PLATFORM_ID)
        .context("Failed to list automations")?;

    match label {
        Some(label) => match resolve_automation(&automations, label) {
            Some(automation) => println!("{}  {}", automation.id, automation.label),
            None => bail!("No automation label contains {:?}", label),
        },
        None => {
            for automation in &automations {
                println!("{}  {}", automation.id, automation.label);
            }
        }
    }
    Ok(())
}

/// Parse with simd-json, falling back to one JSON value per line
fn normalize(file: Option<&Path>) -> Result<()> {
    let mut content = Vec::new();
    match file {
        Some(path) => {
            content = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        }
        None => {
            std::io::stdin()
                .read_to_end(&mut content)
                .context("Failed to read stdin")?;
        }
    }

    // simd-json parses in place, so keep an untouched copy for the fallback
    let mut scratch = content.clone();
    let payloads: Vec<Value> = match simd_json::serde::from_slice::<Value>(&mut scratch) {
        Ok(value) => vec![value],
        Err(_) => String::from_utf8_lossy(&content)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(serde_json::from_str::<Value>)
            .collect::<std::result::Result<_, _>>()
            .context("Failed to parse JSON input")?,
    };

    let normalizer = TableNormalizer::new(Default::default());
    let (table, report) = if payloads.len() == 1 {
        normalizer.normalize(&payloads[0])
    } else {
        normalizer.normalize_all(&payloads)
    };
    info!(records = report.records, skipped = report.skipped, "payload normalized");

    write_table(&table, std::io::stdout().lock())
}
