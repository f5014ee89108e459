use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::Colorize;
use console::Emoji;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use podbridge::{
    ContentReference, DefaultPipeline, FilterKind, NoopReporter, PipelineConfig,
    PipelineOutcome, PlanOptions, PodcastDlTool, ProgressEvent, ProgressReporter,
    ResolutionPlan, SharedProgressReporter, TracingReporter, default_pipeline,
};

// Emoji with fallback for terminals without Unicode support
static MICROPHONE: Emoji<'_, '_> = Emoji("🎙️  ", "");
static SEARCH: Emoji<'_, '_> = Emoji("🔍 ", "[~] ");
static HEADPHONES: Emoji<'_, '_> = Emoji("🎧 ", "[i] ");
static FEED: Emoji<'_, '_> = Emoji("📡 ", "[f] ");
static DOWNLOAD: Emoji<'_, '_> = Emoji("📥 ", "[v] ");
static SUCCESS: Emoji<'_, '_> = Emoji("✅ ", "[+] ");
static FAILURE: Emoji<'_, '_> = Emoji("❌ ", "[!] ");
static FOLDER: Emoji<'_, '_> = Emoji("📁 ", "");
static CROSS: Emoji<'_, '_> = Emoji("✗ ", "x ");

/// Resolve Spotify podcast links to RSS feeds and download the audio
#[derive(Parser, Debug)]
#[command(name = "podbridge")]
#[command(about = "Resolve Spotify podcast links to RSS feeds and download the audio")]
#[command(version)]
struct Args {
    /// Spotify episode/show URLs or spotify: URIs
    #[arg(required = true)]
    references: Vec<String>,

    /// Output directory for downloaded audio
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Download tool timeout in seconds
    #[arg(long, default_value = "600")]
    timeout: u64,

    /// Path to the podcast-dl binary (default: PATH, then npx)
    #[arg(long)]
    tool: Option<PathBuf>,

    /// Maximum number of references processed at once
    #[arg(short = 'c', long, default_value = "1")]
    concurrent: usize,

    /// Search the feed index for this show name instead of the resolved title
    #[arg(short, long)]
    show: Option<String>,

    /// Only resolve and list feed candidates, do not download
    #[arg(long)]
    list_feeds: bool,

    /// Pick the feed to download from interactively
    #[arg(short, long, conflicts_with_all = ["list_feeds", "json"])]
    interactive: bool,

    /// Print one JSON outcome per reference to stdout
    #[arg(long)]
    json: bool,

    /// Quiet mode - suppress progress output
    #[arg(short, long)]
    quiet: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

/// Progress reporter drawing a spinner and status lines on the terminal
struct ConsoleReporter {
    bar: ProgressBar,
}

impl ConsoleReporter {
    fn new() -> Self {
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());

        let bar = ProgressBar::new_spinner();
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressReporter for ConsoleReporter {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::ResolvingTitle { identifier } => {
                self.bar
                    .set_message(format!("{SEARCH}Fetching podcast info: {}", identifier.cyan()));
            }

            ProgressEvent::TitleResolved { title, kind } => {
                self.bar
                    .println(format!("{HEADPHONES}{} ({kind})", title.bold().green()));
            }

            ProgressEvent::SearchingFeeds { query, .. } => {
                self.bar
                    .set_message(format!("{SEARCH}Searching feeds for {}", query.cyan()));
            }

            ProgressEvent::FeedSelected {
                display_name,
                feed_url,
                candidate_count,
            } => {
                self.bar.println(format!(
                    "{FEED}{} • {} ({} candidates)",
                    display_name.bold(),
                    feed_url.cyan(),
                    candidate_count.to_string().yellow()
                ));
            }

            ProgressEvent::DownloadStarting { filter, .. } => {
                let what = match filter {
                    Some(FilterKind::Exact) => "exact title match",
                    Some(FilterKind::Fuzzy) => "fuzzy title match",
                    None => "whole feed",
                };
                self.bar
                    .set_message(format!("{DOWNLOAD}Downloading ({})...", what.yellow()));
            }

            ProgressEvent::DownloadFailed { filter, error, .. } => {
                let tier = filter.map(|f| f.to_string()).unwrap_or_else(|| "feed".to_string());
                self.bar.println(format!(
                    "{FAILURE}{} download failed - {}",
                    tier.red(),
                    error.dimmed()
                ));
            }

            ProgressEvent::DownloadCompleted { file_path } => {
                self.bar.println(format!(
                    "{SUCCESS}{}",
                    file_path.display().to_string().green()
                ));
            }

            ProgressEvent::ResolutionFailed { error } => {
                self.bar.println(format!("{FAILURE}{}", error.red().bold()));
            }
        }
    }
}

async fn process(
    pipeline: &DefaultPipeline,
    input: &str,
    output_dir: &Path,
    options: &PlanOptions,
) -> PipelineOutcome {
    match ContentReference::parse(input) {
        Ok(reference) => {
            let result = pipeline.run_with(&reference, output_dir, options).await;
            PipelineOutcome::from_result(input, &result)
        }
        Err(e) => PipelineOutcome::failure(input, e.to_string()),
    }
}

/// Plan `input`, let the user pick a feed, then download from it
async fn process_interactive(
    pipeline: &DefaultPipeline,
    input: &str,
    output_dir: &Path,
    options: &PlanOptions,
    console: Option<&ConsoleReporter>,
) -> PipelineOutcome {
    let reference = match ContentReference::parse(input) {
        Ok(reference) => reference,
        Err(e) => return PipelineOutcome::failure(input, e.to_string()),
    };
    let mut plan = match pipeline.plan_with(&reference, options).await {
        Ok(plan) => plan,
        Err(e) => return PipelineOutcome::failure(input, e.to_string()),
    };

    // Prompt on a blocking thread so Ctrl-C is still noticed while waiting for input
    let bar = console.map(|c| c.bar.clone());
    let prompt_plan = plan.clone();
    let choice = tokio::task::spawn_blocking(move || match bar {
        Some(bar) => bar.suspend(|| select_candidate(&prompt_plan)),
        None => select_candidate(&prompt_plan),
    })
    .await
    .unwrap_or_else(|e| Err(io::Error::other(e)));

    match choice {
        Ok(Some(index)) => {
            plan.choose(index);
        }
        Ok(None) => return PipelineOutcome::failure(input, "Cancelled".to_string()),
        Err(e) => return PipelineOutcome::failure(input, format!("Selection failed: {e}")),
    }

    let result = pipeline.fetch(plan, output_dir).await;
    PipelineOutcome::from_result(input, &result)
}

/// Ask for a candidate number on stdin; 0 (or end of input) cancels
fn select_candidate(plan: &ResolutionPlan) -> io::Result<Option<usize>> {
    let candidates = plan.candidates();

    println!("\n{HEADPHONES}{}", plan.title().title.bold().green());
    println!("Select a feed to download from:");
    for (i, candidate) in candidates.iter().enumerate() {
        println!(
            "  {}: {} {}",
            i + 1,
            candidate.display_name.bold(),
            candidate.feed_url.cyan()
        );
    }
    println!("  0: Cancel");

    loop {
        print!("Enter number (0-{}): ", candidates.len());
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            return Ok(None);
        }
        match input.trim().parse::<usize>() {
            Ok(0) => return Ok(None),
            Ok(n) if n <= candidates.len() => return Ok(Some(n - 1)),
            _ => println!("{}", "Invalid selection, try again.".yellow()),
        }
    }
}

async fn list_feeds(
    pipeline: &DefaultPipeline,
    references: &[String],
    options: &PlanOptions,
) -> bool {
    let mut all_ok = true;

    for input in references {
        let plan = match ContentReference::parse(input) {
            Ok(reference) => pipeline.plan_with(&reference, options).await,
            Err(e) => {
                println!("{CROSS}{} - {}", input.yellow(), e.to_string().red());
                all_ok = false;
                continue;
            }
        };

        match plan {
            Ok(plan) => {
                println!("\n{HEADPHONES}{}", plan.title().title.bold().green());
                for (index, candidate) in plan.candidates().iter().enumerate() {
                    let marker = if index == 0 { "*" } else { " " };
                    println!(
                        "  {marker} {} {}",
                        candidate.display_name.bold(),
                        candidate.feed_url.cyan()
                    );
                }
                if let Some(filter) = plan.filter() {
                    println!("  {} {}", "episode filter:".dimmed(), filter.pattern());
                }
            }
            Err(e) => {
                println!("{CROSS}{} - {}", input.yellow(), e.to_string().red());
                all_ok = false;
            }
        }
    }

    all_ok
}

fn resolve_tool(args: &Args) -> Result<PodcastDlTool> {
    if let Some(path) = &args.tool {
        return Ok(PodcastDlTool::new(path));
    }
    match PodcastDlTool::from_path() {
        Some(tool) => Ok(tool),
        // Planning never runs the tool
        None if args.list_feeds => Ok(PodcastDlTool::new("podcast-dl")),
        None => bail!(
            "podcast-dl not found on PATH \
             (install it with `npm install -g podcast-dl` or pass --tool)"
        ),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let quiet = args.quiet || args.json;
    if !quiet {
        println!(
            "\n{}{} {}\n",
            MICROPHONE,
            "podbridge".bold().magenta(),
            "- Spotify to RSS podcast downloader".dimmed()
        );
    }

    let config = PipelineConfig {
        tool_timeout: Duration::from_secs(args.timeout),
        ..Default::default()
    };

    let tool = resolve_tool(&args)?;
    tracing::debug!(program = %tool.program().display(), "using download tool");

    let console = (!quiet).then(|| std::sync::Arc::new(ConsoleReporter::new()));
    let reporter: SharedProgressReporter = match &console {
        Some(console) => console.clone() as SharedProgressReporter,
        None if args.verbose => std::sync::Arc::new(TracingReporter) as SharedProgressReporter,
        None => NoopReporter::shared(),
    };

    let pipeline =
        default_pipeline(&config, tool, reporter).context("Failed to create HTTP client")?;
    let options = PlanOptions {
        show_name: args.show.clone(),
    };

    if args.list_feeds {
        let all_ok = list_feeds(&pipeline, &args.references, &options).await;
        if let Some(console) = &console {
            console.finish();
        }
        if !all_ok {
            std::process::exit(1);
        }
        return Ok(());
    }

    let work = async {
        if args.interactive {
            let mut outcomes = Vec::with_capacity(args.references.len());
            for input in &args.references {
                outcomes.push(
                    process_interactive(
                        &pipeline,
                        input,
                        &args.output_dir,
                        &options,
                        console.as_deref(),
                    )
                    .await,
                );
            }
            outcomes
        } else {
            futures::stream::iter(&args.references)
                .map(|input| process(&pipeline, input, &args.output_dir, &options))
                .buffered(args.concurrent.max(1))
                .collect::<Vec<_>>()
                .await
        }
    };

    // Dropping `work` kills any running download tool along with its children
    let outcomes: Vec<PipelineOutcome> = tokio::select! {
        outcomes = work => outcomes,
        _ = tokio::signal::ctrl_c() => {
            if let Some(console) = &console {
                console.finish();
            }
            eprintln!("\n{FAILURE}{}", "Interrupted".red().bold());
            std::process::exit(130);
        }
    };

    if let Some(console) = &console {
        console.finish();
    }

    if args.json {
        for outcome in &outcomes {
            println!(
                "{}",
                serde_json::to_string(outcome).context("Failed to serialize outcome")?
            );
        }
    }

    let failed: Vec<&PipelineOutcome> = outcomes.iter().filter(|o| !o.success).collect();

    if !quiet {
        if !failed.is_empty() {
            println!("\n{}", "Failed references:".red().bold());
            for outcome in &failed {
                println!(
                    "  {}{} - {}",
                    CROSS,
                    outcome.reference.yellow(),
                    outcome.error.as_deref().unwrap_or("unknown error").dimmed()
                );
            }
        }

        for outcome in outcomes.iter().filter(|o| o.success) {
            println!(
                "\n{FOLDER}{} from {}: {}",
                outcome.title.as_deref().unwrap_or_default().bold(),
                outcome.feed_name.as_deref().unwrap_or_default().cyan(),
                outcome
                    .file_path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default()
                    .green()
            );
        }
        println!();
    }

    if !failed.is_empty() {
        std::process::exit(1);
    }

    Ok(())
}
