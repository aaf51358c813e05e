use anyhow::{Context, Result, anyhow};
use clap::ArgMatches;
use colored::Colorize;
use linkrank_core::crawl::{CrawlOptions, CrawlProgressCallback, execute_crawl, rank_edge_list};
use linkrank_core::report::{RankReport, ReportFormat, generate_report, save_report};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::Level;
use url::Url;

/// Installs the stderr log subscriber. Warnings only by default.
pub fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };

    // A second initialisation (e.g. from tests) is harmless
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub fn print_banner() {
    println!(
        "{} {}",
        "linkrank".bright_cyan().bold(),
        env!("CARGO_PKG_VERSION").dimmed()
    );
    println!("{}", "crawl a link graph, rank it with PageRank".dimmed());
    println!();
}

/// Expands a leading `~` in a user-supplied path.
pub fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

pub fn parse_report_format(raw: &str) -> Result<ReportFormat> {
    ReportFormat::from_str(raw).ok_or_else(|| anyhow!("Unknown report format '{}'", raw))
}

/// Renders the report and either saves it or prints it.
pub fn deliver_report(report: &RankReport, format: ReportFormat, target: Option<&Path>) -> Result<()> {
    let content = generate_report(report, format).context("Failed to render report")?;

    match target {
        Some(path) => {
            save_report(&content, path)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            println!(
                "{} Report saved to {}",
                "✓".green().bold(),
                path.display().to_string().bright_white()
            );
        }
        None => print!("{}", content),
    }
    Ok(())
}

fn report_settings(sub_matches: &ArgMatches) -> Result<(usize, ReportFormat, Option<PathBuf>)> {
    let top = *sub_matches.get_one::<usize>("top").unwrap_or(&10);
    let format = parse_report_format(
        sub_matches
            .get_one::<String>("format")
            .map(String::as_str)
            .unwrap_or("text"),
    )?;
    let report_path = sub_matches
        .get_one::<String>("report")
        .map(|raw| expand_path(raw));
    Ok((top, format, report_path))
}

pub async fn handle_crawl(sub_matches: &ArgMatches, quiet: bool) -> Result<()> {
    let url = sub_matches
        .get_one::<Url>("url")
        .ok_or_else(|| anyhow!("--url is required"))?;
    let depth = *sub_matches.get_one::<u32>("depth").unwrap_or(&2);
    let max_links = *sub_matches.get_one::<u32>("max-links").unwrap_or(&10);
    let timeout = *sub_matches.get_one::<u64>("timeout").unwrap_or(&5);
    let output = expand_path(
        sub_matches
            .get_one::<String>("output")
            .map(String::as_str)
            .unwrap_or("graph.txt"),
    );
    let live = sub_matches.get_flag("live");
    let (top, format, report_path) = report_settings(sub_matches)?;

    if !quiet {
        println!("\n🕷️  Crawling {}", url.as_str().bright_white());
        println!("Max depth: {}", depth);
        println!("Max links per page: {}", max_links);
        println!("Edge list: {}\n", output.display());
    }

    let mut options = CrawlOptions::new(url.as_str());
    options.max_depth = depth as usize;
    options.max_links_per_page = max_links as usize;
    options.timeout_secs = timeout;
    options.output = Some(output.clone());
    options.show_progress_bars = !quiet && !live;

    let progress_callback: Option<CrawlProgressCallback> = if live && !quiet {
        Some(Arc::new(|line: String| {
            println!("{}", line.dimmed());
        }))
    } else {
        None
    };

    let outcome = execute_crawl(options, progress_callback)
        .await
        .context("Crawl failed")?;

    if !quiet {
        println!(
            "\n{} Crawl complete! {} pages visited, {} links written to {}\n",
            "✓".green().bold(),
            outcome.summary.visited.len(),
            outcome.summary.edges.len(),
            output.display()
        );
    }

    if outcome.graph.is_empty() {
        eprintln!("{} No links found.", "⚠".yellow().bold());
    }

    let report = RankReport::from_outcome(&outcome, top);
    deliver_report(&report, format, report_path.as_deref())
}

pub fn handle_rank(sub_matches: &ArgMatches) -> Result<()> {
    let path = expand_path(
        sub_matches
            .get_one::<String>("PATH")
            .ok_or_else(|| anyhow!("an edge list path is required"))?,
    );
    let (top, format, report_path) = report_settings(sub_matches)?;

    let (graph, ranking) = rank_edge_list(&path)
        .with_context(|| format!("Failed to read edge list {}", path.display()))?;

    if graph.is_empty() {
        eprintln!(
            "{} No edges found in {}",
            "⚠".yellow().bold(),
            path.display()
        );
    }

    let report = RankReport::new(&graph, &ranking, top);
    deliver_report(&report, format, report_path.as_deref())
}
