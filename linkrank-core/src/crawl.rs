use crate::edgelist::{self, EdgeListWriter};
use crate::error::{CoreError, Result};
use crate::graph::Graph;
use crate::rank::{self, RankTable};
use indicatif::{ProgressBar, ProgressStyle};
use linkrank_scanner::crawler::{DEFAULT_MAX_DEPTH, DEFAULT_MAX_LINKS_PER_PAGE, DEFAULT_TIMEOUT_SECS};
use linkrank_scanner::extractor::normalize_page_url;
use linkrank_scanner::{CrawlSummary, Crawler, Edge};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;
use tracing::{info, warn};

/// Options for configuring a crawl operation
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub url: String,
    pub max_depth: usize,
    pub max_links_per_page: usize,
    pub timeout_secs: u64,
    /// Where to write the edge list as it is discovered. Nothing is written
    /// when unset.
    pub output: Option<PathBuf>,
    pub show_progress_bars: bool,
}

impl CrawlOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_depth: DEFAULT_MAX_DEPTH,
            max_links_per_page: DEFAULT_MAX_LINKS_PER_PAGE,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            output: None,
            show_progress_bars: false,
        }
    }

    /// Checks everything that can be checked without touching the network.
    pub fn validate(&self) -> Result<()> {
        if self.max_links_per_page == 0 {
            return Err(CoreError::InvalidParameter(
                "max links per page must be a positive integer".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(CoreError::InvalidParameter(
                "timeout must be at least one second".to_string(),
            ));
        }
        if normalize_page_url(&self.url).is_none() {
            return Err(CoreError::InvalidParameter(format!(
                "start URL must be an absolute http(s) URL, got '{}'",
                self.url
            )));
        }
        Ok(())
    }
}

/// Crawl limits as collected from free-text input fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlParams {
    pub max_depth: usize,
    pub max_links_per_page: usize,
}

impl CrawlParams {
    /// Depth must parse as an integer `>= 0`, max links as an integer `> 0`.
    pub fn parse(depth: &str, max_links: &str) -> Result<Self> {
        let invalid = || {
            CoreError::InvalidParameter("depth and max links must be positive integers".to_string())
        };

        let depth: i64 = depth.trim().parse().map_err(|_| invalid())?;
        let max_links: i64 = max_links.trim().parse().map_err(|_| invalid())?;
        if depth < 0 || max_links <= 0 {
            return Err(invalid());
        }

        Ok(Self {
            max_depth: usize::try_from(depth).map_err(|_| invalid())?,
            max_links_per_page: usize::try_from(max_links).map_err(|_| invalid())?,
        })
    }

    pub fn apply(self, options: &mut CrawlOptions) {
        options.max_depth = self.max_depth;
        options.max_links_per_page = self.max_links_per_page;
    }
}

/// Callback for reporting crawl progress as log lines
pub type CrawlProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Everything a finished crawl produced.
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub summary: CrawlSummary,
    pub graph: Graph,
    pub ranking: RankTable,
    /// Path of the edge list written during the crawl, if any.
    pub edge_list: Option<PathBuf>,
}

/// Edge-list file shared with the crawler's edge callback. The first write
/// error is kept and reported once the crawl returns.
struct EdgeSink {
    writer: Option<EdgeListWriter<BufWriter<File>>>,
    error: Option<io::Error>,
}

impl EdgeSink {
    fn record(&mut self, edge: &Edge) {
        if self.error.is_some() {
            return;
        }
        if let Some(ref mut writer) = self.writer
            && let Err(e) = writer.write_edge(&edge.source, &edge.target)
        {
            warn!("Failed to write edge {}: {}", edge, e);
            self.error = Some(e);
        }
    }

    fn finish(&mut self) -> io::Result<()> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        if let Some(writer) = self.writer.take() {
            writer.finish()?;
        }
        Ok(())
    }
}

/// Execute a crawl, write its edge list, and rank the resulting graph.
pub async fn execute_crawl(
    options: CrawlOptions,
    progress_callback: Option<CrawlProgressCallback>,
) -> Result<CrawlOutcome> {
    options.validate()?;

    let CrawlOptions {
        url,
        max_depth,
        max_links_per_page,
        timeout_secs,
        output,
        show_progress_bars,
    } = options;

    let writer = match output {
        Some(ref path) => Some(edgelist::create_edge_list(path)?),
        None => None,
    };
    let sink = Arc::new(StdMutex::new(EdgeSink {
        writer,
        error: None,
    }));

    // Set up single progress bar for overall crawl progress (only if enabled)
    let progress_bar = if show_progress_bars {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Starting crawl...");
        Some(Arc::new(pb))
    } else {
        None
    };

    let pages_count = Arc::new(AtomicUsize::new(0));
    let edges_count = Arc::new(AtomicUsize::new(0));

    let page_callback = {
        let pb = progress_bar.clone();
        let pages_count = pages_count.clone();
        let edges_count = edges_count.clone();
        let progress = progress_callback.clone();
        Arc::new(move |depth: usize, page: String| {
            let pages = pages_count.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(ref pb) = pb {
                pb.set_message(format!(
                    "Crawling... {} pages, {} edges",
                    pages,
                    edges_count.load(Ordering::Relaxed)
                ));
            }
            if let Some(ref callback) = progress {
                callback(format!("[depth {}] {}", depth, page));
            }
        })
    };

    let edge_callback = {
        let sink = sink.clone();
        let edges_count = edges_count.clone();
        let progress = progress_callback.clone();
        Arc::new(move |edge: &Edge| {
            edges_count.fetch_add(1, Ordering::Relaxed);
            sink.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .record(edge);
            if let Some(ref callback) = progress {
                callback(format!("   -> {}", edge.target));
            }
        })
    };

    let crawler = Crawler::with_timeout(timeout_secs)
        .with_max_depth(max_depth)
        .with_max_links_per_page(max_links_per_page)
        .with_progress_callback(page_callback)
        .with_edge_callback(edge_callback);

    let crawl_result = crawler.crawl(&url).await;
    drop(crawler);

    if let Some(ref pb) = progress_bar {
        pb.finish_and_clear();
    }

    let summary = crawl_result?;
    sink.lock()
        .unwrap_or_else(PoisonError::into_inner)
        .finish()?;

    if let Some(ref callback) = progress_callback {
        callback(format!(
            "Crawl finished: {} pages visited, {} edges. Ranking...",
            summary.visited.len(),
            summary.edges.len()
        ));
    }

    let graph = Graph::from_edges(&summary.edges);
    let ranking = rank::pagerank(&graph);
    info!(
        "Ranked {} pages from {} edges",
        ranking.len(),
        graph.edge_count()
    );

    Ok(CrawlOutcome {
        summary,
        graph,
        ranking,
        edge_list: output,
    })
}

/// Loads a previously written edge list and ranks it.
pub fn rank_edge_list(path: &Path) -> Result<(Graph, RankTable)> {
    let graph = edgelist::load_graph(path)?;
    let ranking = rank::pagerank(&graph);
    Ok((graph, ranking))
}
