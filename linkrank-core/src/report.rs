// Report generation for ranked link graphs

use crate::crawl::CrawlOutcome;
use crate::graph::Graph;
use crate::rank::RankTable;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

pub const DEFAULT_TOP: usize = 10;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
    Csv,
    Markdown,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            "csv" => Some(ReportFormat::Csv),
            "markdown" | "md" => Some(ReportFormat::Markdown),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedPage {
    pub rank: usize,
    pub url: String,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankReport {
    pub generated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages_visited: Option<usize>,
    pub total_vertices: usize,
    pub total_edges: usize,
    pub iterations: usize,
    pub converged: bool,
    pub top: Vec<RankedPage>,
}

impl RankReport {
    /// Summarises `ranking` over `graph`, keeping the best `top` pages.
    pub fn new(graph: &Graph, ranking: &RankTable, top: usize) -> Self {
        let top = ranking
            .top(top)
            .iter()
            .enumerate()
            .map(|(idx, entry)| RankedPage {
                rank: idx + 1,
                url: entry.vertex.clone(),
                score: entry.score,
            })
            .collect();

        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            start_url: None,
            pages_visited: None,
            total_vertices: graph.vertex_count(),
            total_edges: graph.edge_count(),
            iterations: ranking.iterations(),
            converged: ranking.converged(),
            top,
        }
    }

    pub fn from_outcome(outcome: &CrawlOutcome, top: usize) -> Self {
        let mut report = Self::new(&outcome.graph, &outcome.ranking, top);
        report.start_url = Some(outcome.summary.start_url.clone());
        report.pages_visited = Some(outcome.summary.visited.len());
        report
    }

    pub fn is_empty(&self) -> bool {
        self.top.is_empty()
    }
}

/// `score  identifier`, score to six decimal places.
pub fn format_rank_line(score: f64, url: &str) -> String {
    format!("{:.6}  {}", score, url)
}

pub fn generate_report(data: &RankReport, format: ReportFormat) -> Result<String, serde_json::Error> {
    match format {
        ReportFormat::Text => Ok(generate_text_report(data)),
        ReportFormat::Json => generate_json_report(data),
        ReportFormat::Csv => Ok(generate_csv_report(data)),
        ReportFormat::Markdown => Ok(generate_markdown_report(data)),
    }
}

pub fn generate_text_report(data: &RankReport) -> String {
    let mut report = String::new();

    report.push_str(RULE);
    report.push_str("\n# Summary:\n");
    if let Some(ref start_url) = data.start_url {
        report.push_str(&format!("  Start URL:      {}\n", start_url));
    }
    if let Some(pages_visited) = data.pages_visited {
        report.push_str(&format!("  Pages visited:  {}\n", pages_visited));
    }
    report.push_str(&format!("  Pages ranked:   {}\n", data.total_vertices));
    report.push_str(&format!("  Links:          {}\n", data.total_edges));
    report.push_str(&format!(
        "  Iterations:     {}{}\n",
        data.iterations,
        if data.converged { "" } else { " (cap reached)" }
    ));
    report.push_str(RULE);
    report.push_str("\n\n");

    if data.top.is_empty() {
        report.push_str("No links found.\n");
        return report;
    }

    report.push_str(&format!("=== Top {} pages by PageRank ===\n", data.top.len()));
    for page in &data.top {
        report.push_str(&format_rank_line(page.score, &page.url));
        report.push('\n');
    }

    report
}

pub fn generate_json_report(data: &RankReport) -> Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "linkrank",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": data.generated_at,
                "format": "json"
            },
            "summary": {
                "start_url": data.start_url,
                "pages_visited": data.pages_visited,
                "total_vertices": data.total_vertices,
                "total_edges": data.total_edges,
                "iterations": data.iterations,
                "converged": data.converged
            },
            "top": data.top
        }
    });

    serde_json::to_string_pretty(&json_report)
}

pub fn generate_csv_report(data: &RankReport) -> String {
    let mut report = String::from("rank,score,url\n");
    for page in &data.top {
        report.push_str(&format!(
            "{},{:.6},{}\n",
            page.rank,
            page.score,
            escape_csv(&page.url)
        ));
    }
    report
}

pub fn generate_markdown_report(data: &RankReport) -> String {
    let mut report = String::from("# PageRank report\n\n");

    if let Some(ref start_url) = data.start_url {
        report.push_str(&format!("- **Start URL:** {}\n", start_url));
    }
    if let Some(pages_visited) = data.pages_visited {
        report.push_str(&format!("- **Pages visited:** {}\n", pages_visited));
    }
    report.push_str(&format!("- **Pages ranked:** {}\n", data.total_vertices));
    report.push_str(&format!("- **Links:** {}\n", data.total_edges));
    report.push_str(&format!("- **Iterations:** {}\n", data.iterations));
    report.push_str(&format!("- **Generated:** {}\n\n", data.generated_at));

    if data.top.is_empty() {
        report.push_str("_No links found._\n");
        return report;
    }

    report.push_str("| Rank | Score | URL |\n");
    report.push_str("|-----:|------:|-----|\n");
    for page in &data.top {
        report.push_str(&format!(
            "| {} | {:.6} | {} |\n",
            page.rank,
            page.score,
            page.url.replace('|', "\\|")
        ));
    }
    report
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

fn escape_csv(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
