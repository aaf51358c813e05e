use crate::error::{Result, ScanError};
use crate::extractor;
use crate::result::{CrawlSummary, Edge};
use futures::channel::mpsc::{self, UnboundedReceiver};
use reqwest::Client;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

/// Called with `(depth, url)` each time a page is about to be fetched.
pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;
/// Called once for every accepted edge, in emission order.
pub type EdgeCallback = Arc<dyn Fn(&Edge) + Send + Sync>;

pub const DEFAULT_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_MAX_DEPTH: usize = 2;
pub const DEFAULT_MAX_LINKS_PER_PAGE: usize = 10;

/// Depth-first link crawler.
///
/// A crawl walks pages in pre-order: every accepted link on a page is
/// emitted as an edge and, depth permitting, followed to completion before
/// the next link on the same page is considered. At most
/// `max_links_per_page` links are accepted per page, repeats included.
pub struct Crawler {
    client: Client,
    max_depth: usize,
    max_links_per_page: usize,
    progress_callback: Option<ProgressCallback>,
    edge_callback: Option<EdgeCallback>,
    timeout_secs: u64,
}

/// One page on the traversal stack with the candidates it has left.
struct Frame {
    page: String,
    depth: usize,
    candidates: std::vec::IntoIter<String>,
    taken: usize,
}

impl Crawler {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(timeout_secs: u64) -> Self {
        let timeout = Duration::from_secs(timeout_secs.max(1));
        let client = Client::builder()
            .user_agent(concat!("linkrank/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .connect_timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            max_depth: DEFAULT_MAX_DEPTH,
            max_links_per_page: DEFAULT_MAX_LINKS_PER_PAGE,
            progress_callback: None,
            edge_callback: None,
            timeout_secs,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_max_links_per_page(mut self, max_links: usize) -> Self {
        self.max_links_per_page = max_links;
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn with_edge_callback(mut self, callback: EdgeCallback) -> Self {
        self.edge_callback = Some(callback);
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn max_links_per_page(&self) -> usize {
        self.max_links_per_page
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    /// Crawls from `start_url` and returns every edge emitted plus the
    /// visited pages. Only invalid parameters are errors; pages that cannot
    /// be fetched simply contribute no edges.
    pub async fn crawl(&self, start_url: &str) -> Result<CrawlSummary> {
        if self.max_links_per_page == 0 {
            return Err(ScanError::InvalidParameter(
                "max links per page must be at least 1".to_string(),
            ));
        }

        let start = extractor::normalize_page_url(start_url).ok_or_else(|| {
            ScanError::InvalidUrl(format!("{} is not an absolute http(s) URL", start_url))
        })?;

        info!(
            "Starting crawl of {} (max depth {}, max {} links per page, timeout {}s)",
            start, self.max_depth, self.max_links_per_page, self.timeout_secs
        );

        let mut summary = CrawlSummary::new(start.clone());
        let mut visited: HashSet<String> = HashSet::new();
        let mut stack: Vec<Frame> = Vec::new();

        if let Some(frame) = self.enter(&start, 0, &mut visited, &mut summary).await {
            stack.push(frame);
        }

        while let Some(frame) = stack.last_mut() {
            if frame.taken >= self.max_links_per_page {
                stack.pop();
                continue;
            }

            let Some(target) = frame.candidates.next() else {
                stack.pop();
                continue;
            };

            frame.taken += 1;
            let next_depth = frame.depth + 1;
            self.emit(Edge::new(frame.page.clone(), target.clone()), &mut summary);

            if next_depth <= self.max_depth
                && let Some(child) = self
                    .enter(&target, next_depth, &mut visited, &mut summary)
                    .await
            {
                stack.push(child);
            }
        }

        info!(
            "Crawl complete. Visited {} pages, emitted {} edges ({} fetch failures)",
            summary.visited.len(),
            summary.edges.len(),
            summary.failed_fetches
        );
        Ok(summary)
    }

    /// Runs the crawl on a background task and hands edges out as a stream.
    /// The stream ends when the crawl does.
    pub fn into_stream(self, start_url: impl Into<String>) -> UnboundedReceiver<Edge> {
        let (sender, receiver) = mpsc::unbounded();
        let previous = self.edge_callback.clone();
        let crawler = self.with_edge_callback(Arc::new(move |edge: &Edge| {
            if let Some(ref callback) = previous {
                callback(edge);
            }
            // A dropped receiver only means nobody is listening any more.
            let _ = sender.unbounded_send(edge.clone());
        }));

        let start_url = start_url.into();
        tokio::spawn(async move {
            if let Err(e) = crawler.crawl(&start_url).await {
                warn!("Streaming crawl of {} failed: {}", start_url, e);
            }
        });

        receiver
    }

    /// Marks `url` visited and fetches it. Returns the frame to expand, or
    /// `None` if the page is out of depth, already visited, or unfetchable.
    async fn enter(
        &self,
        url: &str,
        depth: usize,
        visited: &mut HashSet<String>,
        summary: &mut CrawlSummary,
    ) -> Option<Frame> {
        if depth > self.max_depth || !visited.insert(url.to_string()) {
            return None;
        }
        summary.visited.push(url.to_string());

        if let Some(ref callback) = self.progress_callback {
            callback(depth, url.to_string());
        }

        let body = match self.fetch(url).await {
            Ok(body) => body,
            Err(e) => {
                warn!("Crawl error for {}: {}", url, e);
                summary.failed_fetches += 1;
                return None;
            }
        };

        let base = Url::parse(url).ok()?;
        let candidates = extractor::extract_links(&body, &base);
        debug!(
            "Found {} candidate links on {} (depth {})",
            candidates.len(),
            url,
            depth
        );

        Some(Frame {
            page: url.to_string(),
            depth,
            candidates: candidates.into_iter(),
            taken: 0,
        })
    }

    fn emit(&self, edge: Edge, summary: &mut CrawlSummary) {
        debug!("Edge {}", edge);
        if let Some(ref callback) = self.edge_callback {
            callback(&edge);
        }
        summary.edges.push(edge);
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        debug!("Fetching {}", url);

        let start = Instant::now();
        let response = self.client.get(url).send().await?.error_for_status()?;

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        if let Some(ref content_type) = content_type
            && !is_text_content_type(content_type)
        {
            return Err(ScanError::NotText(content_type.clone()));
        }

        let body = response.text().await?;
        debug!(
            "Fetched {} ({} bytes) in {:?}",
            url,
            body.len(),
            start.elapsed()
        );
        Ok(body)
    }
}

impl Default for Crawler {
    fn default() -> Self {
        Self::new()
    }
}

fn is_text_content_type(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    content_type.starts_with("text/") || content_type.contains("html") || content_type.contains("xml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::sync::Mutex;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    async fn mount_page(server: &MockServer, page: &str, html: String) {
        Mock::given(method("GET"))
            .and(path(page))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_bytes(html.into_bytes()),
            )
            .mount(server)
            .await;
    }

    fn links_page(base: &str, paths: &[&str]) -> String {
        let mut html = String::from("<html><body>");
        for p in paths {
            html.push_str(&format!(r#"<a href="{}{}">{}</a>"#, base, p, p));
        }
        html.push_str("</body></html>");
        html
    }

    fn edge(base: &str, from: &str, to: &str) -> Edge {
        Edge::new(format!("{}{}", base, from), format!("{}{}", base, to))
    }

    #[tokio::test]
    async fn test_depth_zero_only_records_start_links() {
        let server = MockServer::start().await;
        let base = server.uri();
        mount_page(&server, "/", links_page(&base, &["/a", "/b"])).await;
        mount_page(&server, "/a", links_page(&base, &["/deeper"])).await;

        let crawler = Crawler::new().with_max_depth(0);
        let summary = crawler.crawl(&base).await.unwrap();

        assert_eq!(summary.visited, vec![format!("{}/", base)]);
        assert_eq!(
            summary.edges,
            vec![edge(&base, "/", "/a"), edge(&base, "/", "/b")]
        );
    }

    #[tokio::test]
    async fn test_depth_first_order() {
        let server = MockServer::start().await;
        let base = server.uri();
        mount_page(&server, "/", links_page(&base, &["/a", "/b"])).await;
        mount_page(&server, "/a", links_page(&base, &["/c"])).await;
        mount_page(&server, "/b", links_page(&base, &[])).await;
        mount_page(&server, "/c", links_page(&base, &["/d"])).await;

        let crawler = Crawler::new().with_max_depth(2);
        let summary = crawler.crawl(&base).await.unwrap();

        assert_eq!(
            summary.edges,
            vec![
                edge(&base, "/", "/a"),
                edge(&base, "/a", "/c"),
                edge(&base, "/c", "/d"),
                edge(&base, "/", "/b"),
            ]
        );
        // /d sits past the depth limit and is never fetched
        assert_eq!(
            summary.visited,
            vec![
                format!("{}/", base),
                format!("{}/a", base),
                format!("{}/c", base),
                format!("{}/b", base),
            ]
        );
    }

    #[tokio::test]
    async fn test_per_page_cap() {
        let server = MockServer::start().await;
        let base = server.uri();
        mount_page(
            &server,
            "/",
            links_page(&base, &["/p1", "/p2", "/p3", "/p4", "/p5"]),
        )
        .await;

        let crawler = Crawler::new().with_max_depth(0).with_max_links_per_page(2);
        let summary = crawler.crawl(&base).await.unwrap();

        assert_eq!(
            summary.edges,
            vec![edge(&base, "/", "/p1"), edge(&base, "/", "/p2")]
        );
    }

    #[tokio::test]
    async fn test_cap_counts_accepted_links_including_repeats() {
        let server = MockServer::start().await;
        let base = server.uri();
        let html = format!(
            r#"<link href="/a.css"><a href="/logo.png">x</a><a href="mailto:x@y.z">m</a>
               <a href="{0}/one">1</a><a href="{0}/one">again</a><a href="{0}/two">2</a>"#,
            base
        );
        mount_page(&server, "/", html).await;

        let crawler = Crawler::new().with_max_depth(0).with_max_links_per_page(2);
        let summary = crawler.crawl(&base).await.unwrap();

        assert_eq!(
            summary.edges,
            vec![edge(&base, "/", "/one"), edge(&base, "/", "/one")]
        );

        let crawler = Crawler::new().with_max_depth(0).with_max_links_per_page(3);
        let summary = crawler.crawl(&base).await.unwrap();

        assert_eq!(
            summary.edges,
            vec![
                edge(&base, "/", "/one"),
                edge(&base, "/", "/one"),
                edge(&base, "/", "/two"),
            ]
        );
    }

    #[tokio::test]
    async fn test_fetch_failure_is_a_leaf() {
        let server = MockServer::start().await;
        let base = server.uri();
        mount_page(&server, "/", links_page(&base, &["/missing", "/ok"])).await;
        mount_page(&server, "/ok", links_page(&base, &["/leaf"])).await;

        let crawler = Crawler::new().with_max_depth(1);
        let summary = crawler.crawl(&base).await.unwrap();

        assert_eq!(
            summary.edges,
            vec![
                edge(&base, "/", "/missing"),
                edge(&base, "/", "/ok"),
                edge(&base, "/ok", "/leaf"),
            ]
        );
        assert_eq!(summary.failed_fetches, 1);
        assert_eq!(summary.edges_from(&format!("{}/missing", base)).count(), 0);
    }

    #[tokio::test]
    async fn test_non_text_response_is_a_leaf() {
        let server = MockServer::start().await;
        let base = server.uri();
        mount_page(&server, "/", links_page(&base, &["/binary"])).await;
        Mock::given(method("GET"))
            .and(path("/binary"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/octet-stream")
                    .set_body_bytes(format!(r#"<a href="{}/hidden">h</a>"#, base).into_bytes()),
            )
            .mount(&server)
            .await;

        let summary = Crawler::new().with_max_depth(3).crawl(&base).await.unwrap();

        assert_eq!(summary.edges, vec![edge(&base, "/", "/binary")]);
        assert_eq!(summary.failed_fetches, 1);
    }

    #[tokio::test]
    async fn test_slow_page_times_out() {
        let server = MockServer::start().await;
        let base = server.uri();
        mount_page(&server, "/", links_page(&base, &["/slow", "/fast"])).await;
        mount_page(&server, "/fast", links_page(&base, &["/end"])).await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_bytes(links_page(&base, &["/never"]).into_bytes())
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let crawler = Crawler::with_timeout(1).with_max_depth(1);
        let summary = crawler.crawl(&base).await.unwrap();

        assert_eq!(
            summary.edges,
            vec![
                edge(&base, "/", "/slow"),
                edge(&base, "/", "/fast"),
                edge(&base, "/fast", "/end"),
            ]
        );
        assert_eq!(summary.failed_fetches, 1);
    }

    #[tokio::test]
    async fn test_cycles_visit_each_page_once() {
        let server = MockServer::start().await;
        let base = server.uri();
        mount_page(&server, "/", links_page(&base, &["/a"])).await;
        mount_page(&server, "/a", links_page(&base, &["/", "/a"])).await;

        let summary = Crawler::new().with_max_depth(5).crawl(&base).await.unwrap();

        assert_eq!(summary.visited.len(), 2);
        assert_eq!(
            summary.edges,
            vec![
                edge(&base, "/", "/a"),
                edge(&base, "/a", "/"),
                edge(&base, "/a", "/a"),
            ]
        );
    }

    #[tokio::test]
    async fn test_invalid_parameters_rejected() {
        let crawler = Crawler::new().with_max_links_per_page(0);
        assert!(matches!(
            crawler.crawl("http://127.0.0.1/").await,
            Err(ScanError::InvalidParameter(_))
        ));

        let crawler = Crawler::new();
        assert!(matches!(
            crawler.crawl("not a url").await,
            Err(ScanError::InvalidUrl(_))
        ));
        assert!(matches!(
            crawler.crawl("ftp://example.com/").await,
            Err(ScanError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_callbacks_see_every_edge_and_page() {
        let server = MockServer::start().await;
        let base = server.uri();
        mount_page(&server, "/", links_page(&base, &["/a", "/b"])).await;
        mount_page(&server, "/a", links_page(&base, &[])).await;
        mount_page(&server, "/b", links_page(&base, &[])).await;

        let seen_edges: Arc<Mutex<Vec<Edge>>> = Arc::new(Mutex::new(Vec::new()));
        let seen_pages: Arc<Mutex<Vec<(usize, String)>>> = Arc::new(Mutex::new(Vec::new()));
        let edges_clone = seen_edges.clone();
        let pages_clone = seen_pages.clone();

        let crawler = Crawler::new()
            .with_max_depth(1)
            .with_edge_callback(Arc::new(move |edge: &Edge| {
                edges_clone.lock().unwrap().push(edge.clone());
            }))
            .with_progress_callback(Arc::new(move |depth, url| {
                pages_clone.lock().unwrap().push((depth, url));
            }));

        let summary = crawler.crawl(&base).await.unwrap();

        assert_eq!(*seen_edges.lock().unwrap(), summary.edges);
        assert_eq!(
            *seen_pages.lock().unwrap(),
            vec![
                (0, format!("{}/", base)),
                (1, format!("{}/a", base)),
                (1, format!("{}/b", base)),
            ]
        );
    }

    #[tokio::test]
    async fn test_into_stream_yields_edges_in_order() {
        let server = MockServer::start().await;
        let base = server.uri();
        mount_page(&server, "/", links_page(&base, &["/a", "/b"])).await;
        mount_page(&server, "/a", links_page(&base, &["/c"])).await;

        let edges: Vec<Edge> = Crawler::new()
            .with_max_depth(1)
            .into_stream(base.clone())
            .collect()
            .await;

        assert_eq!(
            edges,
            vec![
                edge(&base, "/", "/a"),
                edge(&base, "/a", "/c"),
                edge(&base, "/", "/b"),
            ]
        );
    }

    #[test]
    fn test_text_content_types() {
        assert!(is_text_content_type("text/html; charset=utf-8"));
        assert!(is_text_content_type("text/plain"));
        assert!(is_text_content_type("application/xhtml+xml"));
        assert!(!is_text_content_type("application/pdf"));
        assert!(!is_text_content_type("image/png"));
    }
}
