// Plain-text edge lists: one `source -> target` pair per line.

use crate::error::Result;
use crate::graph::Graph;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tracing::debug;

pub const SEPARATOR: &str = "->";

/// Parses one line into `(source, target)`.
///
/// The line is split on the first separator and both sides are trimmed.
/// Returns `None` for lines without the separator or with an empty side.
pub fn parse_edge_line(line: &str) -> Option<(String, String)> {
    let (source, target) = line.split_once(SEPARATOR)?;
    let source = source.trim();
    let target = target.trim();

    if source.is_empty() || target.is_empty() {
        return None;
    }
    Some((source.to_string(), target.to_string()))
}

pub fn format_edge_line(source: &str, target: &str) -> String {
    format!("{} {} {}", source, SEPARATOR, target)
}

/// Appends edges to an underlying writer one line at a time.
pub struct EdgeListWriter<W: Write> {
    inner: W,
    edges_written: usize,
}

impl<W: Write> EdgeListWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            edges_written: 0,
        }
    }

    pub fn write_edge(&mut self, source: &str, target: &str) -> io::Result<()> {
        writeln!(self.inner, "{}", format_edge_line(source, target))?;
        self.edges_written += 1;
        Ok(())
    }

    pub fn edges_written(&self) -> usize {
        self.edges_written
    }

    /// Flushes and hands back the writer.
    pub fn finish(mut self) -> io::Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

pub fn create_edge_list(path: &Path) -> io::Result<EdgeListWriter<BufWriter<File>>> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    Ok(EdgeListWriter::new(BufWriter::new(File::create(path)?)))
}

/// Reads an edge-list file and builds the graph it describes.
pub fn load_graph(path: &Path) -> Result<Graph> {
    let content = fs::read_to_string(path)?;
    let graph = Graph::build(content.lines());
    debug!(
        "Loaded {} vertices and {} edges from {}",
        graph.vertex_count(),
        graph.edge_count(),
        path.display()
    );
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_line() {
        assert_eq!(
            parse_edge_line("http://a/ -> http://b/"),
            Some(("http://a/".to_string(), "http://b/".to_string()))
        );
        assert_eq!(
            parse_edge_line("a->b"),
            Some(("a".to_string(), "b".to_string()))
        );
    }

    #[test]
    fn test_parse_keeps_punctuation_inside_identifiers() {
        assert_eq!(
            parse_edge_line("http://a/ -> http://b/x;"),
            Some(("http://a/".to_string(), "http://b/x;".to_string()))
        );
        assert_eq!(
            parse_edge_line("  \"quoted\" ->  target  "),
            Some(("\"quoted\"".to_string(), "target".to_string()))
        );
    }

    #[test]
    fn test_parse_rejects_empty_sides() {
        assert_eq!(parse_edge_line("  ->target"), None);
        assert_eq!(parse_edge_line("source->  "), None);
        assert_eq!(parse_edge_line("->"), None);
        assert_eq!(parse_edge_line("no separator here"), None);
        assert_eq!(parse_edge_line(""), None);
    }

    #[test]
    fn test_writer_output() {
        let mut writer = EdgeListWriter::new(Vec::new());
        writer.write_edge("a", "b").unwrap();
        writer.write_edge("b", "c").unwrap();
        assert_eq!(writer.edges_written(), 2);
        let text = String::from_utf8(writer.finish().unwrap()).unwrap();
        assert_eq!(text, "a -> b\nb -> c\n");
    }

    #[test]
    fn test_written_edges_read_back_unchanged() {
        let mut writer = EdgeListWriter::new(Vec::new());
        writer.write_edge("http://a/", "http://b/x;").unwrap();
        writer.write_edge("http://a/", "\"quoted\"").unwrap();
        writer.write_edge("http://b/x;", "http://a/").unwrap();
        let text = String::from_utf8(writer.finish().unwrap()).unwrap();

        let graph = Graph::build(text.lines());
        assert_eq!(
            graph.vertices().collect::<Vec<_>>(),
            vec!["\"quoted\"", "http://a/", "http://b/x;"]
        );
        assert!(graph.has_edge("http://a/", "http://b/x;"));
        assert!(graph.has_edge("http://b/x;", "http://a/"));
        assert!(graph.has_edge("http://a/", "\"quoted\""));
    }
}
