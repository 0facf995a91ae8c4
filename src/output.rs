//! Writing contigs and graph exports.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde_json::json;

use crate::graph::DeBruijnGraph;

/// Output file used when none is given on the command line.
pub const DEFAULT_OUTPUT_FILE: &str = "output.fasta";

#[derive(thiserror::Error, Debug)]
pub enum OutputError {
    #[error("Failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to serialise graph: {0}")]
    Json(#[from] serde_json::Error),
}

/// Write `>Contig {i}` records (1-based), wrapping sequence lines at `line_width`
/// characters unless it is zero.
pub fn write_contigs<W: Write, S: AsRef<str>>(
    mut writer: W,
    contigs: &[S],
    line_width: usize,
) -> std::io::Result<()> {
    for (idx, contig) in contigs.iter().enumerate() {
        let contig = contig.as_ref();
        writeln!(writer, ">Contig {}", idx + 1)?;
        if line_width == 0 || contig.len() <= line_width {
            writeln!(writer, "{contig}")?;
            continue;
        }
        let chars: Vec<char> = contig.chars().collect();
        for line in chars.chunks(line_width) {
            let line: String = line.iter().collect();
            writeln!(writer, "{line}")?;
        }
    }
    writer.flush()
}

fn create_with_parents(path: &Path) -> Result<File, OutputError> {
    let io_err = |source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
    }
    File::create(path).map_err(io_err)
}

/// Create (or truncate) `path` and write every contig to it.
pub fn write_contigs_to_path<S: AsRef<str>>(
    path: &Path,
    contigs: &[S],
    line_width: usize,
) -> Result<(), OutputError> {
    let file = create_with_parents(path)?;
    write_contigs(BufWriter::new(file), contigs, line_width).map_err(|source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("Wrote {} contigs to {}", contigs.len(), path.display());
    Ok(())
}

/// Nodes and edges of `graph` as a JSON document.
pub fn graph_to_json(graph: &DeBruijnGraph) -> serde_json::Value {
    let nodes: Vec<_> = graph
        .nodes()
        .map(|(id, node)| {
            json!({
                "id": id.0,
                "value": node.value(),
                "in_degree": node.in_degree(),
                "out_degree": node.out_degree(),
            })
        })
        .collect();
    let edges: Vec<_> = graph
        .edges()
        .map(|(id, edge)| {
            json!({
                "id": id.0,
                "source": edge.source.0,
                "target": edge.target.0,
                "value": edge.value,
                "synthetic": edge.synthetic,
            })
        })
        .collect();
    json!({
        "degrees": graph.degree_summary(),
        "nodes": nodes,
        "edges": edges,
    })
}

pub fn export_graph_json(graph: &DeBruijnGraph, path: &Path) -> Result<(), OutputError> {
    let mut file = create_with_parents(path)?;
    let text = serde_json::to_string_pretty(&graph_to_json(graph))?;
    writeln!(file, "{text}").map_err(|source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("Assembly graph written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_one_based_headers() {
        let mut buf = Vec::new();
        write_contigs(&mut buf, &["ATGCGTA", "GCG"], 0).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            ">Contig 1\nATGCGTA\n>Contig 2\nGCG\n"
        );
    }

    #[test]
    fn wraps_long_sequences() {
        let mut buf = Vec::new();
        write_contigs(&mut buf, &["AACCGGTTA"], 4).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            ">Contig 1\nAACC\nGGTT\nA\n"
        );
    }

    #[test]
    fn no_contigs_writes_nothing() {
        let mut buf = Vec::new();
        let contigs: Vec<String> = Vec::new();
        write_contigs(&mut buf, &contigs, 60).unwrap();
        assert!(buf.is_empty());
    }

    #[test]
    fn creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.fasta");
        write_contigs_to_path(&path, &["ACGT"], 0).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), ">Contig 1\nACGT\n");
    }

    #[test]
    fn unwritable_path_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened as a file.
        let err = write_contigs_to_path(dir.path(), &["ACGT"], 0).unwrap_err();
        assert!(matches!(err, OutputError::Io { .. }));
    }

    #[test]
    fn graph_json_lists_nodes_and_edges() {
        let graph = DeBruijnGraph::from_kmers(["ATG", "TGC"]);
        let value = graph_to_json(&graph);
        assert_eq!(value["nodes"].as_array().unwrap().len(), 3);
        assert_eq!(value["edges"][1]["value"], "TGC");
        assert_eq!(value["edges"][1]["source"], 1);
        assert_eq!(value["edges"][1]["synthetic"], false);
        assert_eq!(value["degrees"]["start_candidates"], 1);
    }
}
