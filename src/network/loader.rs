use super::Graph;
use crate::error::{HeuristicGenError, HgResult};
use std::collections::{BTreeSet, HashMap};
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const GRAPH_FILE_SUFFIX: &str = ".graph.txt";

/// A graph read from text, with the token each dense id came from.
#[derive(Debug, Clone)]
pub struct LoadedGraph {
    pub graph: Graph,
    pub node_ids: HashMap<String, usize>,
}

impl LoadedGraph {
    pub fn node_names(&self) -> Vec<&str> {
        let mut names = vec![""; self.node_ids.len()];
        for (name, &id) in &self.node_ids {
            names[id] = name;
        }
        names
    }
}

/// Parses a whitespace-separated edge list.
///
/// Tokens get dense ids in first-seen order. Self-loops are dropped,
/// `#`/`%` comment lines and blank lines skipped.
pub fn read_edge_list<R: BufRead>(reader: R) -> HgResult<LoadedGraph> {
    let mut node_ids: HashMap<String, usize> = HashMap::new();
    let mut adjacency: Vec<BTreeSet<usize>> = Vec::new();
    let mut skipped_loops = 0;

    for (line_idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('%') {
            continue;
        }

        let tokens: Vec<&str> = trimmed.split_whitespace().collect();
        if tokens.len() < 2 {
            return Err(HeuristicGenError::Parse {
                line: line_idx + 1,
                message: format!("expected two endpoints, found '{}'", trimmed),
            });
        }

        let mut intern = |token: &str| -> usize {
            if let Some(&id) = node_ids.get(token) {
                return id;
            }
            let id = adjacency.len();
            node_ids.insert(token.to_string(), id);
            adjacency.push(BTreeSet::new());
            id
        };
        let u = intern(tokens[0]);
        let v = intern(tokens[1]);

        if u == v {
            skipped_loops += 1;
            continue;
        }
        adjacency[u].insert(v);
        adjacency[v].insert(u);
    }

    if skipped_loops > 0 {
        debug!("Skipped {} self-loops", skipped_loops);
    }

    Ok(LoadedGraph {
        graph: Graph::from_symmetric(adjacency),
        node_ids,
    })
}

pub fn load_graph_file<P: AsRef<Path>>(path: P) -> HgResult<LoadedGraph> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        HeuristicGenError::Io(std::io::Error::new(
            e.kind(),
            format!("Could not open graph '{}': {}", path.display(), e),
        ))
    })?;
    let loaded = read_edge_list(BufReader::new(file))?;
    info!(
        "Loaded '{}': {} nodes, {} edges",
        path.display(),
        loaded.graph.node_count(),
        loaded.graph.edge_count()
    );
    Ok(loaded)
}

/// Lists `*.graph.txt` files as (name, path), sorted case-insensitively by name.
pub fn list_network_directory<P: AsRef<Path>>(dir: P) -> HgResult<Vec<(String, PathBuf)>> {
    let mut networks = Vec::new();
    for entry in fs::read_dir(dir.as_ref())? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name().and_then(|f| f.to_str()) else {
            continue;
        };
        if let Some(name) = file_name.strip_suffix(GRAPH_FILE_SUFFIX) {
            networks.push((name.to_string(), path.clone()));
        }
    }
    networks.sort_by_key(|(name, _)| name.to_lowercase());
    Ok(networks)
}
