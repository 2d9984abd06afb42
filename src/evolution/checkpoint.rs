//! Checkpoint snapshots and their JSON persistence.
//!
//! Each tree is stored breadth-first as `(symbol, rule, children)` triples.
//! Shared subtrees are written out in full, so a decoded tree owns all its nodes.

use super::solution::Solution;
use super::symbol::Symbol;
use super::tree::DerivationNode;
use crate::error::{HeuristicGenError, HgResult};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::{info, warn};

pub const CHECKPOINT_FILE_NAME: &str = "checkpoint.json";

/// Immutable population snapshot at an iteration.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    pub iteration: u64,
    pub solutions: Vec<Arc<Solution>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedNode {
    pub symbol: i16,
    /// `-1` for terminals.
    pub rule: i16,
    pub children: u16,
}

#[derive(Debug, Serialize, Deserialize)]
struct CheckpointFile {
    iteration: u64,
    solutions: Vec<Vec<EncodedNode>>,
}

fn malformed(message: String) -> HeuristicGenError {
    HeuristicGenError::MalformedProgram(message)
}

pub fn encode_tree(root: &DerivationNode) -> HgResult<Vec<EncodedNode>> {
    let mut encoded = Vec::new();
    let mut queue = VecDeque::from([root]);
    while let Some(node) = queue.pop_front() {
        let rule = match node.rule_index {
            Some(index) => i16::try_from(index)
                .map_err(|_| malformed(format!("Rule index {} does not fit", index)))?,
            None => -1,
        };
        let children = u16::try_from(node.children.len())
            .map_err(|_| malformed(format!("{} children do not fit", node.children.len())))?;
        encoded.push(EncodedNode {
            symbol: node.symbol.code(),
            rule,
            children,
        });
        queue.extend(node.children());
    }
    Ok(encoded)
}

pub fn decode_tree(encoded: &[EncodedNode]) -> HgResult<DerivationNode> {
    if encoded.is_empty() {
        return Err(malformed("Empty tree".to_string()));
    }

    // Breadth-first order: children of node i are contiguous and follow every
    // child of nodes before i.
    let mut first_child = Vec::with_capacity(encoded.len());
    let mut next = 1usize;
    for node in encoded {
        first_child.push(next);
        next += node.children as usize;
    }
    if next != encoded.len() {
        return Err(malformed(format!(
            "Child counts describe {} nodes but {} are stored",
            next,
            encoded.len()
        )));
    }

    let mut built: Vec<Option<DerivationNode>> = vec![None; encoded.len()];
    for i in (0..encoded.len()).rev() {
        let node = encoded[i];
        let symbol = Symbol::from_code(node.symbol)
            .ok_or_else(|| malformed(format!("Unknown symbol code {}", node.symbol)))?;
        let rule_index = match node.rule {
            -1 => None,
            r => Some(
                usize::try_from(r).map_err(|_| malformed(format!("Invalid rule index {}", r)))?,
            ),
        };
        let start = first_child[i];
        let children = (start..start + node.children as usize)
            .map(|c| {
                built[c]
                    .take()
                    .ok_or_else(|| malformed(format!("Node {} is referenced twice", c)))
            })
            .collect::<HgResult<Vec<_>>>()?;

        built[i] = Some(match rule_index {
            Some(rule) => DerivationNode::expand(symbol, rule, children),
            None if children.is_empty() => DerivationNode::terminal(symbol),
            None => {
                return Err(malformed(format!(
                    "{} has children but no rule",
                    symbol.name()
                )))
            }
        });
    }

    built[0]
        .take()
        .ok_or_else(|| malformed("Missing root".to_string()))
}

pub fn write_checkpoint<W: Write>(writer: W, checkpoint: &Checkpoint) -> HgResult<()> {
    let file = CheckpointFile {
        iteration: checkpoint.iteration,
        solutions: checkpoint
            .solutions
            .iter()
            .map(|s| encode_tree(s.root()))
            .collect::<HgResult<_>>()?,
    };
    serde_json::to_writer(writer, &file)?;
    Ok(())
}

/// Reads and re-validates every stored program.
pub fn read_checkpoint<R: Read>(reader: R) -> HgResult<Checkpoint> {
    let file: CheckpointFile = serde_json::from_reader(reader)?;
    let solutions = file
        .solutions
        .iter()
        .map(|encoded| Solution::from_tree(decode_tree(encoded)?).map(Arc::new))
        .collect::<HgResult<_>>()?;
    Ok(Checkpoint {
        iteration: file.iteration,
        solutions,
    })
}

/// A checkpoint directory holding at most one checkpoint.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    dir: PathBuf,
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> HgResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        let path = dir.join(CHECKPOINT_FILE_NAME);
        Ok(Self { dir, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> HgResult<Option<Checkpoint>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let checkpoint = read_checkpoint(BufReader::new(File::open(&self.path)?))?;
        info!(
            "Loaded checkpoint at iteration {} with {} solutions from {:?}",
            checkpoint.iteration,
            checkpoint.solutions.len(),
            self.path
        );
        Ok(Some(checkpoint))
    }

    /// Writes to a temporary file in the same directory, then renames over
    /// the previous checkpoint.
    pub fn save(&self, checkpoint: &Checkpoint) -> HgResult<()> {
        let temp = NamedTempFile::new_in(&self.dir)?;
        {
            let mut writer = BufWriter::new(temp.as_file());
            write_checkpoint(&mut writer, checkpoint)?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Returns whether a checkpoint existed.
    pub fn delete(&self) -> HgResult<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => {
                warn!("Could not delete {:?}: {}", self.path, e);
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evolution::seeds;

    #[test]
    fn test_encoding_is_breadth_first() {
        let encoded = encode_tree(&seeds::degree_heuristic()).unwrap();
        assert_eq!(
            encoded,
            [
                EncodedNode { symbol: -1, rule: 2, children: 1 },
                EncodedNode { symbol: -8, rule: 30, children: 1 },
                EncodedNode { symbol: 24, rule: -1, children: 0 },
            ]
        );
    }

    #[test]
    fn test_decode_rejects_bad_counts() {
        let mut encoded = encode_tree(&seeds::evolved_heuristic()).unwrap();
        assert_eq!(decode_tree(&encoded).unwrap(), seeds::evolved_heuristic());
        encoded[0].children += 1;
        assert!(decode_tree(&encoded).is_err());
        assert!(decode_tree(&[]).is_err());
    }
}
