use std::collections::HashSet;

use super::{Entry, EntryKind, RemoteFs, RemotePath};
use crate::common::errors::RemoteError;

#[derive(Debug, Clone)]
enum Node {
    File { modified: Option<u64>, size: u64 },
    Dir { modified: u64, children: Vec<(String, Node)> },
}

/// An in-memory remote tree.
///
/// Listings come back in insertion order, like an unsorted server would
/// return them. Every successful removal is recorded, and individual paths
/// can be made to fail so error propagation can be exercised.
#[derive(Debug, Clone)]
pub struct MemoryFs {
    root: Node,
    removed: Vec<String>,
    failing_lists: HashSet<String>,
    failing_removals: HashSet<String>,
}

impl Default for MemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFs {
    pub fn new() -> Self {
        Self {
            root: Node::Dir {
                modified: 0,
                children: Vec::new(),
            },
            removed: Vec::new(),
            failing_lists: HashSet::new(),
            failing_removals: HashSet::new(),
        }
    }

    /// Add a file, creating missing parent directories
    pub fn add_file(&mut self, path: &str, modified: u64, size: u64) -> &mut Self {
        self.insert(
            path,
            Node::File {
                modified: Some(modified),
                size,
            },
        );
        self
    }

    /// Add a file whose listing carries no modification time
    pub fn add_file_without_mtime(&mut self, path: &str, size: u64) -> &mut Self {
        self.insert(path, Node::File { modified: None, size });
        self
    }

    /// Add an empty directory, creating missing parents
    pub fn add_dir(&mut self, path: &str, modified: u64) -> &mut Self {
        self.insert(
            path,
            Node::Dir {
                modified,
                children: Vec::new(),
            },
        );
        self
    }

    /// Make listing `path` fail
    pub fn fail_list(&mut self, path: &str) -> &mut Self {
        self.failing_lists.insert(normalize(path).join("/"));
        self
    }

    /// Make removing `path` fail
    pub fn fail_remove(&mut self, path: &str) -> &mut Self {
        self.failing_removals.insert(normalize(path).join("/"));
        self
    }

    pub fn exists(&self, path: &str) -> bool {
        self.lookup(path).is_some()
    }

    /// Paths removed so far, in removal order
    pub fn removed(&self) -> &[String] {
        &self.removed
    }

    /// Number of files anywhere in the tree
    pub fn file_count(&self) -> usize {
        fn count(node: &Node) -> usize {
            match node {
                Node::File { .. } => 1,
                Node::Dir { children, .. } => children.iter().map(|(_, c)| count(c)).sum(),
            }
        }
        count(&self.root)
    }

    fn insert(&mut self, path: &str, node: Node) {
        let parts = normalize(path);
        let Some((leaf, parents)) = parts.split_last() else {
            return;
        };

        let mut current = &mut self.root;
        for part in parents {
            let Node::Dir { children, .. } = current else {
                return;
            };
            let idx = match children.iter().position(|(name, _)| name == part) {
                Some(idx) => idx,
                None => {
                    children.push((
                        part.to_string(),
                        Node::Dir {
                            modified: 0,
                            children: Vec::new(),
                        },
                    ));
                    children.len() - 1
                }
            };
            current = &mut children[idx].1;
        }

        if let Node::Dir { children, .. } = current {
            match children.iter_mut().find(|(name, _)| name == leaf) {
                Some((_, existing)) => *existing = node,
                None => children.push((leaf.to_string(), node)),
            }
        }
    }

    fn lookup(&self, path: &str) -> Option<&Node> {
        let mut current = &self.root;
        for part in normalize(path) {
            let Node::Dir { children, .. } = current else {
                return None;
            };
            current = &children.iter().find(|(name, _)| name == part)?.1;
        }
        Some(current)
    }

    fn parent_children(&mut self, path: &str) -> Option<(&mut Vec<(String, Node)>, String)> {
        let parts = normalize(path);
        let (leaf, parents) = parts.split_last()?;
        let leaf = leaf.to_string();

        let mut current = &mut self.root;
        for part in parents {
            let Node::Dir { children, .. } = current else {
                return None;
            };
            current = &mut children.iter_mut().find(|(name, _)| name == part)?.1;
        }
        match current {
            Node::Dir { children, .. } => Some((children, leaf)),
            Node::File { .. } => None,
        }
    }

    fn is_failing(set: &HashSet<String>, path: &str) -> bool {
        set.contains(&normalize(path).join("/"))
    }
}

impl RemoteFs for MemoryFs {
    fn list_entries(&mut self, path: &RemotePath) -> Result<Vec<Entry>, RemoteError> {
        let path = &path.to_string();
        if Self::is_failing(&self.failing_lists, path) {
            return Err(RemoteError::list(path, "injected failure"));
        }
        match self.lookup(path) {
            Some(Node::Dir { children, .. }) => Ok(children
                .iter()
                .map(|(name, node)| match node {
                    Node::File { modified, size } => {
                        Entry::from_raw(name.clone().into_bytes(), EntryKind::File, *modified, *size)
                    }
                    Node::Dir { modified, .. } => Entry::directory(name.clone(), *modified),
                })
                .collect()),
            Some(Node::File { .. }) => Err(RemoteError::list(path, "not a directory")),
            None => Err(RemoteError::list(path, "no such file")),
        }
    }

    fn remove_file(&mut self, path: &RemotePath) -> Result<(), RemoteError> {
        let path = &path.to_string();
        if Self::is_failing(&self.failing_removals, path) {
            return Err(RemoteError::remove_file(path, "injected failure"));
        }
        let (children, leaf) = self
            .parent_children(path)
            .ok_or_else(|| RemoteError::remove_file(path, "no such file"))?;
        let idx = children
            .iter()
            .position(|(name, _)| *name == leaf)
            .ok_or_else(|| RemoteError::remove_file(path, "no such file"))?;
        if matches!(children[idx].1, Node::Dir { .. }) {
            return Err(RemoteError::remove_file(path, "is a directory"));
        }
        children.remove(idx);
        self.removed.push(path.to_string());
        Ok(())
    }

    fn remove_dir(&mut self, path: &RemotePath) -> Result<(), RemoteError> {
        let path = &path.to_string();
        if Self::is_failing(&self.failing_removals, path) {
            return Err(RemoteError::remove_dir(path, "injected failure"));
        }
        let (children, leaf) = self
            .parent_children(path)
            .ok_or_else(|| RemoteError::remove_dir(path, "no such file"))?;
        let idx = children
            .iter()
            .position(|(name, _)| *name == leaf)
            .ok_or_else(|| RemoteError::remove_dir(path, "no such file"))?;
        match &children[idx].1 {
            Node::File { .. } => return Err(RemoteError::remove_dir(path, "not a directory")),
            Node::Dir { children: inner, .. } if !inner.is_empty() => {
                return Err(RemoteError::remove_dir(path, "directory not empty"))
            }
            Node::Dir { .. } => {}
        }
        children.remove(idx);
        self.removed.push(path.to_string());
        Ok(())
    }
}

/// Split a remote path into components, dropping `.`, empty parts and a leading `/`
fn normalize(path: &str) -> Vec<&str> {
    path.split('/')
        .filter(|part| !part.is_empty() && *part != ".")
        .collect()
}
