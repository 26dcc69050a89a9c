//! Prefix index over segment identifiers.
//!
//! Nodes live in a flat arena and refer to each other by `u32` handles, so lookups and
//! traversals are iterative and every link is bounds-checked. Children are kept in a
//! `BTreeMap`, which makes a depth-first walk yield identifiers in lexicographic order.
//! Removal only clears the terminal flag and prunes now-empty leaf chains; freed slots
//! are recycled through a free list.

use std::collections::BTreeMap;

type NodeId = u32;

const ROOT: NodeId = 0;

#[derive(Debug, Default, Clone)]
struct TrieNode {
    children: BTreeMap<char, NodeId>,
    terminal: bool,
}

#[derive(Debug, Clone)]
pub struct NameTrie {
    nodes: Vec<TrieNode>,
    free: Vec<NodeId>,
    len: usize,
}

impl Default for NameTrie {
    fn default() -> Self {
        Self::new()
    }
}

impl NameTrie {
    pub fn new() -> Self {
        Self {
            nodes: vec![TrieNode::default()],
            free: Vec::new(),
            len: 0,
        }
    }

    /// Number of names stored.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Inserts `name`. Returns `false` if it was already present.
    pub fn insert(&mut self, name: &str) -> bool {
        let mut node = ROOT;
        for c in name.chars() {
            let existing = self.nodes[node as usize].children.get(&c).copied();
            node = match existing {
                Some(child) => child,
                None => {
                    let child = self.alloc();
                    self.nodes[node as usize].children.insert(c, child);
                    child
                }
            };
        }
        let slot = &mut self.nodes[node as usize];
        if slot.terminal {
            return false;
        }
        slot.terminal = true;
        self.len += 1;
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name)
            .map(|n| self.nodes[n as usize].terminal)
            .unwrap_or(false)
    }

    /// Removes `name`. Returns `false` if it was not present.
    pub fn remove(&mut self, name: &str) -> bool {
        // Path of (parent, edge) pairs so empty nodes can be unlinked bottom-up.
        let mut path: Vec<(NodeId, char)> = Vec::new();
        let mut node = ROOT;
        for c in name.chars() {
            match self.nodes[node as usize].children.get(&c) {
                Some(&child) => {
                    path.push((node, c));
                    node = child;
                }
                None => return false,
            }
        }
        if !self.nodes[node as usize].terminal {
            return false;
        }
        self.nodes[node as usize].terminal = false;
        self.len -= 1;

        while let Some((parent, c)) = path.pop() {
            let current = &self.nodes[node as usize];
            if current.terminal || !current.children.is_empty() {
                break;
            }
            self.nodes[parent as usize].children.remove(&c);
            self.release(node);
            node = parent;
        }
        true
    }

    /// All stored names that start with `prefix`, in lexicographic order.
    pub fn with_prefix(&self, prefix: &str) -> Vec<String> {
        let Some(start) = self.find(prefix) else {
            return Vec::new();
        };

        let mut out = Vec::new();
        // Explicit stack of (node, name-so-far). Children are pushed in reverse so the
        // smallest edge is popped first.
        let mut stack: Vec<(NodeId, String)> = vec![(start, prefix.to_string())];
        while let Some((node, name)) = stack.pop() {
            let n = &self.nodes[node as usize];
            if n.terminal {
                out.push(name.clone());
            }
            for (&c, &child) in n.children.iter().rev() {
                let mut next = name.clone();
                next.push(c);
                stack.push((child, next));
            }
        }
        out
    }

    fn find(&self, key: &str) -> Option<NodeId> {
        let mut node = ROOT;
        for c in key.chars() {
            node = *self.nodes.get(node as usize)?.children.get(&c)?;
        }
        Some(node)
    }

    fn alloc(&mut self) -> NodeId {
        match self.free.pop() {
            Some(id) => id,
            None => {
                self.nodes.push(TrieNode::default());
                (self.nodes.len() - 1) as NodeId
            }
        }
    }

    fn release(&mut self, node: NodeId) {
        self.nodes[node as usize] = TrieNode::default();
        self.free.push(node);
    }
}
