pub mod topology {
    use crate::api::AccountId;
    use std::collections::HashMap;
    use std::fmt::Write;

    /// Undirected follow graph represented as an adjacency list.
    /// Nodes get dense indices in discovery order; edges carry no weight.
    #[derive(Debug, Clone, Default)]
    pub struct SocialGraph {
        /// NodeIndex -> account
        nodes: Vec<AccountId>,
        /// Adjacency list: NodeIndex -> neighbor NodeIndexes
        adj: Vec<Vec<u32>>,
        index: HashMap<AccountId, u32>,
        edge_count: usize,
    }

    impl SocialGraph {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn node_count(&self) -> usize {
            self.nodes.len()
        }

        pub fn edge_count(&self) -> usize {
            self.edge_count
        }

        pub fn is_empty(&self) -> bool {
            self.nodes.is_empty()
        }

        pub fn contains(&self, account: AccountId) -> bool {
            self.index.contains_key(&account)
        }

        /// Accounts in the order they were added.
        pub fn nodes(&self) -> &[AccountId] {
            &self.nodes
        }

        pub fn index_of(&self, account: AccountId) -> Option<u32> {
            self.index.get(&account).copied()
        }

        /// Adds `account` if missing and returns its node index.
        pub fn add_node(&mut self, account: AccountId) -> u32 {
            if let Some(&idx) = self.index.get(&account) {
                return idx;
            }
            let idx = self.nodes.len() as u32;
            self.nodes.push(account);
            self.adj.push(Vec::new());
            self.index.insert(account, idx);
            idx
        }

        /// Adds the undirected edge `a - b`, creating missing endpoints.
        /// Returns false if the edge already existed. Self-loops are stored once.
        pub fn add_edge(&mut self, a: AccountId, b: AccountId) -> bool {
            let src = self.add_node(a);
            let dst = self.add_node(b);
            if self.adj[src as usize].contains(&dst) {
                return false;
            }
            self.adj[src as usize].push(dst);
            if src != dst {
                self.adj[dst as usize].push(src);
            }
            self.edge_count += 1;
            true
        }

        pub fn has_edge(&self, a: AccountId, b: AccountId) -> bool {
            match (self.index_of(a), self.index_of(b)) {
                (Some(src), Some(dst)) => self.adj[src as usize].contains(&dst),
                _ => false,
            }
        }

        pub fn neighbors(&self, account: AccountId) -> impl Iterator<Item = AccountId> + '_ {
            self.index_of(account)
                .and_then(|idx| self.adj.get(idx as usize))
                .into_iter()
                .flatten()
                .map(move |&n| self.nodes[n as usize])
        }

        /// Neighbor indexes of a node index.
        pub fn adjacent(&self, idx: u32) -> &[u32] {
            self.adj.get(idx as usize).map(Vec::as_slice).unwrap_or(&[])
        }

        /// Each undirected edge once, lower node index first.
        pub fn edges(&self) -> Vec<(AccountId, AccountId)> {
            let mut edges = Vec::with_capacity(self.edge_count);
            for (src, neighbors) in self.adj.iter().enumerate() {
                for &dst in neighbors {
                    if src as u32 <= dst {
                        edges.push((self.nodes[src], self.nodes[dst as usize]));
                    }
                }
            }
            edges
        }

        /// Graphviz rendering for external visualization.
        pub fn to_dot(&self) -> String {
            let mut out = String::from("graph social {\n");
            for node in &self.nodes {
                let _ = writeln!(out, "    \"{}\";", node);
            }
            for (a, b) in self.edges() {
                let _ = writeln!(out, "    \"{}\" -- \"{}\";", a, b);
            }
            out.push_str("}\n");
            out
        }
    }

}

pub mod api;
pub mod config;
pub mod crawler;
pub mod error;
pub mod executor;
pub mod pager;
pub mod persistence;
pub mod profiles;
pub mod ranker;
pub mod report;

pub use api::{AccountId, AccountRef, HttpSocialApi, SocialApi};
pub use config::{CrawlerConfig, RetryPolicy};
pub use crawler::{CrawlAbort, CrawlOutcome, GraphCrawler, StopReason};
pub use error::{ApiFailure, CrawlError, FailureKind};
pub use topology::SocialGraph;
