//! Breadth-first expansion of the reciprocal-connection graph around a seed account.

use crate::api::{AccountId, SocialApi};
use crate::config::{CrawlerConfig, RetryPolicy};
use crate::error::{CrawlError, Result};
use crate::executor::RequestExecutor;
use crate::pager::IdPager;
use crate::profiles::ProfileLookup;
use crate::ranker::{ReciprocalRanker, DEFAULT_TOP_K};
use crate::topology::SocialGraph;
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Why a crawl stopped growing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The graph reached the target node count.
    BudgetReached,
    /// A layer produced no new accounts to expand.
    FrontierExhausted,
    /// An error or a cancellation ended the crawl early.
    Aborted,
}

/// Result of a crawl: the discovery log and the graph built from it.
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub seed: Option<AccountId>,
    /// Every discovered account in discovery order, repeats included.
    pub visitation: Vec<AccountId>,
    pub graph: SocialGraph,
    /// Frontier layers entered after seeding
    pub layers: usize,
    pub stop_reason: StopReason,
}

impl CrawlOutcome {
    /// Discovery log without repeats, first occurrence wins.
    pub fn unique_visited(&self) -> Vec<AccountId> {
        let mut seen = HashSet::new();
        self.visitation
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect()
    }
}

/// A crawl that ended in an error, with the graph built up to the last fully
/// expanded account.
#[derive(Debug, thiserror::Error)]
#[error("Crawl aborted with {} nodes built: {}", .partial.graph.node_count(), .error)]
pub struct CrawlAbort {
    #[source]
    pub error: CrawlError,
    pub partial: CrawlOutcome,
}

#[derive(Default)]
struct CrawlState {
    seed: Option<AccountId>,
    visitation: Vec<AccountId>,
    graph: SocialGraph,
    layers: usize,
}

impl CrawlState {
    fn into_outcome(self, stop_reason: StopReason) -> CrawlOutcome {
        CrawlOutcome {
            seed: self.seed,
            visitation: self.visitation,
            graph: self.graph,
            layers: self.layers,
            stop_reason,
        }
    }
}

pub struct GraphCrawler {
    api: Arc<dyn SocialApi>,
    executor: RequestExecutor,
    ranker: ReciprocalRanker,
    top_k: usize,
}

impl GraphCrawler {
    pub fn new(api: Arc<dyn SocialApi>, policy: RetryPolicy, cancel: CancellationToken) -> Self {
        let executor = RequestExecutor::new(policy, cancel);
        let pager = IdPager::new(api.clone(), executor.clone());
        let profiles = ProfileLookup::new(api.clone(), executor.clone());
        Self {
            api,
            executor,
            ranker: ReciprocalRanker::new(pager, profiles),
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn from_config(
        api: Arc<dyn SocialApi>,
        config: &CrawlerConfig,
        cancel: CancellationToken,
    ) -> Self {
        let mut crawler = Self::new(api, config.retry.clone(), cancel).with_top_k(config.top_k);
        crawler.ranker = crawler.ranker.with_list_cap(config.list_cap);
        crawler
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn ranker(&self) -> &ReciprocalRanker {
        &self.ranker
    }

    /// Resolves a handle to its account id.
    pub async fn resolve(&self, handle: &str) -> Result<AccountId> {
        let handle = validate_handle(handle)?;
        let api = self.api.as_ref();
        let profile = self
            .executor
            .execute("users/show", move || api.show_user(handle))
            .await?;
        profile
            .map(|p| p.id)
            .ok_or_else(|| CrawlError::SeedUnresolved(handle.to_string()))
    }

    /// Crawls outward from `seed_handle` until the graph holds at least
    /// `target_nodes` accounts or no new accounts turn up.
    ///
    /// The budget is checked after every single expansion, so the graph can end
    /// up to `top_k - 1` nodes past the target but never stops half way through
    /// one account's connections.
    pub async fn crawl(
        &self,
        seed_handle: &str,
        target_nodes: usize,
    ) -> std::result::Result<CrawlOutcome, CrawlAbort> {
        let mut state = CrawlState::default();
        match self.run(seed_handle, target_nodes, &mut state).await {
            Ok(stop_reason) => {
                info!(
                    nodes = state.graph.node_count(),
                    edges = state.graph.edge_count(),
                    ?stop_reason,
                    "Crawl finished"
                );
                Ok(state.into_outcome(stop_reason))
            }
            Err(error) => {
                warn!(
                    nodes = state.graph.node_count(),
                    "Crawl aborted: {}", error
                );
                Err(CrawlAbort {
                    error,
                    partial: state.into_outcome(StopReason::Aborted),
                })
            }
        }
    }

    async fn run(
        &self,
        seed_handle: &str,
        target_nodes: usize,
        state: &mut CrawlState,
    ) -> Result<StopReason> {
        let seed = self.resolve(seed_handle).await?;
        info!("Resolved seed {} to account {}", seed_handle.trim(), seed);
        state.seed = Some(seed);
        state.visitation.push(seed);
        state.graph.add_node(seed);

        if state.graph.node_count() >= target_nodes {
            return Ok(StopReason::BudgetReached);
        }

        self.check_cancelled()?;
        let mut frontier = self.expand(seed, state).await?;
        if state.graph.node_count() >= target_nodes {
            return Ok(StopReason::BudgetReached);
        }

        while !frontier.is_empty() {
            state.layers += 1;
            info!(
                layer = state.layers,
                frontier = frontier.len(),
                nodes = state.graph.node_count(),
                "Expanding layer"
            );

            let mut next = Vec::new();
            for account in frontier {
                self.check_cancelled()?;
                next.extend(self.expand(account, state).await?);
                if state.graph.node_count() >= target_nodes {
                    return Ok(StopReason::BudgetReached);
                }
            }
            frontier = next;
        }

        Ok(StopReason::FrontierExhausted)
    }

    /// Links `account` to its top reciprocal connections and returns the ones not
    /// seen before. The graph is only touched once the ranking succeeded.
    async fn expand(&self, account: AccountId, state: &mut CrawlState) -> Result<Vec<AccountId>> {
        let top = self.ranker.top_reciprocal(account, self.top_k).await?;

        state.graph.add_node(account);
        let mut discovered = Vec::new();
        for &neighbor in &top {
            if !state.graph.contains(neighbor) {
                discovered.push(neighbor);
            }
            state.graph.add_edge(account, neighbor);
        }
        state.visitation.extend(top);
        Ok(discovered)
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.executor.cancel_token().is_cancelled() {
            Err(CrawlError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Handles are non-empty runs of ASCII letters, digits and underscores.
fn validate_handle(handle: &str) -> Result<&str> {
    let handle = handle.trim();
    if handle.is_empty() || !handle.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(CrawlError::InvalidArgument(format!(
            "invalid handle {:?}",
            handle
        )));
    }
    Ok(handle)
}
