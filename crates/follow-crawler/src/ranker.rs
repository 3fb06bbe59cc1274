use crate::api::{AccountId, AccountRef, ListRole};
use crate::error::Result;
use crate::pager::IdPager;
use crate::profiles::ProfileLookup;
use std::collections::HashSet;
use tracing::debug;

pub use crate::config::{DEFAULT_LIST_CAP, DEFAULT_TOP_K};

/// Ranks an account's reciprocal connections (friends that also follow back)
/// by follower count.
#[derive(Clone)]
pub struct ReciprocalRanker {
    pager: IdPager,
    profiles: ProfileLookup,
    list_cap: usize,
}

impl ReciprocalRanker {
    pub fn new(pager: IdPager, profiles: ProfileLookup) -> Self {
        Self {
            pager,
            profiles,
            list_cap: DEFAULT_LIST_CAP,
        }
    }

    pub fn with_list_cap(mut self, list_cap: usize) -> Self {
        self.list_cap = list_cap;
        self
    }

    /// Friends of `account` that also follow it, in friends-listing order, without repeats.
    pub async fn reciprocal_ids(&self, account: AccountId) -> Result<Vec<AccountId>> {
        let target = AccountRef::Id(account);
        let friends = self
            .pager
            .fetch_ids(&target, ListRole::Friends, self.list_cap)
            .await?;
        let followers: HashSet<AccountId> = self
            .pager
            .fetch_ids(&target, ListRole::Followers, self.list_cap)
            .await?
            .into_iter()
            .collect();

        let mut seen = HashSet::new();
        Ok(friends
            .into_iter()
            .filter(|id| followers.contains(id) && seen.insert(*id))
            .collect())
    }

    /// The `k` reciprocal connections of `account` with the most followers.
    ///
    /// Equal follower counts keep the order the profile lookup returned them in.
    /// Connections whose profile could not be resolved are dropped.
    pub async fn top_reciprocal(&self, account: AccountId, k: usize) -> Result<Vec<AccountId>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let reciprocal = self.reciprocal_ids(account).await?;
        if reciprocal.is_empty() {
            debug!("{} has no reciprocal connections", account);
            return Ok(Vec::new());
        }

        let profiles = self.profiles.lookup_ids(&reciprocal).await?;
        let wanted: HashSet<AccountId> = reciprocal.iter().copied().collect();
        let mut ranked: Vec<(AccountId, u64)> = profiles
            .iter()
            .map(|(_, profile)| (profile.id, profile.followers_count))
            .filter(|(id, _)| wanted.contains(id))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));

        let top: Vec<AccountId> = ranked.into_iter().take(k).map(|(id, _)| id).collect();
        debug!(
            "Top {} of {} reciprocal connections for {}",
            top.len(),
            reciprocal.len(),
            account
        );
        Ok(top)
    }
}
