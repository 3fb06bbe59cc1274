#![allow(dead_code)]

use async_trait::async_trait;
use follow_crawler::api::{
    AccountId, AccountRef, IdPage, ListRole, ProfileRecord, SocialApi, UserBatch, END_CURSOR,
    START_CURSOR,
};
use follow_crawler::error::{ApiFailure, FailureKind};
use follow_crawler::RetryPolicy;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

pub fn id(n: u64) -> AccountId {
    AccountId(n)
}

pub fn ids(range: impl IntoIterator<Item = u64>) -> Vec<AccountId> {
    range.into_iter().map(AccountId).collect()
}

/// In-memory follow graph that answers the API calls and records them.
#[derive(Default)]
pub struct ScriptedApi {
    friends: HashMap<AccountId, Vec<AccountId>>,
    followers: HashMap<AccountId, Vec<AccountId>>,
    profiles: HashMap<AccountId, ProfileRecord>,
    handles: HashMap<String, AccountId>,
    /// Explicit pages per listing, keyed by the cursor that requests them
    pages: HashMap<(ListRole, AccountId), HashMap<i64, IdPage>>,
    /// Listings of these accounts answer with the given failure every time
    broken: HashMap<AccountId, FailureKind>,
    /// One-shot failures consumed per endpoint in call order
    pending: Mutex<HashMap<&'static str, VecDeque<FailureKind>>>,
    calls: Mutex<Vec<Call>>,
    page_size: Option<usize>,
    /// Cancelled when the friends listing of this account is requested
    cancel_on_friends: Option<(AccountId, CancellationToken)>,
    /// Cancelled once this many lookup batches have been answered
    cancel_after_lookups: Option<(usize, CancellationToken)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List {
        role: ListRole,
        account: AccountRef,
        cursor: i64,
    },
    Lookup {
        size: usize,
    },
    Show {
        handle: String,
    },
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Registers a profile; handles default to `user<id>`.
    pub fn profile(mut self, account: u64, followers_count: u64) -> Self {
        let handle = format!("user{}", account);
        self.add_profile(account, &handle, followers_count);
        self
    }

    pub fn named(mut self, account: u64, handle: &str, followers_count: u64) -> Self {
        self.add_profile(account, handle, followers_count);
        self
    }

    fn add_profile(&mut self, account: u64, handle: &str, followers_count: u64) {
        self.handles.insert(handle.to_string(), id(account));
        self.profiles.insert(
            id(account),
            ProfileRecord {
                id: id(account),
                handle: handle.to_string(),
                followers_count,
            },
        );
    }

    /// `a` follows `b`.
    pub fn follows(mut self, a: u64, b: u64) -> Self {
        self.friends.entry(id(a)).or_default().push(id(b));
        self.followers.entry(id(b)).or_default().push(id(a));
        self
    }

    /// `a` and `b` follow each other.
    pub fn mutual(self, a: u64, b: u64) -> Self {
        self.follows(a, b).follows(b, a)
    }

    pub fn friends_list(mut self, account: u64, list: Vec<AccountId>) -> Self {
        self.friends.insert(id(account), list);
        self
    }

    pub fn followers_list(mut self, account: u64, list: Vec<AccountId>) -> Self {
        self.followers.insert(id(account), list);
        self
    }

    pub fn with_pages(mut self, role: ListRole, account: u64, pages: Vec<(i64, IdPage)>) -> Self {
        self.pages
            .insert((role, id(account)), pages.into_iter().collect());
        self
    }

    pub fn with_page_size(mut self, size: usize) -> Self {
        self.page_size = Some(size);
        self
    }

    /// Cancels `token` when `account`'s friends are listed. The call itself
    /// still answers normally.
    pub fn cancel_on_friends(mut self, account: u64, token: CancellationToken) -> Self {
        self.cancel_on_friends = Some((id(account), token));
        self
    }

    pub fn cancel_after_lookups(mut self, count: usize, token: CancellationToken) -> Self {
        self.cancel_after_lookups = Some((count, token));
        self
    }

    pub fn broken(mut self, account: u64, kind: FailureKind) -> Self {
        self.broken.insert(id(account), kind);
        self
    }

    pub fn fail_next(self, endpoint: &'static str, kinds: Vec<FailureKind>) -> Self {
        self.pending
            .lock()
            .unwrap()
            .entry(endpoint)
            .or_default()
            .extend(kinds);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn list_calls_for(&self, account: u64) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::List { account: a, .. } if *a == AccountRef::Id(id(account))))
            .count()
    }

    pub fn lookup_sizes(&self) -> Vec<usize> {
        self.calls()
            .iter()
            .filter_map(|c| match c {
                Call::Lookup { size } => Some(*size),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn take_failure(&self, endpoint: &'static str) -> Option<ApiFailure> {
        self.pending
            .lock()
            .unwrap()
            .get_mut(endpoint)
            .and_then(VecDeque::pop_front)
            .map(|kind| ApiFailure::new(kind, format!("scripted {}", kind)))
    }

    fn resolve(&self, account: &AccountRef) -> Option<AccountId> {
        match account {
            AccountRef::Id(id) => Some(*id),
            AccountRef::Handle(handle) => self.handles.get(handle).copied(),
        }
    }
}

#[async_trait]
impl SocialApi for ScriptedApi {
    async fn list_ids(
        &self,
        role: ListRole,
        account: &AccountRef,
        cursor: i64,
        count: usize,
    ) -> Result<IdPage, ApiFailure> {
        self.record(Call::List {
            role,
            account: account.clone(),
            cursor,
        });
        if let Some((target, token)) = &self.cancel_on_friends {
            if role == ListRole::Friends && *account == AccountRef::Id(*target) {
                token.cancel();
            }
        }
        if let Some(failure) = self.take_failure(role.endpoint()) {
            return Err(failure);
        }

        let account = self
            .resolve(account)
            .ok_or_else(|| ApiFailure::from_status(404, "no such user"))?;
        if let Some(kind) = self.broken.get(&account) {
            return Err(ApiFailure::new(*kind, "broken account"));
        }

        if let Some(pages) = self.pages.get(&(role, account)) {
            return pages
                .get(&cursor)
                .cloned()
                .ok_or_else(|| ApiFailure::from_status(404, "unknown cursor"));
        }

        let list = match role {
            ListRole::Friends => self.friends.get(&account),
            ListRole::Followers => self.followers.get(&account),
        }
        .cloned()
        .unwrap_or_default();

        let size = self.page_size.unwrap_or(count).max(1);
        let start = if cursor == START_CURSOR { 0 } else { cursor as usize };
        let end = (start + size).min(list.len());
        let next_cursor = if end < list.len() { end as i64 } else { END_CURSOR };
        Ok(IdPage {
            ids: list.get(start..end).map(<[_]>::to_vec).unwrap_or_default(),
            next_cursor,
        })
    }

    async fn lookup_users(&self, batch: &UserBatch) -> Result<Vec<ProfileRecord>, ApiFailure> {
        self.record(Call::Lookup { size: batch.len() });
        if let Some(failure) = self.take_failure("users/lookup") {
            return Err(failure);
        }
        if let Some((count, token)) = &self.cancel_after_lookups {
            if self.lookup_sizes().len() >= *count {
                token.cancel();
            }
        }

        let found = match batch {
            UserBatch::Ids(ids) => ids
                .iter()
                .filter_map(|id| self.profiles.get(id).cloned())
                .collect(),
            UserBatch::Handles(handles) => handles
                .iter()
                .filter_map(|h| self.handles.get(h))
                .filter_map(|id| self.profiles.get(id).cloned())
                .collect(),
        };
        Ok(found)
    }

    async fn show_user(&self, handle: &str) -> Result<ProfileRecord, ApiFailure> {
        self.record(Call::Show {
            handle: handle.to_string(),
        });
        if let Some(failure) = self.take_failure("users/show") {
            return Err(failure);
        }

        self.handles
            .get(handle)
            .and_then(|id| self.profiles.get(id))
            .cloned()
            .ok_or_else(|| ApiFailure::from_status(404, "no such user"))
    }
}

pub fn executor() -> follow_crawler::executor::RequestExecutor {
    follow_crawler::executor::RequestExecutor::new(RetryPolicy::default(), CancellationToken::new())
}

pub fn unique(list: &[AccountId]) -> HashSet<AccountId> {
    list.iter().copied().collect()
}
