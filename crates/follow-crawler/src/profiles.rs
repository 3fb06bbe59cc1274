use crate::api::{AccountId, AccountRef, IdKind, ProfileRecord, SocialApi, UserBatch};
use crate::error::{CrawlError, Result};
use crate::executor::RequestExecutor;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Identifiers accepted by one `users/lookup` call.
pub const LOOKUP_BATCH_SIZE: usize = 100;

/// Profiles keyed by the identifier kind used for the lookup, kept in response order.
#[derive(Debug, Clone, Default)]
pub struct ProfileMap {
    entries: Vec<(AccountRef, ProfileRecord)>,
    index: HashMap<AccountRef, usize>,
}

impl ProfileMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the record for `key`. A replaced key keeps its position.
    pub fn insert(&mut self, key: AccountRef, record: ProfileRecord) {
        match self.index.get(&key) {
            Some(&pos) => self.entries[pos].1 = record,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, record));
            }
        }
    }

    pub fn get(&self, key: &AccountRef) -> Option<&ProfileRecord> {
        self.index.get(key).map(|&pos| &self.entries[pos].1)
    }

    pub fn contains_key(&self, key: &AccountRef) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AccountRef, &ProfileRecord)> + '_ {
        self.entries.iter().map(|(key, record)| (key, record))
    }
}

/// Resolves identifiers into profile records in batches of [`LOOKUP_BATCH_SIZE`].
#[derive(Clone)]
pub struct ProfileLookup {
    api: Arc<dyn SocialApi>,
    executor: RequestExecutor,
}

impl ProfileLookup {
    pub fn new(api: Arc<dyn SocialApi>, executor: RequestExecutor) -> Self {
        Self { api, executor }
    }

    /// Looks up `identifiers`, which must all use the same addressing mode.
    ///
    /// A batch that yields no data is skipped; its identifiers are simply
    /// absent from the result.
    pub async fn lookup_profiles(&self, identifiers: &[AccountRef]) -> Result<ProfileMap> {
        let mut profiles = ProfileMap::new();
        let Some(kind) = identifiers.first().map(AccountRef::kind) else {
            return Ok(profiles);
        };

        if identifiers.iter().any(|item| item.kind() != kind) {
            return Err(CrawlError::InvalidArgument(
                "Must have handles or numeric ids, but not both".to_string(),
            ));
        }

        let api = self.api.as_ref();
        for chunk in identifiers.chunks(LOOKUP_BATCH_SIZE) {
            let batch = to_batch(kind, chunk);
            let request = &batch;
            let response = self
                .executor
                .execute("users/lookup", move || api.lookup_users(request))
                .await?;

            let Some(records) = response else {
                warn!("Lookup batch of {} identifiers returned no data", chunk.len());
                continue;
            };

            for record in records {
                let key = match kind {
                    IdKind::NumericId => AccountRef::Id(record.id),
                    IdKind::Handle => AccountRef::Handle(record.handle.clone()),
                };
                profiles.insert(key, record);
            }
        }

        debug!(
            "Resolved {} of {} profiles",
            profiles.len(),
            identifiers.len()
        );
        Ok(profiles)
    }

    pub async fn lookup_ids(&self, ids: &[AccountId]) -> Result<ProfileMap> {
        let identifiers: Vec<AccountRef> = ids.iter().copied().map(AccountRef::Id).collect();
        self.lookup_profiles(&identifiers).await
    }

    pub async fn lookup_handles(&self, handles: &[String]) -> Result<ProfileMap> {
        let identifiers: Vec<AccountRef> = handles.iter().cloned().map(AccountRef::Handle).collect();
        self.lookup_profiles(&identifiers).await
    }
}

fn to_batch(kind: IdKind, chunk: &[AccountRef]) -> UserBatch {
    match kind {
        IdKind::NumericId => UserBatch::Ids(
            chunk
                .iter()
                .filter_map(|item| match item {
                    AccountRef::Id(id) => Some(*id),
                    AccountRef::Handle(_) => None,
                })
                .collect(),
        ),
        IdKind::Handle => UserBatch::Handles(
            chunk
                .iter()
                .filter_map(|item| match item {
                    AccountRef::Handle(handle) => Some(handle.clone()),
                    AccountRef::Id(_) => None,
                })
                .collect(),
        ),
    }
}
