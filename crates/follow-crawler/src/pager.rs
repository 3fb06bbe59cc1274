use crate::api::{AccountId, AccountRef, ListRole, SocialApi, END_CURSOR, START_CURSOR};
use crate::error::Result;
use crate::executor::RequestExecutor;
use std::sync::Arc;
use tracing::{debug, warn};

/// Maximum ids returned by one `friends/ids` or `followers/ids` page.
pub const PAGE_SIZE: usize = 5000;

/// Pages through cursor-based id listings.
#[derive(Clone)]
pub struct IdPager {
    api: Arc<dyn SocialApi>,
    executor: RequestExecutor,
}

impl IdPager {
    pub fn new(api: Arc<dyn SocialApi>, executor: RequestExecutor) -> Self {
        Self { api, executor }
    }

    /// Collects up to `cap` ids of `account`'s friends or followers in listing order.
    ///
    /// An unreachable account or page ends the listing early with whatever was
    /// collected so far, as does a non-terminal page that brings no ids or
    /// repeats its own cursor. Pass `usize::MAX` for an uncapped listing.
    pub async fn fetch_ids(
        &self,
        account: &AccountRef,
        role: ListRole,
        cap: usize,
    ) -> Result<Vec<AccountId>> {
        let mut ids = Vec::new();
        if cap == 0 {
            return Ok(ids);
        }

        let api = self.api.as_ref();
        let mut cursor = START_CURSOR;

        while cursor != END_CURSOR {
            let page = self
                .executor
                .execute(role.endpoint(), move || api.list_ids(role, account, cursor, PAGE_SIZE))
                .await?;

            let Some(page) = page else {
                debug!("No {} data for {}, stopping at {} ids", role.label(), account, ids.len());
                break;
            };

            let stalled = page.ids.is_empty() || page.next_cursor == cursor;
            ids.extend(page.ids);
            debug!("Fetched {} total {} ids for {}", ids.len(), role.label(), account);

            // A page without progress would repeat forever
            if stalled && page.next_cursor != END_CURSOR {
                warn!(
                    "{} listing for {} stalled at cursor {}, stopping at {} ids",
                    role.label(),
                    account,
                    page.next_cursor,
                    ids.len()
                );
                break;
            }
            cursor = page.next_cursor;

            if ids.len() >= cap {
                break;
            }
        }

        ids.truncate(cap);
        Ok(ids)
    }
}
