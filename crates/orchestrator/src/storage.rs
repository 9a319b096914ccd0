// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage ports (spec §6): pluggable persistence for accounts and groups,
//! shaped after the teacher's `PodRegistry` — a name-keyed map behind a
//! single `RwLock`, CRUD plus a couple of domain-specific lookups.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::account::{Account, Cookie, Group};
use crate::driver::BoxFuture;
use crate::error::{EntityKind, OrchestratorError};

fn not_found(kind: EntityKind, id: &str) -> OrchestratorError {
    OrchestratorError::NotFound { kind, id: id.to_string() }
}

/// CRUD port for accounts, read by the Coordinator on `StartSession` and
/// written by `SaveCookies` (spec §4.7, §6).
pub trait AccountRepository: Send + Sync {
    fn find_by_id<'a>(
        &'a self,
        id: &'a str,
    ) -> BoxFuture<'a, Result<Account, OrchestratorError>>;
    fn find_all(&self) -> BoxFuture<'_, Vec<Account>>;
    fn save(&self, account: Account) -> BoxFuture<'_, ()>;
    fn delete<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<(), OrchestratorError>>;
    fn update_cookies<'a>(
        &'a self,
        id: &'a str,
        cookies: Vec<Cookie>,
    ) -> BoxFuture<'a, Result<(), OrchestratorError>>;
}

/// CRUD port for groups, plus a by-account-id lookup (spec §6).
pub trait GroupRepository: Send + Sync {
    fn find_by_id<'a>(
        &'a self,
        id: &'a str,
    ) -> BoxFuture<'a, Result<Group, OrchestratorError>>;
    fn find_all(&self) -> BoxFuture<'_, Vec<Group>>;
    fn find_by_account_id<'a>(&'a self, account_id: &'a str) -> BoxFuture<'a, Vec<Group>>;
    fn save(&self, group: Group) -> BoxFuture<'_, ()>;
    fn delete<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<(), OrchestratorError>>;
}

/// In-memory `AccountRepository`, used as the default store and in tests.
#[derive(Default)]
pub struct InMemoryAccountRepository {
    accounts: RwLock<HashMap<String, Account>>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AccountRepository for InMemoryAccountRepository {
    fn find_by_id<'a>(
        &'a self,
        id: &'a str,
    ) -> BoxFuture<'a, Result<Account, OrchestratorError>> {
        Box::pin(async move {
            self.accounts
                .read()
                .await
                .get(id)
                .cloned()
                .ok_or_else(|| not_found(EntityKind::Account, id))
        })
    }

    fn find_all(&self) -> BoxFuture<'_, Vec<Account>> {
        Box::pin(async move { self.accounts.read().await.values().cloned().collect() })
    }

    fn save(&self, account: Account) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            self.accounts.write().await.insert(account.id.clone(), account);
        })
    }

    fn delete<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<(), OrchestratorError>> {
        Box::pin(async move {
            self.accounts
                .write()
                .await
                .remove(id)
                .map(|_| ())
                .ok_or_else(|| not_found(EntityKind::Account, id))
        })
    }

    fn update_cookies<'a>(
        &'a self,
        id: &'a str,
        cookies: Vec<Cookie>,
    ) -> BoxFuture<'a, Result<(), OrchestratorError>> {
        Box::pin(async move {
            let mut accounts = self.accounts.write().await;
            let account = accounts.get_mut(id).ok_or_else(|| not_found(EntityKind::Account, id))?;
            account.cookies = Some(cookies);
            Ok(())
        })
    }
}

/// In-memory `GroupRepository`, used as the default store and in tests.
#[derive(Default)]
pub struct InMemoryGroupRepository {
    groups: RwLock<HashMap<String, Group>>,
}

impl InMemoryGroupRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GroupRepository for InMemoryGroupRepository {
    fn find_by_id<'a>(
        &'a self,
        id: &'a str,
    ) -> BoxFuture<'a, Result<Group, OrchestratorError>> {
        Box::pin(async move {
            self.groups
                .read()
                .await
                .get(id)
                .cloned()
                .ok_or_else(|| not_found(EntityKind::Group, id))
        })
    }

    fn find_all(&self) -> BoxFuture<'_, Vec<Group>> {
        Box::pin(async move { self.groups.read().await.values().cloned().collect() })
    }

    fn find_by_account_id<'a>(&'a self, account_id: &'a str) -> BoxFuture<'a, Vec<Group>> {
        Box::pin(async move {
            self.groups
                .read()
                .await
                .values()
                .filter(|g| g.account_ids.iter().any(|id| id == account_id))
                .cloned()
                .collect()
        })
    }

    fn save(&self, group: Group) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            self.groups.write().await.insert(group.id.clone(), group);
        })
    }

    fn delete<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<(), OrchestratorError>> {
        Box::pin(async move {
            self.groups
                .write()
                .await
                .remove(id)
                .map(|_| ())
                .ok_or_else(|| not_found(EntityKind::Group, id))
        })
    }
}

#[cfg(test)]
#[path = "storage_tests.rs"]
mod tests;
