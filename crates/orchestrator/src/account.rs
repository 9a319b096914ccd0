// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Account/Cookie/Group data types (spec §3). Owned by the storage layer;
//! read-only once handed to a session.

use serde::{Deserialize, Serialize};

/// Credentials and metadata for one game identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub role_name: String,
    pub user_name: String,
    pub password: String,
    pub server_id: String,
    /// Sort key for presentation ordering.
    pub ranking: i64,
    #[serde(default)]
    pub cookies: Option<Vec<Cookie>>,
}

/// A single browser cookie, enough to restore an authenticated session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    pub http_only: bool,
    pub secure: bool,
    pub source_port: i32,
    pub source_scheme: String,
    pub priority: String,
}

/// Named set of account ids with a sort ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub ranking: i64,
    pub account_ids: Vec<String>,
}

impl Group {
    /// Resolve member accounts against a lookup function, silently dropping
    /// dangling ids (spec §3 invariant).
    pub fn resolve_accounts<'a, F>(&self, lookup: F) -> Vec<&'a Account>
    where
        F: Fn(&str) -> Option<&'a Account>,
    {
        self.account_ids.iter().filter_map(|id| lookup(id)).collect()
    }
}

#[cfg(test)]
#[path = "account_tests.rs"]
mod tests;
