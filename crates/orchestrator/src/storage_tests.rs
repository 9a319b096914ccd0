// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn account(id: &str) -> Account {
    Account {
        id: id.into(),
        role_name: "scout".into(),
        user_name: "u".into(),
        password: "p".into(),
        server_id: "s1".into(),
        ranking: 0,
        cookies: None,
    }
}

#[tokio::test]
async fn save_then_find_round_trips() {
    let repo = InMemoryAccountRepository::new();
    repo.save(account("a1")).await;
    let found = repo.find_by_id("a1").await.unwrap_or_else(|_| account("missing"));
    assert_eq!(found.id, "a1");
}

#[tokio::test]
async fn find_missing_account_is_not_found() {
    let repo = InMemoryAccountRepository::new();
    let err = repo.find_by_id("ghost").await.unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");
}

#[tokio::test]
async fn update_cookies_mutates_stored_account() {
    let repo = InMemoryAccountRepository::new();
    repo.save(account("a1")).await;
    let cookie = Cookie {
        name: "sid".into(),
        value: "v".into(),
        domain: "d".into(),
        path: "/".into(),
        http_only: true,
        secure: true,
        source_port: 443,
        source_scheme: "https".into(),
        priority: "medium".into(),
    };
    repo.update_cookies("a1", vec![cookie.clone()]).await.unwrap_or(());
    let found = repo.find_by_id("a1").await.unwrap_or_else(|_| account("missing"));
    assert_eq!(found.cookies, Some(vec![cookie]));
}

#[tokio::test]
async fn delete_missing_account_errors() {
    let repo = InMemoryAccountRepository::new();
    assert!(repo.delete("ghost").await.is_err());
}

#[tokio::test]
async fn group_find_by_account_id_matches_members() {
    let repo = InMemoryGroupRepository::new();
    repo.save(Group { id: "g1".into(), name: "Scouts".into(), ranking: 0, account_ids: vec!["a1".into()] })
        .await;
    let groups = repo.find_by_account_id("a1").await;
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].id, "g1");
    assert!(repo.find_by_account_id("a2").await.is_empty());
}
