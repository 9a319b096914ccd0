// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn account(id: &str) -> Account {
    Account {
        id: id.into(),
        role_name: "warrior".into(),
        user_name: "u".into(),
        password: "p".into(),
        server_id: "7".into(),
        ranking: 0,
        cookies: None,
    }
}

#[test]
fn resolve_accounts_silently_drops_dangling_ids() {
    let accounts = vec![account("a"), account("b")];
    let group = Group {
        id: "g1".into(),
        name: "farm".into(),
        ranking: 0,
        account_ids: vec!["a".into(), "missing".into(), "b".into()],
    };

    let resolved = group.resolve_accounts(|id| accounts.iter().find(|a| a.id == id));
    let ids: Vec<&str> = resolved.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
}
