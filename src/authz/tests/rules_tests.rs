//! Rule evaluation tests
//!
//! Concrete access scenarios plus property tests over generated rule sets.

use keel_authz::{verify_access, Account, Resource, Rule, Scope};
use proptest::prelude::*;

fn account(issuer: &str) -> Account {
    Account::new("alice").with_issuer(issuer).with_scope("admin")
}

// ============================================================================
// SCENARIOS
// ============================================================================

#[test]
fn test_public_endpoint_with_private_fallback() {
    let rules = vec![
        Rule::new("public-list", Scope::Public, Resource::new("service", "store", "Store.List")),
        Rule::new("admins", "admin", Resource::new("service", "store", "*")).with_priority(1),
    ];

    let list = Resource::new("service", "store", "Store.List");
    let write = Resource::new("service", "store", "Store.Write");

    // anonymous callers may list
    verify_access(&rules, None, &list, "micro").unwrap();

    // but not write
    let err = verify_access(&rules, None, &write, "micro").unwrap_err();
    assert!(err.is_forbidden());

    // admins may write
    verify_access(&rules, Some(&account("micro")), &write, "micro").unwrap();

    // accounts without the scope may not
    let guest = Account::new("bob").with_issuer("micro").with_scope("guest");
    assert!(verify_access(&rules, Some(&guest), &write, "micro")
        .unwrap_err()
        .is_forbidden());
}

#[test]
fn test_denied_rule_overrides_lower_priority_grant() {
    let rules = vec![
        Rule::new("everyone", Scope::Account, Resource::catch_all()),
        Rule::new("no-billing", Scope::Account, Resource::new("service", "billing", "*"))
            .denied()
            .with_priority(10),
    ];

    let alice = account("micro");
    verify_access(&rules, Some(&alice), &Resource::new("service", "notes", "Notes.Read"), "micro")
        .unwrap();
    assert!(verify_access(
        &rules,
        Some(&alice),
        &Resource::new("service", "billing", "Billing.Charge"),
        "micro"
    )
    .unwrap_err()
    .is_forbidden());
}

#[test]
fn test_cross_namespace_access() {
    let rules = vec![
        Rule::new("cross", Scope::ANY_NAMESPACE_ACCOUNT, Resource::new("service", "status", "*")),
        Rule::new("local", Scope::Account, Resource::catch_all()),
    ];

    let foreign = account("other");
    let status = Resource::new("service", "status", "Status.Get");
    let notes = Resource::new("service", "notes", "Notes.Read");

    verify_access(&rules, Some(&foreign), &status, "micro").unwrap();
    assert!(verify_access(&rules, Some(&foreign), &notes, "micro")
        .unwrap_err()
        .is_forbidden());
}

#[test]
fn test_web_path_prefix_rules() {
    let rules = vec![Rule::new(
        "web",
        Scope::Public,
        Resource::new("web", "site", "/static/*"),
    )];

    verify_access(&rules, None, &Resource::new("web", "site", "/static/css/app.css"), "micro")
        .unwrap();
    assert!(verify_access(&rules, None, &Resource::new("web", "site", "/api/v1"), "micro")
        .unwrap_err()
        .is_forbidden());
}

// ============================================================================
// PROPERTIES
// ============================================================================

fn resource_strategy() -> impl Strategy<Value = Resource> {
    ("[a-z]{1,8}", "[a-z]{1,8}", "(/[a-z]{1,5}){1,3}|[A-Z][a-z]{1,6}\\.[A-Z][a-z]{1,6}")
        .prop_map(|(t, n, e)| Resource::new(t, n, e))
}

fn account_strategy() -> impl Strategy<Value = Option<Account>> {
    prop::option::of(
        ("[a-z]{1,8}", "[a-z]{1,8}", prop::collection::vec("[a-z]{1,6}", 0..3)).prop_map(
            |(id, issuer, scopes)| {
                scopes
                    .into_iter()
                    .fold(Account::new(id).with_issuer(issuer), |acc, s| acc.with_scope(s))
            },
        ),
    )
}

proptest! {
    #[test]
    fn prop_no_rules_denies_everything(
        resource in resource_strategy(),
        account in account_strategy(),
        namespace in "[a-z]{1,8}",
    ) {
        let err = verify_access(&[], account.as_ref(), &resource, &namespace).unwrap_err();
        prop_assert!(err.is_forbidden());
    }

    #[test]
    fn prop_public_grant_admits_any_caller(
        resource in resource_strategy(),
        account in account_strategy(),
        namespace in "[a-z]{1,8}",
        wildcard_name in any::<bool>(),
        wildcard_endpoint in any::<bool>(),
    ) {
        let pattern = Resource::new(
            resource.resource_type.clone(),
            if wildcard_name { "*".to_string() } else { resource.name.clone() },
            if wildcard_endpoint { "*".to_string() } else { resource.endpoint.clone() },
        );
        let rules = vec![Rule::new("public", Scope::Public, pattern)];

        prop_assert!(verify_access(&rules, account.as_ref(), &resource, &namespace).is_ok());
    }

    #[test]
    fn prop_higher_priority_wins_regardless_of_order(
        resource in resource_strategy(),
        low in -100i32..100,
        gap in 1i32..100,
        grant_first in any::<bool>(),
        reversed in any::<bool>(),
    ) {
        let high = low + gap;
        let (grant_priority, deny_priority) = if grant_first { (high, low) } else { (low, high) };

        let mut rules = vec![
            Rule::new("grant", Scope::Account, Resource::catch_all()).with_priority(grant_priority),
            Rule::new("deny", Scope::Account, Resource::catch_all()).denied().with_priority(deny_priority),
        ];
        if reversed {
            rules.reverse();
        }

        let alice = account("micro");
        let result = verify_access(&rules, Some(&alice), &resource, "micro");
        prop_assert_eq!(result.is_ok(), grant_first);
    }

    #[test]
    fn prop_foreign_issuer_is_forbidden(
        resource in resource_strategy(),
        issuer in "[a-z]{1,8}",
    ) {
        prop_assume!(issuer != "micro");
        let rules = vec![Rule::new("everyone", Scope::Account, Resource::catch_all())];

        let err = verify_access(&rules, Some(&account(&issuer)), &resource, "micro").unwrap_err();
        prop_assert!(err.is_forbidden());
    }
}
