//! Rule evaluation
//!
//! Decides whether an account may access a resource given the rules of a
//! namespace. Evaluation is a pure function of its inputs: no I/O, no
//! logging, no hidden state.
//!
//! # Algorithm
//!
//! ```text
//! rules → filter(type, name, endpoint) → stable sort(priority desc) → first applicable rule
//!                                                                         ↓
//!                                                            Granted / Forbidden (default)
//! ```

use crate::error::{AuthError, Result};
use crate::types::{eq_fold, Access, Account, Resource, Rule, Scope};

/// Verify an account has access to a resource using the rules provided
///
/// Returns [`AuthError::Forbidden`] when a denying rule applies first, when
/// the account was issued by a namespace other than `namespace` and a
/// namespace-scoped rule is reached, or when no rule applies at all.
pub fn verify_access(
    rules: &[Rule],
    account: Option<&Account>,
    resource: &Resource,
    namespace: &str,
) -> Result<()> {
    let valid_types = ["*", resource.resource_type.as_str()];
    let valid_names = ["*", resource.name.as_str()];
    let valid_endpoints = valid_endpoints(&resource.endpoint);

    let mut filtered: Vec<&Rule> = rules
        .iter()
        .filter(|rule| {
            includes(&valid_types, &rule.resource.resource_type)
                && includes(&valid_names, &rule.resource.name)
                && includes(&valid_endpoints, &rule.resource.endpoint)
        })
        .collect();

    // sort_by is stable, equal priorities keep their original order
    filtered.sort_by(|a, b| b.priority.cmp(&a.priority));

    for rule in filtered {
        if rule.scope == Scope::Public {
            return decide(rule.access);
        }

        let Some(account) = account else {
            continue;
        };

        if rule.scope != Scope::AnyNamespaceAccount && account.issuer != namespace {
            return Err(AuthError::Forbidden);
        }

        match &rule.scope {
            scope if scope.is_any_account() => return decide(rule.access),
            Scope::Named(name) if account.has_scope(name) => return decide(rule.access),
            _ => {}
        }
    }

    Err(AuthError::Forbidden)
}

/// Endpoints a rule may name to match `endpoint`
///
/// Besides the exact endpoint and `*`, every path prefix gets a wildcard so
/// that a rule on `/foo/*` covers `/foo/bar`.
pub fn valid_endpoints(endpoint: &str) -> Vec<String> {
    let mut valid = vec!["*".to_string(), endpoint.to_string()];

    let segments: Vec<&str> = endpoint.split('/').collect();
    if segments.len() > 1 {
        for i in 1..=segments.len() {
            valid.push(format!("{}/*", segments[..i].join("/")));
        }
    }

    valid
}

fn decide(access: Access) -> Result<()> {
    match access {
        Access::Granted => Ok(()),
        Access::Denied => Err(AuthError::Forbidden),
    }
}

fn includes<S: AsRef<str>>(valid: &[S], value: &str) -> bool {
    valid.iter().any(|v| eq_fold(v.as_ref(), value))
}
