//! Namespace access checks
//!
//! Decides whether an account may act inside a namespace at all, before any
//! rule is consulted. Accounts are confined to the namespace that issued
//! them; admins and services of the default namespace may enter any.

use crate::error::{AuthError, Result};
use crate::types::Account;

/// Namespace the server itself runs in
pub const DEFAULT_NAMESPACE: &str = "micro";

/// Check an account may access `namespace`
///
/// `public_namespace` names a namespace open to everyone, including callers
/// without an account.
///
/// # Errors
///
/// * `Unauthorized` - no account was given for a non-public namespace
/// * `Forbidden` - the account belongs to another namespace, or is neither a
///   user nor a service
pub fn authorize(
    account: Option<&Account>,
    namespace: &str,
    public_namespace: Option<&str>,
) -> Result<()> {
    if public_namespace == Some(namespace) {
        return Ok(());
    }

    let Some(account) = account else {
        return Err(AuthError::Unauthorized);
    };

    if account.issuer == DEFAULT_NAMESPACE && is_admin(account) {
        return Ok(());
    }

    if account.issuer != namespace {
        return Err(AuthError::Forbidden);
    }
    if account.account_type != "user" && account.account_type != "service" {
        return Err(AuthError::Forbidden);
    }

    Ok(())
}

/// Check an account may administer `namespace`
///
/// On top of [`authorize`], the account must be a user holding the `admin`
/// scope or a service holding the `service` scope.
pub fn authorize_admin(account: Option<&Account>, namespace: &str) -> Result<()> {
    authorize(account, namespace, None)?;

    match account {
        Some(account) if is_admin(account) => Ok(()),
        _ => Err(AuthError::Unauthorized),
    }
}

fn is_admin(account: &Account) -> bool {
    has_type_and_scope(account, "user", "admin") || has_type_and_scope(account, "service", "service")
}

fn has_type_and_scope(account: &Account, account_type: &str, scope: &str) -> bool {
    account.account_type == account_type && account.scopes.iter().any(|s| s == scope)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(account_type: &str, issuer: &str, scopes: &[&str]) -> Account {
        scopes.iter().fold(
            Account::new("1").with_type(account_type).with_issuer(issuer),
            |acc, s| acc.with_scope(*s),
        )
    }

    fn micro_admin() -> Account {
        account("user", "micro", &["admin"])
    }
    fn micro_user() -> Account {
        account("user", "micro", &[])
    }
    fn foo_admin() -> Account {
        account("user", "foo", &["admin"])
    }
    fn foo_user() -> Account {
        account("user", "foo", &[])
    }
    fn micro_service() -> Account {
        account("service", "micro", &["service"])
    }
    fn foo_service() -> Account {
        account("service", "foo", &["service"])
    }

    fn check(name: &str, result: Result<()>, expected: &str) {
        match (result, expected) {
            (Ok(()), "") => {}
            (Err(err), want) if !want.is_empty() && err.to_string().contains(want) => {}
            (got, want) => panic!("case '{}': expected '{}', got {:?}", name, want, got),
        }
    }

    #[test]
    fn test_authorize_table() {
        let cases = [
            ("micro admin accessing micro", micro_admin(), "micro", ""),
            ("micro admin accessing foo", micro_admin(), "foo", ""),
            ("micro user accessing micro", micro_user(), "micro", ""),
            ("micro user accessing foo", micro_user(), "foo", "forbidden"),
            ("foo admin accessing micro", foo_admin(), "micro", "forbidden"),
            ("foo admin accessing foo", foo_admin(), "foo", ""),
            ("foo user accessing micro", foo_user(), "micro", "forbidden"),
            ("foo user accessing foo", foo_user(), "foo", ""),
            ("micro service accessing micro", micro_service(), "micro", ""),
            ("micro service accessing foo", micro_service(), "foo", ""),
            ("foo service accessing micro", foo_service(), "micro", "forbidden"),
            ("foo service accessing foo", foo_service(), "foo", ""),
        ];

        for (name, acc, ns, expected) in cases {
            check(name, authorize(Some(&acc), ns, None), expected);
        }
    }

    #[test]
    fn test_authorize_admin_table() {
        let cases = [
            ("micro admin accessing micro", micro_admin(), "micro", ""),
            ("micro admin accessing foo", micro_admin(), "foo", ""),
            ("micro user accessing micro", micro_user(), "micro", "unauthorized"),
            ("micro user accessing foo", micro_user(), "foo", "forbidden"),
            ("foo admin accessing micro", foo_admin(), "micro", "forbidden"),
            ("foo admin accessing foo", foo_admin(), "foo", ""),
            ("foo user accessing micro", foo_user(), "micro", "forbidden"),
            ("foo user accessing foo", foo_user(), "foo", "unauthorized"),
            ("micro service accessing micro", micro_service(), "micro", ""),
            ("micro service accessing foo", micro_service(), "foo", ""),
            ("foo service accessing micro", foo_service(), "micro", "forbidden"),
            ("foo service accessing foo", foo_service(), "foo", ""),
        ];

        for (name, acc, ns, expected) in cases {
            check(name, authorize_admin(Some(&acc), ns), expected);
        }
    }

    #[test]
    fn test_public_namespace_and_missing_account() {
        authorize(None, "docs", Some("docs")).unwrap();
        authorize(Some(&foo_user()), "docs", Some("docs")).unwrap();

        assert!(authorize(None, "foo", Some("docs")).unwrap_err().is_unauthorized());
        assert!(authorize(None, "foo", None).unwrap_err().is_unauthorized());
        assert!(authorize_admin(None, "foo").unwrap_err().is_unauthorized());

        // an empty namespace is only public when named so
        assert!(authorize(None, "", None).unwrap_err().is_unauthorized());
        authorize(None, "", Some("")).unwrap();
    }

    #[test]
    fn test_other_account_types_are_confined() {
        let bot = account("bot", "foo", &["admin"]);
        assert!(authorize(Some(&bot), "foo", None).unwrap_err().is_forbidden());

        let micro_bot = account("bot", "micro", &["service"]);
        assert!(authorize(Some(&micro_bot), "foo", None).unwrap_err().is_forbidden());
    }

    #[test]
    fn test_has_type_and_scope() {
        let acc = account("", "foobar", &["developer", "admin", "analyst"]);
        assert!(has_type_and_scope(&acc, "", "admin"));
        assert!(has_type_and_scope(&account("", "foobar", &["admin"]), "", "admin"));
        assert!(!has_type_and_scope(&account("", "foobar", &[]), "", "admin"));
        assert!(!has_type_and_scope(&account("", "foobar", &["admin", "analyst"]), "", "developer"));
        assert!(!has_type_and_scope(&acc, "user", "admin"));
    }
}
