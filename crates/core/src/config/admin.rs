//! Admin key loading.
//!
//! The key is read from ADMIN_PRIVATE_KEY and checked against ADMIN_ACCOUNT
//! when that is set. The key itself is never logged.

use alloy::primitives::Address;
use anyhow::{Context, Result};
use liquidator_chain::AdminSigner;

pub const ADMIN_PRIVATE_KEY: &str = "ADMIN_PRIVATE_KEY";
pub const ADMIN_ACCOUNT: &str = "ADMIN_ACCOUNT";

/// Admin signer from the environment; `None` when no key is configured.
pub fn admin_signer_from_env() -> Result<Option<AdminSigner>> {
    admin_signer_from(|name| std::env::var(name).ok())
}

/// Admin signer from an arbitrary variable lookup.
pub fn admin_signer_from(lookup: impl Fn(&str) -> Option<String>) -> Result<Option<AdminSigner>> {
    let Some(key) = lookup(ADMIN_PRIVATE_KEY).filter(|k| !k.trim().is_empty()) else {
        return Ok(None);
    };

    let expected = lookup(ADMIN_ACCOUNT)
        .filter(|a| !a.trim().is_empty())
        .map(|a| a.trim().parse::<Address>())
        .transpose()
        .with_context(|| format!("{ADMIN_ACCOUNT} is not a valid address"))?;

    let signer = AdminSigner::from_private_key(&key)
        .with_context(|| format!("{ADMIN_PRIVATE_KEY} is not a valid key"))?
        .with_expected_address(expected)?;

    Ok(Some(signer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const TEST_ACCOUNT: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_no_key_means_no_signer() {
        assert!(admin_signer_from(env(&[])).unwrap().is_none());
        assert!(admin_signer_from(env(&[(ADMIN_PRIVATE_KEY, " ")])).unwrap().is_none());
    }

    #[test]
    fn test_key_matching_account() {
        let signer = admin_signer_from(env(&[(ADMIN_PRIVATE_KEY, TEST_KEY), (ADMIN_ACCOUNT, TEST_ACCOUNT)]))
            .unwrap()
            .unwrap();
        assert_eq!(signer.address(), TEST_ACCOUNT.parse::<Address>().unwrap());
    }

    #[test]
    fn test_key_without_account() {
        let signer = admin_signer_from(env(&[(ADMIN_PRIVATE_KEY, TEST_KEY)])).unwrap();
        assert!(signer.is_some());
    }

    #[test]
    fn test_mismatched_account_rejected() {
        let other = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";
        let result = admin_signer_from(env(&[(ADMIN_PRIVATE_KEY, TEST_KEY), (ADMIN_ACCOUNT, other)]));
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_key_error_hides_key() {
        let err = admin_signer_from(env(&[(ADMIN_PRIVATE_KEY, "0xnothex")])).unwrap_err();
        assert!(!format!("{err:#}").contains("nothex"));
    }
}
