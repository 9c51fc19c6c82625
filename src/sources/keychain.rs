//! Profiles for secrets kept in the macOS keychain.
//!
//! One `custom/<account>` profile per generic-password entry of the
//! configured service. The keyboard chord that injects the secret is added
//! later by the augmentation pass, from the profile's origin.

use super::ProfileGenerator;
use regex::Regex;
use std::process::Command;
use std::sync::LazyLock;
use termprof_config::{Profile, ProfileOrigin};

/// Matches `"acct"<blob>="value"` / `"svce"<blob>="value"` attribute lines.
static ATTRIBUTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*"(acct|svce)"<blob>="(.*)"\s*$"#)
        .expect("keychain attribute regex is valid")
});

/// Accounts of the generic-password items of `service`, in listing order.
pub fn parse_dump_keychain(output: &str, service: &str) -> Vec<String> {
    let mut accounts = Vec::new();
    let mut is_generic = false;
    let mut account: Option<String> = None;
    let mut item_service: Option<String> = None;

    let mut finish = |is_generic: bool, account: Option<String>, item_service: Option<String>| {
        if let (true, Some(account), Some(item_service)) = (is_generic, account, item_service)
            && item_service == service
            && !accounts.contains(&account)
        {
            accounts.push(account);
        }
    };

    for line in output.lines() {
        if line.starts_with("keychain:") {
            finish(is_generic, account.take(), item_service.take());
            is_generic = false;
            continue;
        }
        if let Some(class) = line.strip_prefix("class:") {
            is_generic = class.trim() == "\"genp\"";
            continue;
        }
        if let Some(caps) = ATTRIBUTE_RE.captures(line) {
            let value = caps[2].to_string();
            match &caps[1] {
                "acct" => account = Some(value),
                _ => item_service = Some(value),
            }
        }
    }
    finish(is_generic, account, item_service);

    accounts
}

pub struct SecretStoreSource {
    service: String,
    accounts: Option<Vec<String>>,
}

impl SecretStoreSource {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            accounts: None,
        }
    }

    /// Use a fixed account list instead of querying the keychain.
    pub fn with_accounts(service: impl Into<String>, accounts: Vec<String>) -> Self {
        Self {
            service: service.into(),
            accounts: Some(accounts),
        }
    }

    fn list_accounts(&self) -> Vec<String> {
        if let Some(ref accounts) = self.accounts {
            return accounts.clone();
        }

        match Command::new("/usr/bin/security").arg("dump-keychain").output() {
            Ok(output) if output.status.success() => {
                parse_dump_keychain(&String::from_utf8_lossy(&output.stdout), &self.service)
            }
            Ok(output) => {
                log::warn!(
                    "Cannot list keychain accounts for service '{}': {}",
                    self.service,
                    String::from_utf8_lossy(&output.stderr).trim()
                );
                Vec::new()
            }
            Err(e) => {
                crate::debug_log!("KEYCHAIN", "Keychain not available: {}", e);
                Vec::new()
            }
        }
    }
}

impl ProfileGenerator for SecretStoreSource {
    fn label(&self) -> &'static str {
        "secret-store"
    }

    fn generate(&self) -> Vec<Profile> {
        self.list_accounts()
            .into_iter()
            .map(|account| {
                Profile::new(format!("custom/{account}")).origin(ProfileOrigin::SecretStore {
                    service: self.service.clone(),
                    account,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUMP: &str = r#"keychain: "/Users/alice/Library/Keychains/login.keychain-db"
version: 512
class: "genp"
attributes:
    0x00000007 <blob>="termprof"
    "acct"<blob>="github-token"
    "svce"<blob>="termprof"
keychain: "/Users/alice/Library/Keychains/login.keychain-db"
version: 512
class: "inet"
attributes:
    "acct"<blob>="web-login"
    "svce"<blob>="termprof"
keychain: "/Users/alice/Library/Keychains/login.keychain-db"
version: 512
class: "genp"
attributes:
    "acct"<blob>="other"
    "svce"<blob>="someone-else"
keychain: "/Users/alice/Library/Keychains/login.keychain-db"
version: 512
class: "genp"
attributes:
    "acct"<blob>="vault"
    "svce"<blob>="termprof"
"#;

    #[test]
    fn test_parse_dump_keychain_filters_by_service_and_class() {
        assert_eq!(
            parse_dump_keychain(DUMP, "termprof"),
            vec!["github-token", "vault"]
        );
        assert!(parse_dump_keychain(DUMP, "missing").is_empty());
    }

    #[test]
    fn test_profiles_carry_secret_origin() {
        let source = SecretStoreSource::with_accounts("termprof", vec!["vault".to_string()]);
        let profiles = source.generate();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].name, "custom/vault");
        assert_eq!(
            profiles[0].origin,
            ProfileOrigin::SecretStore {
                service: "termprof".to_string(),
                account: "vault".to_string()
            }
        );
    }
}
