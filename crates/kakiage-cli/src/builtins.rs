/*
 * builtins.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Functions available to `put` on the command line.
//!
//! - `inet_resolve(host)`: first IPv4 address of `host`, looked up once per run
//! - `inet_checkip`: this machine's public IP address, fetched once per run
//! - `env(name)`: an environment variable

use kakiage::MacroEvaluator;
use reqwest::blocking::Client;
use std::cell::{OnceCell, RefCell};
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr, ToSocketAddrs};
use std::time::Duration;

/// Service answering a plain GET with the caller's address.
pub const CHECKIP_URL: &str = "https://checkip.amazonaws.com/";

const CHECKIP_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = concat!("kakiage/", env!("CARGO_PKG_VERSION"));

type Resolve = fn(&str) -> Option<String>;
type CheckIp = fn() -> Option<String>;

/// Evaluator for the built-in functions.
#[derive(Debug)]
pub struct Builtins {
    resolve: Resolve,
    resolved: RefCell<HashMap<String, Option<String>>>,
    checkip: CheckIp,
    checked: OnceCell<Option<String>>,
}

impl Default for Builtins {
    fn default() -> Self {
        Self::new()
    }
}

impl Builtins {
    pub fn new() -> Self {
        Self::with_resolver(resolve_ipv4)
    }

    /// Use `resolve` instead of the system resolver.
    pub fn with_resolver(resolve: Resolve) -> Self {
        Self {
            resolve,
            resolved: RefCell::new(HashMap::new()),
            checkip: fetch_public_ip,
            checked: OnceCell::new(),
        }
    }

    /// Use `checkip` instead of asking [`CHECKIP_URL`].
    pub fn with_checkip(mut self, checkip: CheckIp) -> Self {
        self.checkip = checkip;
        self
    }

    fn inet_resolve(&self, host: &str) -> Option<String> {
        if let Some(cached) = self.resolved.borrow().get(host) {
            return cached.clone();
        }
        let address = (self.resolve)(host);
        self.resolved
            .borrow_mut()
            .insert(host.to_string(), address.clone());
        address
    }

    fn inet_checkip(&self) -> Option<String> {
        self.checked.get_or_init(self.checkip).clone()
    }
}

impl MacroEvaluator for Builtins {
    fn evaluate(&self, name: &str, args: &[String]) -> Option<String> {
        match (name, args) {
            ("inet_resolve", [host]) => self.inet_resolve(host.trim()),
            ("inet_checkip", _) => self.inet_checkip(),
            ("env", [var]) => std::env::var(var.trim()).ok(),
            _ => None,
        }
    }
}

/// First IPv4 address the system resolver returns for `host`.
pub fn resolve_ipv4(host: &str) -> Option<String> {
    let addresses = match (host, 0).to_socket_addrs() {
        Ok(addresses) => addresses,
        Err(err) => {
            tracing::debug!(host, error = %err, "name resolution failed");
            return None;
        }
    };
    addresses
        .filter_map(|address| match address {
            SocketAddr::V4(v4) => Some(v4.ip().to_string()),
            SocketAddr::V6(_) => None,
        })
        .next()
}

/// Public address of this machine as reported by [`CHECKIP_URL`].
pub fn fetch_public_ip() -> Option<String> {
    let body = Client::builder()
        .user_agent(USER_AGENT)
        .timeout(CHECKIP_TIMEOUT)
        .build()
        .and_then(|client| client.get(CHECKIP_URL).send())
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.text());
    match body {
        Ok(body) => {
            let address = body.trim();
            match address.parse::<IpAddr>() {
                Ok(ip) => Some(ip.to_string()),
                Err(_) => {
                    tracing::debug!(body = address, "checkip answer is not an address");
                    None
                }
            }
        }
        Err(err) => {
            tracing::debug!(url = CHECKIP_URL, error = %err, "checkip request failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static LOOKUPS: AtomicUsize = AtomicUsize::new(0);
    static CHECKS: AtomicUsize = AtomicUsize::new(0);

    fn counting_checkip() -> Option<String> {
        CHECKS.fetch_add(1, Ordering::SeqCst);
        Some("14.3.142.77".to_string())
    }

    fn counting_resolver(host: &str) -> Option<String> {
        LOOKUPS.fetch_add(1, Ordering::SeqCst);
        (host == "a.root-servers.net").then(|| "198.41.0.4".to_string())
    }

    #[test]
    fn test_inet_resolve_is_cached() {
        let builtins = Builtins::with_resolver(counting_resolver);
        let args = vec!["a.root-servers.net".to_string()];
        let before = LOOKUPS.load(Ordering::SeqCst);

        assert_eq!(
            builtins.evaluate("inet_resolve", &args).as_deref(),
            Some("198.41.0.4")
        );
        assert_eq!(
            builtins.evaluate("inet_resolve", &args).as_deref(),
            Some("198.41.0.4")
        );
        assert_eq!(LOOKUPS.load(Ordering::SeqCst) - before, 1);
    }

    #[test]
    fn test_failed_resolution_is_cached_too() {
        let builtins = Builtins::with_resolver(|_| None);
        let args = vec!["nowhere.invalid".to_string()];
        assert!(builtins.evaluate("inet_resolve", &args).is_none());
        assert_eq!(builtins.resolved.borrow().len(), 1);
    }

    #[test]
    fn test_inet_resolve_needs_one_argument() {
        let builtins = Builtins::with_resolver(|_| Some("127.0.0.1".to_string()));
        assert!(builtins.evaluate("inet_resolve", &[]).is_none());
        assert!(
            builtins
                .evaluate("inet_resolve", &["a".to_string(), "b".to_string()])
                .is_none()
        );
    }

    #[test]
    fn test_inet_checkip_is_cached() {
        let builtins = Builtins::new().with_checkip(counting_checkip);
        let before = CHECKS.load(Ordering::SeqCst);

        assert_eq!(
            builtins.evaluate("inet_checkip", &[]).as_deref(),
            Some("14.3.142.77")
        );
        // arguments are ignored
        assert_eq!(
            builtins
                .evaluate("inet_checkip", &["x".to_string()])
                .as_deref(),
            Some("14.3.142.77")
        );
        assert_eq!(CHECKS.load(Ordering::SeqCst) - before, 1);
    }

    #[test]
    fn test_failed_checkip_yields_nothing() {
        let builtins = Builtins::new().with_checkip(|| None);
        assert!(builtins.evaluate("inet_checkip", &[]).is_none());
        assert!(builtins.evaluate("inet_checkip", &[]).is_none());
    }

    #[test]
    fn test_env() {
        let builtins = Builtins::new();
        let path = std::env::var("PATH").ok();
        assert_eq!(builtins.evaluate("env", &["PATH".to_string()]), path);
        assert!(
            builtins
                .evaluate("env", &["KAKIAGE_SURELY_UNSET_VARIABLE".to_string()])
                .is_none()
        );
    }

    #[test]
    fn test_unknown_function() {
        assert!(Builtins::new().evaluate("inet_whois", &[]).is_none());
    }

    #[test]
    fn test_resolve_localhost() {
        assert_eq!(resolve_ipv4("127.0.0.1").as_deref(), Some("127.0.0.1"));
    }
}
