//! Page gatekeeper - content-side blocking.
//!
//! Runs inside a page. When the current host matches the blocklist the page
//! is stopped, its document replaced by the block page and further
//! navigation locked. Network rules normally catch the navigation first;
//! this covers pages that were already open and in-app route changes that
//! never hit the network.
//!
//! ## Triggers
//!
//! One check on load, then one per route change from the navigation
//! subscription. Without a subscription a bounded poll runs instead. Both
//! stop once the page is blocked or the time budget is spent.

use std::time::Duration;

use chrono::Local;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::Instant;
use url::Url;

use crate::blocking::{block_page, Blocklist};
use crate::storage::GatekeeperConfig;

/// How a blocked domain is compared with the page host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Exact domain or any subdomain of it.
    #[default]
    Suffix,
    /// Legacy two-way substring test on host and URL. Over-matches:
    /// `notyoutube.com` matches `youtube.com`.
    Substring,
}

fn split_domain(domain: &str) -> (&str, Option<&str>) {
    match domain.split_once('/') {
        Some((host, path)) if !path.is_empty() => (host, Some(path)),
        Some((host, _)) => (host, None),
        None => (domain, None),
    }
}

/// Whole-segment prefix test: `r/rust` covers `/r/rust` and `/r/rust/top`
/// but not `/r/rustacean`.
fn path_covers(blocked: &str, page_path: &str) -> bool {
    let blocked = blocked.trim_matches('/');
    if blocked.is_empty() {
        return true;
    }
    let page = page_path.to_lowercase();
    let page = page.trim_start_matches('/');
    match page.strip_prefix(blocked) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Does blocked `domain` cover the page at `url`?
pub fn matches(domain: &str, url: &Url, mode: MatchMode) -> bool {
    let host = url
        .host_str()
        .unwrap_or_default()
        .trim_end_matches('.')
        .to_lowercase();
    if host.is_empty() {
        return false;
    }
    let domain = domain.to_lowercase();

    match mode {
        MatchMode::Suffix => {
            let (blocked_host, blocked_path) = split_domain(&domain);
            let host_ok = host == blocked_host
                || host
                    .strip_suffix(blocked_host)
                    .is_some_and(|prefix| prefix.ends_with('.'));
            let path_ok = blocked_path.map_or(true, |path| path_covers(path, url.path()));
            host_ok && path_ok
        }
        MatchMode::Substring => {
            let full = url.as_str().to_lowercase();
            host.contains(&domain)
                || host == format!("www.{domain}")
                || full.contains(&domain)
                || domain.contains(&host)
        }
    }
}

/// First blocked domain covering `url`, if blocking is active.
pub fn find_match<'a>(blocklist: &'a Blocklist, url: &Url, mode: MatchMode) -> Option<&'a str> {
    if !blocklist.is_active() {
        return None;
    }
    blocklist.domains().find(|domain| matches(domain, url, mode))
}

/// The document the gatekeeper runs in.
pub trait PageHost {
    fn current_url(&self) -> String;
    fn stop_loading(&mut self);
    fn replace_document(&mut self, html: String);
    /// Refuse any further navigation away from the block page.
    fn lock_navigation(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allowed,
    Blocked { host: String, domain: String },
}

impl Verdict {
    pub fn is_blocked(&self) -> bool {
        matches!(self, Verdict::Blocked { .. })
    }
}

/// Per-page gatekeeper. Blocking is one-way: once a page is blocked every
/// later check returns the same verdict without touching the page.
#[derive(Debug)]
pub struct Gatekeeper {
    mode: MatchMode,
    blocked: Option<Verdict>,
}

impl Gatekeeper {
    pub fn new(mode: MatchMode) -> Self {
        Self {
            mode,
            blocked: None,
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked.is_some()
    }

    /// Check the page's current location once against `blocklist`.
    pub fn check(&mut self, page: &mut impl PageHost, blocklist: &Blocklist) -> Verdict {
        let raw = page.current_url();
        self.check_url(page, &raw, blocklist)
    }

    /// Check `raw` as the page's location. Route-change events carry the new
    /// location before the host may report it.
    pub fn check_url(&mut self, page: &mut impl PageHost, raw: &str, blocklist: &Blocklist) -> Verdict {
        if let Some(verdict) = &self.blocked {
            return verdict.clone();
        }

        let url = match Url::parse(raw) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!(url = %raw, error = %e, "unparseable page url, allowing");
                return Verdict::Allowed;
            }
        };

        let Some(domain) = find_match(blocklist, &url, self.mode) else {
            return Verdict::Allowed;
        };

        let host = url.host_str().unwrap_or_default().to_string();
        tracing::info!(%host, domain, "blocking page");
        page.stop_loading();
        page.lock_navigation();
        page.replace_document(block_page::render(&host, Some(Local::now())));

        let verdict = Verdict::Blocked {
            host,
            domain: domain.to_string(),
        };
        self.blocked = Some(verdict.clone());
        verdict
    }

    /// Check on load, then on every route change until the page is blocked
    /// or `cfg.budget_ms` elapses. `load_blocklist` is called before every
    /// check so a toggle made meanwhile is honoured.
    ///
    /// With `routes = None` the page is polled every `cfg.poll_interval_ms`.
    pub async fn watch<P, F>(
        &mut self,
        page: &mut P,
        routes: Option<&mut mpsc::Receiver<String>>,
        mut load_blocklist: F,
        cfg: &GatekeeperConfig,
    ) -> Verdict
    where
        P: PageHost,
        F: FnMut() -> Blocklist,
    {
        let verdict = self.check(page, &load_blocklist());
        if verdict.is_blocked() {
            return verdict;
        }

        let deadline = Instant::now() + Duration::from_millis(cfg.budget_ms);
        match routes {
            Some(rx) => {
                while let Ok(Some(route)) = tokio::time::timeout_at(deadline, rx.recv()).await {
                    tracing::trace!(%route, "route changed");
                    let verdict = self.check_url(page, &route, &load_blocklist());
                    if verdict.is_blocked() {
                        return verdict;
                    }
                }
            }
            None => {
                let period = Duration::from_millis(cfg.poll_interval_ms.max(1));
                let mut poll = tokio::time::interval_at(Instant::now() + period, period);
                while Instant::now() < deadline {
                    tokio::select! {
                        _ = poll.tick() => {}
                        () = tokio::time::sleep_until(deadline) => break,
                    }
                    let verdict = self.check(page, &load_blocklist());
                    if verdict.is_blocked() {
                        return verdict;
                    }
                }
            }
        }
        tracing::debug!("gatekeeper budget spent, page allowed");
        Verdict::Allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakePage {
        url: String,
        document: Option<String>,
        stopped: bool,
        locked: bool,
        replaced: usize,
    }

    impl FakePage {
        fn at(url: &str) -> Self {
            Self {
                url: url.to_string(),
                ..Self::default()
            }
        }
    }

    impl PageHost for FakePage {
        fn current_url(&self) -> String {
            self.url.clone()
        }
        fn stop_loading(&mut self) {
            self.stopped = true;
        }
        fn replace_document(&mut self, html: String) {
            self.document = Some(html);
            self.replaced += 1;
        }
        fn lock_navigation(&mut self) {
            self.locked = true;
        }
    }

    fn blocking(domains: &[&str]) -> Blocklist {
        let mut list = Blocklist::default();
        for d in domains {
            list.add(d).unwrap();
        }
        list.set_enabled(true);
        list
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn suffix_mode_matches_domain_and_subdomains() {
        let m = MatchMode::Suffix;
        assert!(matches("youtube.com", &url("https://youtube.com/"), m));
        assert!(matches("youtube.com", &url("https://www.youtube.com/watch?v=1"), m));
        assert!(matches("youtube.com", &url("https://m.YouTube.com"), m));
        assert!(!matches("youtube.com", &url("https://notyoutube.com/"), m));
        assert!(!matches("youtube.com", &url("https://example.com/?q=youtube.com"), m));
    }

    #[test]
    fn suffix_mode_honours_path_entries() {
        let m = MatchMode::Suffix;
        assert!(matches("reddit.com/r/rust", &url("https://www.reddit.com/r/rust/top"), m));
        assert!(!matches("reddit.com/r/rust", &url("https://www.reddit.com/r/golang"), m));
        assert!(matches("reddit.com/r/rust", &url("https://www.reddit.com/r/rust"), m));
        assert!(matches("reddit.com/r/rust", &url("https://www.reddit.com/r/rust/"), m));
        assert!(matches("reddit.com/r/rust/", &url("https://reddit.com/r/rust/top"), m));
        assert!(!matches("reddit.com/r/rust", &url("https://www.reddit.com/r/rustacean"), m));
        assert!(!matches("reddit.com/r/rust/", &url("https://www.reddit.com/r/rust-gamedev"), m));
    }

    #[test]
    fn substring_mode_keeps_legacy_over_matching() {
        let m = MatchMode::Substring;
        assert!(matches("youtube.com", &url("https://www.youtube.com/"), m));
        assert!(matches("youtube.com", &url("https://notyoutube.com/"), m));
        assert!(matches("youtube.com", &url("https://example.com/?q=youtube.com"), m));
        assert!(!matches("youtube.com", &url("file:///tmp/x.html"), m));
    }

    #[test]
    fn www_host_is_blocked_and_page_replaced() {
        let mut page = FakePage::at("https://www.youtube.com/feed");
        let mut gk = Gatekeeper::new(MatchMode::Suffix);
        let verdict = gk.check(&mut page, &blocking(&["youtube.com"]));
        assert_eq!(
            verdict,
            Verdict::Blocked {
                host: "www.youtube.com".into(),
                domain: "youtube.com".into()
            }
        );
        assert!(page.stopped && page.locked);
        assert!(page.document.unwrap().contains("www.youtube.com"));
    }

    #[test]
    fn disabled_blocklist_allows_everything() {
        let mut page = FakePage::at("https://www.youtube.com/");
        let mut list = blocking(&["youtube.com"]);
        list.set_enabled(false);
        let mut gk = Gatekeeper::new(MatchMode::Suffix);
        assert_eq!(gk.check(&mut page, &list), Verdict::Allowed);
        assert!(page.document.is_none());
    }

    #[test]
    fn blocked_page_is_not_touched_again() {
        let mut page = FakePage::at("https://tiktok.com/");
        let list = blocking(&["tiktok.com"]);
        let mut gk = Gatekeeper::new(MatchMode::Suffix);
        gk.check(&mut page, &list);
        gk.check(&mut page, &list);
        assert_eq!(page.replaced, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn route_change_triggers_block() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut page = FakePage::at("https://example.com/");
        let mut gk = Gatekeeper::new(MatchMode::Suffix);
        let cfg = GatekeeperConfig::default();

        tx.send("https://example.com/about".to_string()).await.unwrap();
        tx.send("https://www.facebook.com/".to_string()).await.unwrap();
        let list = blocking(&["facebook.com"]);
        let mut calls = 0;
        let verdict = gk
            .watch(
                &mut page,
                Some(&mut rx),
                || {
                    calls += 1;
                    list.clone()
                },
                &cfg,
            )
            .await;
        assert!(verdict.is_blocked());
        assert_eq!(calls, 3);
        assert!(page.document.unwrap().contains("www.facebook.com"));
    }

    #[tokio::test(start_paused = true)]
    async fn fallback_poll_catches_late_toggle_then_stops() {
        let mut page = FakePage::at("https://www.youtube.com/");
        let mut gk = Gatekeeper::new(MatchMode::Suffix);
        let cfg = GatekeeperConfig {
            poll_interval_ms: 500,
            budget_ms: 10_000,
        };

        let mut checks = 0;
        let verdict = gk
            .watch(
                &mut page,
                None,
                || {
                    checks += 1;
                    let mut list = blocking(&["youtube.com"]);
                    // Blocking is switched on before the third check.
                    list.set_enabled(checks >= 3);
                    list
                },
                &cfg,
            )
            .await;
        assert!(verdict.is_blocked());
        assert_eq!(checks, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn fallback_poll_gives_up_after_budget() {
        let mut page = FakePage::at("https://docs.rs/");
        let mut gk = Gatekeeper::new(MatchMode::Suffix);
        let cfg = GatekeeperConfig {
            poll_interval_ms: 500,
            budget_ms: 2_000,
        };
        let start = Instant::now();
        let mut checks = 0;
        let verdict = gk
            .watch(
                &mut page,
                None,
                || {
                    checks += 1;
                    blocking(&["youtube.com"])
                },
                &cfg,
            )
            .await;
        assert_eq!(verdict, Verdict::Allowed);
        assert!(start.elapsed() >= Duration::from_millis(2_000));
        assert!(checks <= 5);
    }
}
