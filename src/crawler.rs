//! Crawler (C5): bounded BFS over a contract's start URLs.

use std::collections::{HashSet, VecDeque};

use tracing::{debug, warn};

use crate::domain::{Candidate, Contract, NormalizedUrl};
use crate::ports::{HtmlPort, HttpPort};

const TERMINAL_EXTENSIONS: &[&str] = &["xls", "xlsx", "xlsm", "pdf", "zip"];

/// Crawl `contract.start_urls`, returning candidates discovered within the
/// contract's scope, depth, and count bounds (spec.md §4.3).
pub async fn crawl(contract: &Contract, http: &dyn HttpPort, html: &dyn HtmlPort) -> Vec<Candidate> {
    let mut queue: VecDeque<(String, u32)> = contract
        .start_urls
        .iter()
        .map(|u| (u.clone(), 0))
        .collect();
    let mut visited: HashSet<String> = HashSet::new();
    let mut candidates: Vec<Candidate> = Vec::new();
    let mut crawl_order = 0usize;

    while let Some((url, depth)) = queue.pop_front() {
        if candidates.len() >= contract.scope.max_candidates.max(1) {
            break;
        }
        if depth > contract.scope.max_depth {
            continue;
        }
        if !visited.insert(url.clone()) {
            continue;
        }

        let Ok(normalized) = NormalizedUrl::parse(&url, None) else {
            debug!(url, "skipping unparseable URL");
            continue;
        };

        if let Some(host) = normalized.host() {
            if !contract.scope.allows_host(&host) {
                continue;
            }
        }
        if !contract.scope.allows_path(&normalized.path()) {
            continue;
        }

        let fetched = match http.get(normalized.as_str()).await {
            Ok(get) => get,
            Err(err) => {
                warn!(url = normalized.as_str(), %err, "fetch failed during crawl");
                continue;
            }
        };

        let is_html = fetched
            .headers
            .content_type()
            .map(|ct| ct.contains("html"))
            .unwrap_or(true);

        if !is_html {
            let filename = terminal_filename(&fetched.headers, &normalized);
            candidates.push(Candidate::new(contract.key.clone(), normalized, filename, crawl_order));
            crawl_order += 1;
            continue;
        }

        let body = fetched.body;

        for link in html.extract_links(&body, normalized.as_str()) {
            if candidates.len() >= contract.scope.max_candidates.max(1) {
                break;
            }
            if !contract.find.accepts(&link.anchor_text, link.url.as_str()) {
                continue;
            }

            if ends_with_terminal_extension(&link.url) {
                let key = dedupe_key(&link.url, contract.dedupe_ignore_query);
                if visited.insert(key) {
                    let filename = link.url.filename();
                    candidates.push(Candidate::new(contract.key.clone(), link.url, filename, crawl_order));
                    crawl_order += 1;
                }
            } else if depth + 1 <= contract.scope.max_depth {
                let key = dedupe_key(&link.url, contract.dedupe_ignore_query);
                if !visited.contains(&key) {
                    queue.push_back((link.url.as_str().to_string(), depth + 1));
                }
            }
        }
    }

    candidates.truncate(contract.scope.max_candidates.max(1));
    candidates
}

fn ends_with_terminal_extension(url: &NormalizedUrl) -> bool {
    let path_lower = url.path().to_lowercase();
    TERMINAL_EXTENSIONS.iter().any(|ext| path_lower.ends_with(&format!(".{ext}")))
}

fn terminal_filename(headers: &crate::ports::Headers, url: &NormalizedUrl) -> String {
    headers
        .content_disposition_filename()
        .unwrap_or_else(|| url.filename())
}

fn dedupe_key(url: &NormalizedUrl, ignore_query: bool) -> String {
    if !ignore_query {
        return url.as_str().to_string();
    }
    match url::Url::parse(url.as_str()) {
        Ok(mut parsed) => {
            parsed.set_query(None);
            parsed.to_string()
        }
        Err(_) => url.as_str().to_string(),
    }
}
