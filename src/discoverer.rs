//! Generic discoverer (C5/C6/C14): crawl then rank, wrapped behind
//! [`SourceDiscoverer`] so the use case never depends on the crawler
//! directly.

use async_trait::async_trait;

use crate::crawler;
use crate::domain::{Candidate, Contract, NormalizedUrl};
use crate::error::AppError;
use crate::policy::ranker;
use crate::ports::{DiscovererFactory, HtmlPort, HttpPort, SourceDiscoverer};

pub struct GenericDiscoverer<'a> {
    html: &'a dyn HtmlPort,
}

impl<'a> GenericDiscoverer<'a> {
    pub fn new(html: &'a dyn HtmlPort) -> Self {
        Self { html }
    }
}

#[async_trait]
impl<'a> SourceDiscoverer for GenericDiscoverer<'a> {
    async fn discover(&self, contract: &Contract, http: &dyn HttpPort) -> Result<Vec<Candidate>, AppError> {
        let strong_tokens: Vec<String> = contract
            .find
            .link_text_any
            .iter()
            .chain(contract.find.url_tokens_any.iter())
            .cloned()
            .collect();

        let mut candidates = if contract.start_urls.is_empty() && !contract.known_urls.is_empty() {
            known_urls_as_candidates(contract)
        } else {
            crawler::crawl(contract, http, self.html).await
        };

        candidates = ranker::rank(candidates, &strong_tokens, contract);
        Ok(candidates)
    }
}

/// When a contract has no crawlable `start_urls` (an API source whose
/// artifact location is fixed and known in advance), treat `known_urls` as
/// the candidate set directly rather than attempting to crawl nothing.
fn known_urls_as_candidates(contract: &Contract) -> Vec<Candidate> {
    contract
        .known_urls
        .iter()
        .enumerate()
        .filter_map(|(idx, raw)| {
            let url = NormalizedUrl::parse(raw, None).ok()?;
            let filename = url.filename();
            Some(Candidate::new(contract.key.clone(), url, filename, idx))
        })
        .collect()
}

/// Default factory: every key resolves to the generic engine. Kept as its
/// own type so composition (`main.rs`) can swap in a table-backed factory
/// without the use case noticing.
pub struct DefaultDiscovererFactory;

impl DiscovererFactory for DefaultDiscovererFactory {
    fn create(&self, _key: &str) -> Box<dyn SourceDiscoverer> {
        Box::new(StaticGenericDiscoverer)
    }
}

/// A [`SourceDiscoverer`] that owns its HTML adapter, for use behind the
/// factory's `Box<dyn SourceDiscoverer>` (which cannot carry a borrow).
struct StaticGenericDiscoverer;

#[async_trait]
impl SourceDiscoverer for StaticGenericDiscoverer {
    async fn discover(&self, contract: &Contract, http: &dyn HttpPort) -> Result<Vec<Candidate>, AppError> {
        let html = crate::html::ScraperHtmlExtractor::default();
        GenericDiscoverer::new(&html).discover(contract, http).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Expect, Find, MatchPatterns, Scope, Select, SourceKey, SourceType, VersioningStrategy};
    use crate::error::NetworkError;
    use crate::ports::http::{GetResult, HeadResult, StreamResult};

    struct EmptyHttp;

    #[async_trait]
    impl HttpPort for EmptyHttp {
        async fn head(&self, url: &str) -> Result<HeadResult, NetworkError> {
            Err(NetworkError::Status { url: url.to_string(), status: 404 })
        }
        async fn get(&self, url: &str) -> Result<GetResult, NetworkError> {
            Err(NetworkError::Status { url: url.to_string(), status: 404 })
        }
        async fn stream(&self, _url: &str) -> Result<StreamResult, NetworkError> {
            unimplemented!()
        }
    }

    fn api_contract() -> Contract {
        Contract {
            key: SourceKey::new("api_source"),
            source_type: SourceType::Api,
            start_urls: vec![],
            known_urls: vec!["https://example.gov/api/latest.json".to_string()],
            scope: Scope::default(),
            find: Find::default(),
            matching: MatchPatterns::default(),
            select: Select::default(),
            expect: Expect::default(),
            versioning: VersioningStrategy::None,
            mirror: false,
            dedupe_ignore_query: false,
        }
    }

    #[tokio::test]
    async fn known_urls_become_candidates_without_crawling() {
        let html = crate::html::ScraperHtmlExtractor::default();
        let discoverer = GenericDiscoverer::new(&html);
        let http = EmptyHttp;

        let candidates = discoverer.discover(&api_contract(), &http).await.unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].filename, "latest.json");
    }

    #[tokio::test]
    async fn default_factory_resolves_any_key() {
        let factory = DefaultDiscovererFactory;
        let discoverer = factory.create("anything");
        let http = EmptyHttp;
        let candidates = discoverer.discover(&api_contract(), &http).await.unwrap();
        assert_eq!(candidates.len(), 1);
    }
}
