//! End-to-end scenarios exercising the full crawl → rank → validate →
//! select → version → mirror → registry pipeline against synthetic HTTP
//! fixtures (no live network access).

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;

use autodiscovery::discoverer::DefaultDiscovererFactory;
use autodiscovery::domain::{
    Contract, Expect, Find, MatchPatterns, Scope, Select, SourceKey, SourceType, Status, VersioningStrategy,
};
use autodiscovery::error::{ContractError, NetworkError};
use autodiscovery::html::ScraperHtmlExtractor;
use autodiscovery::mirror::LocalMirror;
use autodiscovery::ports::http::{GetResult, HeadResult, Headers, StreamResult};
use autodiscovery::ports::{ContractsPort, HttpPort, RegistryPort};
use autodiscovery::registry::JsonFileRegistry;
use autodiscovery::usecase::DiscoveryUseCase;

struct Page {
    content_type: &'static str,
    body: Vec<u8>,
    head_status: Option<u16>,
}

/// An in-memory HTTP fixture keyed by exact URL, with an optional
/// independent HEAD status (for the HEAD-unsupported scenario) and a
/// request counter for asserting bounded fan-out under `--fast`.
#[derive(Default)]
struct FakeHttp {
    pages: HashMap<String, Page>,
    get_calls: Mutex<usize>,
}

impl FakeHttp {
    fn insert(&mut self, url: &str, content_type: &'static str, body: impl Into<Vec<u8>>, head_status: Option<u16>) {
        self.pages.insert(
            url.to_string(),
            Page {
                content_type,
                body: body.into(),
                head_status,
            },
        );
    }

    fn get_call_count(&self) -> usize {
        *self.get_calls.lock().unwrap()
    }
}

#[async_trait]
impl HttpPort for FakeHttp {
    async fn head(&self, url: &str) -> Result<HeadResult, NetworkError> {
        let page = self.pages.get(url).ok_or_else(|| NetworkError::Status {
            url: url.to_string(),
            status: 404,
        })?;
        if let Some(status) = page.head_status {
            if status >= 400 {
                return Err(NetworkError::Status {
                    url: url.to_string(),
                    status,
                });
            }
        }
        let mut headers = Headers::new();
        headers.insert("content-type", page.content_type);
        headers.insert("content-length", page.body.len().to_string());
        Ok(HeadResult { status: 200, headers })
    }

    async fn get(&self, url: &str) -> Result<GetResult, NetworkError> {
        *self.get_calls.lock().unwrap() += 1;
        let page = self.pages.get(url).ok_or_else(|| NetworkError::Status {
            url: url.to_string(),
            status: 404,
        })?;
        let mut headers = Headers::new();
        headers.insert("content-type", page.content_type);
        headers.insert("content-length", page.body.len().to_string());
        Ok(GetResult {
            status: 200,
            headers,
            body: Bytes::from(page.body.clone()),
        })
    }

    async fn stream(&self, url: &str) -> Result<StreamResult, NetworkError> {
        let get = self.get(url).await?;
        let body = get.body;
        Ok(StreamResult {
            status: get.status,
            headers: get.headers,
            chunks: Box::pin(futures::stream::once(async move { Ok(body) })),
        })
    }
}

struct SingleContract(Contract);

impl ContractsPort for SingleContract {
    fn load_contracts(&self) -> Result<Vec<Contract>, ContractError> {
        Ok(vec![self.0.clone()])
    }
    fn get_contract(&self, key: &str) -> Result<Contract, ContractError> {
        if key == self.0.key.as_str() {
            Ok(self.0.clone())
        } else {
            Err(ContractError::NotFound(key.to_string()))
        }
    }
    fn all_keys(&self) -> Result<Vec<String>, ContractError> {
        Ok(vec![self.0.key.as_str().to_string()])
    }
}

fn base_contract(key: &str) -> Contract {
    Contract {
        key: SourceKey::new(key),
        source_type: SourceType::Html,
        start_urls: vec!["https://example.gov/home".to_string()],
        known_urls: vec![],
        scope: Scope {
            allow_domains: vec!["example.gov".to_string()],
            allow_paths_any: vec![],
            max_depth: 2,
            max_candidates: 50,
        },
        find: Find::default(),
        matching: MatchPatterns::default(),
        select: Select::default(),
        expect: Expect::default(),
        versioning: VersioningStrategy::None,
        mirror: true,
        dedupe_ignore_query: false,
    }
}

#[tokio::test]
async fn s1_newest_dated_spreadsheet_is_selected() {
    let mut http = FakeHttp::default();
    let home = r#"
        <a href="/infomodia-2025-09-15.xls">Sept</a>
        <a href="/infomodia-2025-10-01.xls">Oct</a>
        <a href="/infomodia-2025-11-04.xls">Nov</a>
    "#;
    http.insert("https://example.gov/home", "text/html", home.as_bytes().to_vec(), None);
    for date in ["2025-09-15", "2025-10-01", "2025-11-04"] {
        http.insert(
            &format!("https://example.gov/infomodia-{date}.xls"),
            "application/vnd.ms-excel",
            vec![0u8; 120 * 1024],
            None,
        );
    }

    let mut contract = base_contract("infomodia");
    contract.matching = MatchPatterns {
        patterns: vec![regex::Regex::new(r"infomodia-(\d{4}-\d{2}-\d{2})\.xls").unwrap()],
    };
    contract.select.newest_by = Some(autodiscovery::domain::NewestByStrategy::DateFromFilenameOrLastModified);
    contract.expect = Expect {
        mime_any: vec!["application/vnd.ms-excel".to_string()],
        min_size_kb: 50.0,
        max_age_days: None,
    };
    contract.versioning = VersioningStrategy::DateFromFilenameOrLastModified;

    let contracts = SingleContract(contract);
    let dir = tempfile::tempdir().unwrap();
    let registry = JsonFileRegistry::new(dir.path().join("registry.json"));
    let factory = DefaultDiscovererFactory;
    let mirror = LocalMirror::new(dir.path().join("mirrors"), &http);

    let use_case = DiscoveryUseCase::new(&contracts, &registry, &http, &factory, &mirror);
    let entry = use_case.execute("infomodia", None, false).await.unwrap();

    assert_eq!(entry.version, "v2025-11-04");
    assert!(entry.filename.contains("2025-11-04"));
    assert_eq!(entry.status, Status::Ok);
}

#[tokio::test]
async fn s2_spanish_month_pdf_picks_latest_month() {
    let mut http = FakeHttp::default();
    let home = r#"
        <a href="/informe-septiembre-2025.pdf">Sept</a>
        <a href="/informe-octubre-2025.pdf">Oct</a>
    "#;
    http.insert("https://example.gov/home", "text/html", home.as_bytes().to_vec(), None);
    http.insert(
        "https://example.gov/informe-septiembre-2025.pdf",
        "application/pdf",
        vec![0u8; 60 * 1024],
        None,
    );
    http.insert(
        "https://example.gov/informe-octubre-2025.pdf",
        "application/pdf",
        vec![0u8; 60 * 1024],
        None,
    );

    let mut contract = base_contract("informe");
    contract.select.newest_by = Some(autodiscovery::domain::NewestByStrategy::BestEffortDateOrLastModified);
    contract.expect = Expect {
        mime_any: vec!["application/pdf".to_string()],
        min_size_kb: 10.0,
        max_age_days: None,
    };
    contract.versioning = VersioningStrategy::BestEffortDateOrLastModified;
    contract.mirror = false;

    let contracts = SingleContract(contract);
    let dir = tempfile::tempdir().unwrap();
    let registry = JsonFileRegistry::new(dir.path().join("registry.json"));
    let factory = DefaultDiscovererFactory;
    let mirror = LocalMirror::new(dir.path().join("mirrors"), &http);

    let use_case = DiscoveryUseCase::new(&contracts, &registry, &http, &factory, &mirror);
    let entry = use_case.execute("informe", None, false).await.unwrap();

    assert_eq!(entry.version, "2025-10");
    assert!(entry.filename.contains("octubre"));
}

#[tokio::test]
async fn s3_head_unsupported_falls_back_to_get() {
    let mut http = FakeHttp::default();
    let home = r#"<a href="/r.pdf">Report</a>"#;
    http.insert("https://example.gov/home", "text/html", home.as_bytes().to_vec(), None);
    // HEAD returns 405; GET succeeds with an acceptable PDF.
    http.insert("https://example.gov/r.pdf", "application/pdf", vec![0u8; 300_000], Some(405));

    let mut contract = base_contract("single_report");
    contract.expect = Expect {
        mime_any: vec!["application/pdf".to_string()],
        min_size_kb: 200.0,
        max_age_days: None,
    };
    contract.mirror = false;

    let contracts = SingleContract(contract);
    let dir = tempfile::tempdir().unwrap();
    let registry = JsonFileRegistry::new(dir.path().join("registry.json"));
    let factory = DefaultDiscovererFactory;
    let mirror = LocalMirror::new(dir.path().join("mirrors"), &http);

    let use_case = DiscoveryUseCase::new(&contracts, &registry, &http, &factory, &mirror);
    let entry = use_case.execute("single_report", None, false).await.unwrap();

    assert_eq!(entry.notes.as_deref(), Some("head_failed_get_ok"));
}

#[tokio::test]
async fn s5_fast_mode_caps_candidates_to_one() {
    let mut http = FakeHttp::default();
    let mut home = String::new();
    for i in 0..50 {
        home.push_str(&format!(r#"<a href="/r{i}.pdf">r{i}</a>"#));
    }
    http.insert("https://example.gov/home", "text/html", home.as_bytes().to_vec(), None);
    for i in 0..50 {
        http.insert(&format!("https://example.gov/r{i}.pdf"), "application/pdf", vec![0u8; 10 * 1024], None);
    }

    let mut contract = base_contract("many_reports");
    contract.expect = Expect {
        mime_any: vec!["application/pdf".to_string()],
        min_size_kb: 1.0,
        max_age_days: None,
    };
    contract.mirror = false;

    let html = ScraperHtmlExtractor::default();
    let fast_contract = contract.clone().with_fast_mode(true);
    let candidates = autodiscovery::crawler::crawl(&fast_contract, &http, &html).await;

    assert_eq!(candidates.len(), 1);
    assert_eq!(fast_contract.scope.max_depth, 1);
    assert_eq!(fast_contract.scope.max_candidates, 1);
}

#[tokio::test]
async fn s6_api_source_hashes_body_and_versions_by_today() {
    let mut http = FakeHttp::default();
    http.insert(
        "https://example.gov/api/status.json",
        "application/json",
        vec![0u8; 20 * 1024],
        None,
    );

    let contract = Contract {
        key: SourceKey::new("status_api"),
        source_type: SourceType::Api,
        start_urls: vec![],
        known_urls: vec!["https://example.gov/api/status.json".to_string()],
        scope: Scope::default(),
        find: Find::default(),
        matching: MatchPatterns::default(),
        select: Select::default(),
        expect: Expect {
            mime_any: vec!["application/json".to_string()],
            min_size_kb: 0.0,
            max_age_days: None,
        },
        versioning: VersioningStrategy::DateToday,
        mirror: false,
        dedupe_ignore_query: false,
    };

    let contracts = SingleContract(contract);
    let dir = tempfile::tempdir().unwrap();
    let registry = JsonFileRegistry::new(dir.path().join("registry.json"));
    let factory = DefaultDiscovererFactory;
    let mirror = LocalMirror::new(dir.path().join("mirrors"), &http);

    let use_case = DiscoveryUseCase::new(&contracts, &registry, &http, &factory, &mirror);
    let entry = use_case.execute("status_api", None, false).await.unwrap();

    let expected_prefix = format!("v{}", chrono::Utc::now().format("%Y-%m-%d"));
    assert_eq!(entry.version, expected_prefix);
    assert_eq!(entry.mime, "application/json");
    assert_eq!(entry.sha256.len(), 64);
    assert!(http.get_call_count() >= 1);
}

#[tokio::test]
async fn registry_survives_a_stray_temp_file_from_a_prior_crash() {
    let dir = tempfile::tempdir().unwrap();
    let registry_path = dir.path().join("registry.json");
    // Simulate a crash between temp-file write and rename during a prior run.
    tokio::fs::write(registry_path.with_extension("json.tmp"), b"{not valid json").await.unwrap();

    let registry = JsonFileRegistry::new(registry_path.clone());
    assert_eq!(registry.list_keys().await.unwrap().len(), 0);

    let entry = autodiscovery::domain::RegistryEntry {
        key: "k".to_string(),
        url: "https://example.gov/r.pdf".to_string(),
        version: "v2025-01-01".to_string(),
        filename: "r.pdf".to_string(),
        mime: "application/pdf".to_string(),
        size_kb: 10.0,
        sha256: "a".repeat(64),
        last_checked: chrono::Utc::now(),
        status: Status::Ok,
        notes: None,
        stored_path: None,
        remote_key: None,
        related: None,
    };
    registry.upsert(entry).await.unwrap();
    assert_eq!(registry.list_keys().await.unwrap(), vec!["k".to_string()]);
    assert!(!registry_path.with_extension("json.tmp").exists() || tokio::fs::read_to_string(registry_path.with_extension("json.tmp")).await.unwrap().contains("not valid"));
}

#[tokio::test]
async fn empty_start_urls_fails_without_touching_registry() {
    let contract = Contract {
        key: SourceKey::new("nothing"),
        source_type: SourceType::Html,
        start_urls: vec![],
        known_urls: vec![],
        scope: Scope::default(),
        find: Find::default(),
        matching: MatchPatterns::default(),
        select: Select::default(),
        expect: Expect::default(),
        versioning: VersioningStrategy::None,
        mirror: false,
        dedupe_ignore_query: false,
    };

    // `base_contract`'s validity is enforced by `TextFileContracts` at parse
    // time; constructing one directly here exercises the discoverer's empty
    // result path instead.
    let contracts = SingleContract(contract);
    let http = FakeHttp::default();
    let dir = tempfile::tempdir().unwrap();
    let registry = JsonFileRegistry::new(dir.path().join("registry.json"));
    let factory = DefaultDiscovererFactory;
    let mirror = LocalMirror::new(dir.path().join("mirrors"), &http);

    let use_case = DiscoveryUseCase::new(&contracts, &registry, &http, &factory, &mirror);
    let err = use_case.execute("nothing", None, false).await.unwrap_err();

    assert_eq!(err.kind(), "discovery");
    assert_eq!(registry.list_keys().await.unwrap().len(), 0);
}

