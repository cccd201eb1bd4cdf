//! Discovery use case (C12): orchestrates C1-C11 into the state machine
//! from spec.md §4.10. Idempotent — re-running `execute` for an
//! already-current key recomputes the same version and rewrites the same
//! bytes.

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::domain::{Candidate, Contract, MimeType, NormalizedUrl, RegistryEntry, SizeKb, SourceType, Status, ValidatedCandidate};
use crate::error::{AppError, DiscoveryError};
use crate::policy::acceptance::{self, Verdict};
use crate::policy::{selector, versioning};
use crate::ports::{ContractsPort, DiscovererFactory, HttpPort, MirrorPort, RegistryPort};
use crate::validator;

pub struct DiscoveryUseCase<'a> {
    contracts: &'a dyn ContractsPort,
    registry: &'a dyn RegistryPort,
    http: &'a dyn HttpPort,
    factory: &'a dyn DiscovererFactory,
    mirror: &'a dyn MirrorPort,
}

impl<'a> DiscoveryUseCase<'a> {
    pub fn new(
        contracts: &'a dyn ContractsPort,
        registry: &'a dyn RegistryPort,
        http: &'a dyn HttpPort,
        factory: &'a dyn DiscovererFactory,
        mirror: &'a dyn MirrorPort,
    ) -> Self {
        Self {
            contracts,
            registry,
            http,
            factory,
            mirror,
        }
    }

    /// Run discovery for a single key end to end, writing the resulting
    /// registry entry on success.
    pub async fn execute(&self, key: &str, mirror_flag: Option<bool>, fast_flag: bool) -> Result<RegistryEntry, AppError> {
        let contract = self.contracts.get_contract(key)?.with_fast_mode(fast_flag);

        let (validated, verdict) = match contract.source_type {
            SourceType::Html => self.discover_html(&contract).await?,
            SourceType::Api => self.discover_api(&contract).await?,
        };

        let should_mirror = mirror_flag.unwrap_or(contract.mirror);
        let entry = self.finalize(&contract, validated, verdict, should_mirror).await?;
        self.registry.upsert(entry.clone()).await?;
        info!(key, version = entry.version.as_str(), status = ?entry.status, "discovery complete");
        Ok(entry)
    }

    async fn discover_html(&self, contract: &Contract) -> Result<(ValidatedCandidate, Verdict), AppError> {
        let discoverer = self.factory.create(contract.key.as_str());
        let mut candidates = discoverer.discover(contract, self.http).await?;

        if candidates.is_empty() && !contract.known_urls.is_empty() {
            warn!(key = contract.key.as_str(), "crawl yielded nothing, falling back to known_urls");
            candidates = known_urls_as_candidates(contract);
        }

        let validated = validator::validate_all(candidates, contract, self.http).await;
        if validated.is_empty() {
            return Err(DiscoveryError::NoCandidates {
                key: contract.key.as_str().to_string(),
            }
            .into());
        }

        let selected = selector::select(validated, contract).ok_or_else(|| DiscoveryError::NoCandidates {
            key: contract.key.as_str().to_string(),
        })?;

        // `validate_all` only retains `Verdict::Accept` candidates.
        Ok((selected, Verdict::Accept))
    }

    async fn discover_api(&self, contract: &Contract) -> Result<(ValidatedCandidate, Verdict), AppError> {
        let endpoint = contract
            .known_urls
            .first()
            .or_else(|| contract.start_urls.first())
            .ok_or_else(|| DiscoveryError::NoCandidates {
                key: contract.key.as_str().to_string(),
            })?;

        let url = NormalizedUrl::parse(endpoint, None).map_err(|_| DiscoveryError::NoCandidates {
            key: contract.key.as_str().to_string(),
        })?;

        let response = self.http.get(url.as_str()).await?;
        let mime = MimeType::parse(response.headers.content_type().unwrap_or(""));
        let size_kb = SizeKb::from_bytes(response.body.len() as u64);
        let last_modified = response.headers.last_modified().and_then(versioning::parse_last_modified);
        let has_attachment = response.headers.has_attachment_disposition();

        let verdict = acceptance::evaluate(&mime, size_kb, last_modified, has_attachment, &contract.expect, Utc::now());
        if matches!(verdict, Verdict::Reject) {
            return Err(DiscoveryError::NoCandidates {
                key: contract.key.as_str().to_string(),
            }
            .into());
        }

        let filename = response
            .headers
            .content_disposition_filename()
            .unwrap_or_else(|| url.filename());
        let candidate = Candidate::new(contract.key.clone(), url, filename, 0);
        let validated = ValidatedCandidate {
            candidate,
            mime,
            size_kb,
            last_modified,
            notes: None,
        };

        Ok((validated, verdict))
    }

    async fn finalize(
        &self,
        contract: &Contract,
        validated: ValidatedCandidate,
        verdict: Verdict,
        should_mirror: bool,
    ) -> Result<RegistryEntry, AppError> {
        let now = Utc::now();
        let last_modified_str = validated.last_modified.map(|dt| dt.to_rfc2822());
        let version = versioning::derive_version_for_contract(contract, validated.filename(), last_modified_str.as_deref(), now);

        let (sha256, stored_path) = if should_mirror {
            let result = self
                .mirror
                .mirror_file(validated.url().as_str(), &contract.key, &version, validated.filename())
                .await?;
            (result.sha256, Some(result.local_path))
        } else {
            let response = self.http.get(validated.url().as_str()).await?;
            let mut hasher = Sha256::new();
            hasher.update(&response.body);
            (crate::domain::Sha256Digest::from_bytes(&hasher.finalize()), None)
        };

        let status = match verdict {
            Verdict::Accept => Status::Ok,
            Verdict::AcceptSuspect | Verdict::Reject => Status::Suspect,
        };

        Ok(RegistryEntry {
            key: contract.key.as_str().to_string(),
            url: validated.url().as_str().to_string(),
            version: version.as_str().to_string(),
            filename: validated.filename().to_string(),
            mime: validated.mime.as_str().to_string(),
            size_kb: validated.size_kb.value(),
            sha256: sha256.as_str().to_string(),
            last_checked: now,
            status,
            notes: validated.notes,
            stored_path,
            remote_key: None,
            related: None,
        })
    }

    /// Re-validate an existing registry entry's URL, updating its status
    /// without re-running discovery (spec.md §4.10, `validate_source`).
    pub async fn validate_source(&self, key: &str) -> Result<RegistryEntry, AppError> {
        let contract = self.contracts.get_contract(key)?;
        let mut entry = self
            .registry
            .get(key)
            .await?
            .ok_or_else(|| DiscoveryError::NoCandidates { key: key.to_string() })?;

        let url = NormalizedUrl::parse(&entry.url, None).map_err(|_| DiscoveryError::NoCandidates { key: key.to_string() })?;
        let candidate = Candidate::new(contract.key.clone(), url, entry.filename.clone(), 0);

        match validator::validate_one_with_verdict(&candidate, &contract, self.http).await {
            None => {
                entry.mark_broken(Utc::now(), "source unreachable at last check");
            }
            Some((validated, verdict)) => {
                entry.status = match verdict {
                    Verdict::Accept => Status::Ok,
                    Verdict::AcceptSuspect | Verdict::Reject => Status::Suspect,
                };
                entry.last_checked = Utc::now();
                entry.mime = validated.mime.as_str().to_string();
                entry.size_kb = validated.size_kb.value();
                entry.notes = validated.notes;
            }
        }

        self.registry.upsert(entry.clone()).await?;
        Ok(entry)
    }
}

fn known_urls_as_candidates(contract: &Contract) -> Vec<Candidate> {
    contract
        .known_urls
        .iter()
        .enumerate()
        .filter_map(|(idx, raw)| {
            let url = NormalizedUrl::parse(raw, None).ok()?;
            let filename = url.filename();
            Some(Candidate::new(contract.key.clone(), url, filename, idx).with_note("synthetic_known_url"))
        })
        .collect()
}
