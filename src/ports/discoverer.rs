//! Discoverer + factory ports (C14, §9 redesign).
//!
//! Replaces the source system's process-wide map of per-source subclasses
//! with an explicit factory port. The default factory consults a
//! composition-time table and falls back to the generic contract-driven
//! engine for any key without a bespoke entry.

use async_trait::async_trait;

use crate::domain::{Candidate, Contract};
use crate::error::AppError;
use crate::ports::http::HttpPort;

/// A strategy for turning a contract's start URLs into a candidate list.
/// The generic engine (crawler + ranker, C5/C6) is the only implementation
/// this crate ships; the trait exists as the seam a bespoke per-site
/// discoverer would implement when a contract cannot express the site's
/// shape (spec.md §9).
#[async_trait]
pub trait SourceDiscoverer: Send + Sync {
    async fn discover(&self, contract: &Contract, http: &dyn HttpPort) -> Result<Vec<Candidate>, AppError>;
}

pub trait DiscovererFactory: Send + Sync {
    fn create(&self, key: &str) -> Box<dyn SourceDiscoverer>;
}
