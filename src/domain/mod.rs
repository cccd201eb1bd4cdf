//! Core domain: value types, the source contract, and the two record
//! shapes (transient candidate, persistent registry entry) the pipeline
//! passes between stages.

pub mod candidate;
pub mod contract;
pub mod registry_entry;
pub mod value_objects;

pub use candidate::{Candidate, ValidatedCandidate};
pub use contract::{Contract, Expect, Find, MatchPatterns, NewestByStrategy, Scope, Select, SourceType, VersioningStrategy};
pub use registry_entry::{RegistryEntry, Status};
pub use value_objects::{MimeType, NormalizedUrl, Sha256Digest, SizeKb, SourceKey, Version};
