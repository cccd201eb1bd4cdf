//! Port traits: the seams between the pure pipeline and the outside world.

pub mod contracts;
pub mod discoverer;
pub mod html;
pub mod http;
pub mod mirror;
pub mod registry;

pub use contracts::ContractsPort;
pub use discoverer::{DiscovererFactory, SourceDiscoverer};
pub use html::{ExtractedLink, HtmlPort};
pub use http::{GetResult, HeadResult, Headers, HttpPort, StreamResult};
pub use mirror::{MirrorPort, MirrorResult, RemoteMirrorPort};
pub use registry::RegistryPort;
