pub mod adapters;
pub mod capabilities;
pub mod error;
pub mod fetcher;
pub mod media_resolver;
pub mod ranking;

#[cfg(test)]
pub(crate) mod test_support;

pub use adapters::{BackendAdapter, BackendKind, Extraction, PageContent};
pub use capabilities::{CapabilitySnapshot, ProtocolCapabilityRegistry};
pub use error::ResolveError;
pub use fetcher::{ContentFetcher, FetchContext, HttpFetcher};
pub use media_resolver::{MediaResolver, Resolution};
pub use ranking::QualityRanking;
