//! Resolves Mediathek video pages to a single playable stream.
//!
//! A [`MediaResolver`] runs the deployment's backend adapter over a page,
//! drops candidates the host cannot play and ranks the rest. The
//! [`catalog`] module walks the program listings to find such pages.

pub mod catalog;
pub mod config;
pub mod markup;
pub mod media;
pub mod resolver;

pub use config::ResolverConfig;
pub use media::{ContainerFormat, QualityTier, StreamDescriptor, VideoInfo};
pub use resolver::{
    BackendKind, CapabilitySnapshot, MediaResolver, ProtocolCapabilityRegistry, Resolution,
    ResolveError,
};
