//! Artifact caches for stash
//!
//! - [`ArtifactCache`]: the operations every backend and decorator offer
//! - [`ArtifactCacheFactory`]: builds handles from options, decorates and
//!   registers the live ones
//! - [`CacheRegistry`]: the ordered list of live handles for one run
//! - [`ShutdownCoordinator`]: closes everything in the registry within a
//!   deadline

pub mod dir;
pub mod errors;
pub mod factory;
pub mod logging;
pub mod noop;
mod options;
pub mod registry;
pub mod shutdown;
pub mod testing;
pub mod traits;

pub use dir::DirArtifactCache;
pub use errors::{CacheError, RecoveryHint, Result, StoreType};
pub use factory::{ArtifactCacheFactory, CacheOptions};
pub use logging::LoggingArtifactCache;
pub use noop::NoopArtifactCache;
pub use registry::CacheRegistry;
pub use shutdown::{ShutdownCoordinator, ShutdownEntry, ShutdownOutcome, ShutdownReport};
pub use traits::{ArtifactCache, CacheHandle, CacheResult};
