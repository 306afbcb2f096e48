pub mod master_cache;
pub mod master_cache_storage;
pub mod normalizer;
pub mod snapshot;
pub mod sync;
pub mod year_resolver;

pub use master_cache::MasterYearCache;
pub use master_cache_storage::{CachePersistence, MasterCacheStorage};
pub use normalizer::{Normalizer, NormalizerOptions};
pub use snapshot::SnapshotWriter;
pub use sync::{FeedSummary, SyncOrchestrator, SyncResult};
pub use year_resolver::{ResolverStats, YearResolver};
