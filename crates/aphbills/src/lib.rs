pub mod fetcher;
pub mod minister;
pub mod parser;
pub mod roster;
pub mod snapshot;
pub mod source;
pub mod staleness;
pub mod sync;
pub mod types;
pub mod utils;

#[cfg(test)]
mod test_support;

pub use fetcher::{Fetcher, RetryingFetcher};
pub use roster::Roster;
pub use snapshot::{Snapshot, SnapshotWriter};
pub use sync::{SyncConfig, SyncError, Synchronizer, sync_snapshot};

pub(crate) const BASE_URL: &str = "https://www.aph.gov.au/Parliamentary_Business/Bills_Legislation";
