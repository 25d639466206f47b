pub mod client;
pub mod detail;
pub mod discovery;
pub mod error;
pub mod fetch;
pub mod geo;
pub mod normalize;
pub mod pagination;
pub mod parse;
pub mod pipeline;
mod rate_limit;
pub mod store;
pub mod writer;

pub use client::DirectoryClient;
pub use detail::{fetch_detail, fetch_details, DetailOptions};
pub use discovery::{discover, load_candidates, DiscoveryOptions};
pub use error::{GeoError, PipelineError, ScraperError, StoreError, WriteError};
pub use fetch::Fetch;
pub use geo::{Geocoder, PostcodesIoGeocoder, StoreBackedGeocoder};
pub use normalize::normalize_detail;
pub use pipeline::{run_enrichment, EnrichmentReport};
pub use store::{FsRawStore, MemoryStore, RawDetailDocument, RawStore, StoreKey, StoredDetail, Tombstone};
pub use writer::{summary_file_name, summary_record, write_summary_csv};
