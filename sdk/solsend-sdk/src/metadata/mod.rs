pub mod enrich;
pub mod onchain;
pub mod registry;

pub use enrich::{merge, EnrichmentPipeline};
pub use onchain::{MetadataSource, MetaplexMetadata, OnChainMetadata};
pub use registry::{FileRegistry, RegistryEntry, RegistrySnapshot, RegistrySource, StaticRegistry};
