//! Multi-phase lead qualification: ingest, filter, score, shortlist,
//! validate, enrich, and export to the contact store.

pub mod domain;
pub mod enrichment;
pub mod filter;
pub mod ingest;
pub mod keywords;
pub mod matching;
pub mod pipeline;
pub mod scoring;
pub mod store;

pub use domain::{ContactFields, LeadKey, LeadRecord, Priority, SchemaPresence, Tier};
pub use enrichment::{
    EnrichedContact, EnrichmentProvider, EnrichmentQuery, EnrichmentReport, EnrichmentWaterfall,
    ProviderError,
};
pub use filter::{FilterReport, FilterStage};
pub use ingest::{read_leads, read_leads_from_path, ColumnMap, LeadDataset, LeadImportError};
pub use keywords::KeywordSets;
pub use pipeline::{
    LeadPipeline, Phase, PipelineError, PipelineOptions, PipelineOutcome, PipelineSummary,
};
pub use scoring::{PriorityBreakdown, ScoringStage, ShortlistReport, TierBreakdown};
pub use store::{
    ContactRecord, ContactStore, FieldPatch, InMemoryContactStore, RecordId, RecordUpsert,
    StoreError,
};
