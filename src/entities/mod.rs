pub mod guideline;
pub mod record;

pub use guideline::{ClinicalQuestion, CqListGroup, CqListResponse, Guideline, ScoredClinicalQuestion, ScoredGuideline};
pub use record::{EvidenceLevel, Record, Source};
