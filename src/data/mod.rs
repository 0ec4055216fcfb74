//! Static GL/CQ corpora, built once at process start and read-only
//! thereafter. The seed sets here are illustrative, not a complete
//! mirror of any real national guideline registry.

pub mod cq;
pub mod guidelines;

pub use cq::clinical_questions;
pub use guidelines::guidelines;
