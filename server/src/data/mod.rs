//! Data storage layer
//!
//! - `types` - Span and evaluation records shared by all stores
//! - `traits` - Query service traits consumed by the aggregation pipeline
//! - `memory` - Bounded in-memory store implementing both traits
//! - `error` - Unified error type for all stores

pub mod error;
pub mod memory;
pub mod traits;
pub mod types;

pub use error::DataError;
pub use memory::MemoryStore;
pub use traits::{EvaluationRepository, SpanRepository, TimeoutEvaluations};
pub use types::{AttributeFilter, AttributeValue, EvaluationRecord, SpanQuery, SpanRecord};
