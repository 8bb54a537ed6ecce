pub mod execution;
pub mod hash_index;

pub use execution::operator::{Operand, Predicate, PredicateType, PhysicalOperator, ScanOperator};
pub use execution::slotted_page::{self, Slot};
pub use execution::tuple::{Field, Tuple, fixed_schema_tuple};
pub use hash_index::HashIndex;

use thiserror::Error;

/// Errors raised by tuple decoding and the query execution layer.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("malformed tuple stream: {0}")]
    Decode(String),
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error(transparent)]
    Storage(#[from] storage::StorageError),
}
