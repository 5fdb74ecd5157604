use serde::{Deserialize, Serialize};

/// Server-assigned product identity. Ids are monotonic and never reused,
/// so a delete cannot renumber the surviving records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(pub i64);
