//! Deduplication of merged category results

use std::collections::HashSet;
use tracing::{debug, warn};

use crate::{IdentityKey, TransactionRecord};

/// Remove records sharing an identity key (hash, category, token id)
///
/// The first occurrence wins and relative order is preserved, so applying the
/// function twice yields the same list. Records without a transaction hash
/// are dropped.
pub fn dedupe(records: Vec<TransactionRecord>) -> Vec<TransactionRecord> {
    let total = records.len();
    let mut seen: HashSet<IdentityKey> = HashSet::with_capacity(total);
    let mut unique = Vec::with_capacity(total);

    for record in records {
        if let Err(reason) = record.validate() {
            warn!(category = %record.category, "Dropping malformed record: {}", reason);
            continue;
        }
        if seen.insert(record.identity_key()) {
            unique.push(record);
        }
    }

    debug!(
        total,
        unique = unique.len(),
        "Deduplicated records"
    );
    unique
}
