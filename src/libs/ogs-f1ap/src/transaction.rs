//! F1AP Transaction Correlator
//!
//! Hands out TransactionIDs for DU-initiated procedures and matches the CU's
//! response or failure back to the request that carried the same id.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use ogs_asn1c::f1ap::types::ProcedureCode;

use crate::error::{F1apError, F1apResult};
use crate::types::TransactionId;

/// A request waiting for its response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTransaction {
    pub procedure: ProcedureCode,
    pub issued_at: Instant,
}

#[derive(Debug, Default)]
struct Table {
    next: TransactionId,
    in_flight: HashMap<TransactionId, PendingTransaction>,
}

impl Table {
    /// Move the cursor past the next id not in flight
    fn advance(&mut self) -> Option<TransactionId> {
        if self.in_flight.len() > TransactionId::MAX as usize {
            return None;
        }
        let mut id = self.next;
        while self.in_flight.contains_key(&id) {
            id = id.wrapping_add(1);
        }
        self.next = id.wrapping_add(1);
        Some(id)
    }
}

/// In-flight transaction table shared by the outbound and inbound paths
#[derive(Debug, Default)]
pub struct TransactionCorrelator {
    table: Mutex<Table>,
}

impl TransactionCorrelator {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> MutexGuard<'_, Table> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reserve the next free id, round-robin over 0..=255
    pub fn allocate(&self, procedure: ProcedureCode) -> F1apResult<TransactionId> {
        let mut table = self.table();
        let id = table.advance().ok_or(F1apError::TransactionIdsExhausted)?;
        table.in_flight.insert(
            id,
            PendingTransaction {
                procedure,
                issued_at: Instant::now(),
            },
        );

        log::debug!("[{}] Transaction {id} allocated", procedure.name());
        Ok(id)
    }

    /// Next free id for a message that expects no response; nothing is
    /// reserved
    pub fn next_unused(&self) -> Option<TransactionId> {
        self.table().advance()
    }

    /// Match a response or failure to its request and free the id.
    ///
    /// An id that is not in flight, or was issued for another procedure,
    /// stays untouched.
    pub fn complete(
        &self,
        id: TransactionId,
        procedure: ProcedureCode,
    ) -> F1apResult<PendingTransaction> {
        let mut table = self.table();
        match table.in_flight.get(&id) {
            Some(pending) if pending.procedure == procedure => {}
            Some(pending) => {
                log::warn!(
                    "Transaction {id} belongs to {}, not {}",
                    pending.procedure.name(),
                    procedure.name()
                );
                return Err(F1apError::UnknownTransactionId(id));
            }
            None => return Err(F1apError::UnknownTransactionId(id)),
        }
        table
            .in_flight
            .remove(&id)
            .ok_or(F1apError::UnknownTransactionId(id))
    }

    /// Drop an id without a response (send failure, abort)
    pub fn release(&self, id: TransactionId) -> bool {
        self.table().in_flight.remove(&id).is_some()
    }

    pub fn is_in_flight(&self, id: TransactionId) -> bool {
        self.table().in_flight.contains_key(&id)
    }

    pub fn in_flight(&self) -> usize {
        self.table().in_flight.len()
    }

    /// Release every id outstanding for at least `max_age`
    pub fn expire(&self, max_age: Duration) -> Vec<(TransactionId, PendingTransaction)> {
        let now = Instant::now();
        let mut table = self.table();
        let stale: Vec<TransactionId> = table
            .in_flight
            .iter()
            .filter(|(_, pending)| now.duration_since(pending.issued_at) >= max_age)
            .map(|(id, _)| *id)
            .collect();

        let mut expired = Vec::with_capacity(stale.len());
        for id in stale {
            if let Some(pending) = table.in_flight.remove(&id) {
                log::warn!(
                    "[{}] Transaction {id} expired without response",
                    pending.procedure.name()
                );
                expired.push((id, pending));
            }
        }
        expired
    }

    pub fn clear(&self) {
        self.table().in_flight.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_allocate_round_robin() {
        let correlator = TransactionCorrelator::new();
        assert_eq!(correlator.allocate(ProcedureCode::F1_SETUP).unwrap(), 0);
        assert_eq!(correlator.allocate(ProcedureCode::RESET).unwrap(), 1);
        correlator.complete(0, ProcedureCode::F1_SETUP).unwrap();
        // 0 is free again but the cursor moves on
        assert_eq!(correlator.allocate(ProcedureCode::RESET).unwrap(), 2);
    }

    #[test]
    fn test_exhaustion_and_reuse() {
        let correlator = TransactionCorrelator::new();
        let ids: HashSet<_> = (0..256)
            .map(|_| correlator.allocate(ProcedureCode::GNB_DU_CONFIGURATION_UPDATE).unwrap())
            .collect();
        assert_eq!(ids.len(), 256);
        assert!(matches!(
            correlator.allocate(ProcedureCode::F1_SETUP),
            Err(F1apError::TransactionIdsExhausted)
        ));

        assert!(correlator.release(42));
        assert_eq!(correlator.allocate(ProcedureCode::F1_SETUP).unwrap(), 42);
    }

    #[test]
    fn test_complete_unknown_or_wrong_procedure() {
        let correlator = TransactionCorrelator::new();
        assert!(matches!(
            correlator.complete(7, ProcedureCode::F1_SETUP),
            Err(F1apError::UnknownTransactionId(7))
        ));

        let id = correlator.allocate(ProcedureCode::GNB_DU_CONFIGURATION_UPDATE).unwrap();
        assert!(correlator.complete(id, ProcedureCode::F1_SETUP).is_err());
        assert!(correlator.is_in_flight(id));
        let pending = correlator
            .complete(id, ProcedureCode::GNB_DU_CONFIGURATION_UPDATE)
            .unwrap();
        assert_eq!(pending.procedure, ProcedureCode::GNB_DU_CONFIGURATION_UPDATE);
        assert!(!correlator.is_in_flight(id));
    }

    #[test]
    fn test_next_unused_reserves_nothing() {
        let correlator = TransactionCorrelator::new();
        correlator.allocate(ProcedureCode::F1_SETUP).unwrap();
        assert_eq!(correlator.next_unused(), Some(1));
        assert_eq!(correlator.in_flight(), 1);
        assert_eq!(correlator.allocate(ProcedureCode::RESET).unwrap(), 2);
    }

    #[test]
    fn test_expire() {
        let correlator = TransactionCorrelator::new();
        correlator.allocate(ProcedureCode::F1_SETUP).unwrap();
        assert!(correlator.expire(Duration::from_secs(3600)).is_empty());
        assert_eq!(correlator.in_flight(), 1);

        let expired = correlator.expire(Duration::ZERO);
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].0, 0);
        assert_eq!(correlator.in_flight(), 0);
    }

    #[test]
    fn test_concurrent_allocation_is_unique() {
        let correlator = Arc::new(TransactionCorrelator::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let correlator = Arc::clone(&correlator);
                std::thread::spawn(move || {
                    (0..16)
                        .map(|_| correlator.allocate(ProcedureCode::F1_SETUP).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let ids: HashSet<_> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        assert_eq!(ids.len(), 128);
        assert_eq!(correlator.in_flight(), 128);
    }
}
