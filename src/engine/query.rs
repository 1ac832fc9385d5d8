//! Read-only query and reporting surface

use crate::traits::*;
use crate::types::*;

/// Read-only aggregation over the reconciliation entities
pub struct ReconciliationQueries<S: ReconciliationStorage> {
    storage: S,
}

impl<S: ReconciliationStorage> ReconciliationQueries<S> {
    /// Create the query surface over the given storage backend
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// List unreconciled movements for a bank account, newest value date
    /// first. Filters are purely additive: omitted fields impose no
    /// constraint.
    pub async fn get_unmatched_movements(
        &self,
        bank_account_id: &str,
        filter: Option<&MovementFilter>,
    ) -> ReconciliationResult<Vec<TreasuryMovement>> {
        let mut movements = self
            .storage
            .list_unreconciled_movements(bank_account_id, None)
            .await?;

        if let Some(filter) = filter {
            movements.retain(|m| filter.accepts(m));
        }

        movements.sort_by(|a, b| {
            b.value_date
                .cmp(&a.value_date)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(movements)
    }

    /// Summarize a statement's reconciliation state, with matched lines
    /// broken down by match type. A statement with no lines yields
    /// all-zero counts.
    pub async fn get_reconciliation_summary(
        &self,
        statement_id: &str,
    ) -> ReconciliationResult<ReconciliationSummary> {
        let statement = self
            .storage
            .get_statement(statement_id)
            .await?
            .ok_or_else(|| ReconciliationError::StatementNotFound(statement_id.to_string()))?;

        let items = self
            .storage
            .list_statement_items(&statement.id, false)
            .await?;

        let mut by_match_type = MatchTypeBreakdown::default();
        let mut matched = 0;
        let mut suspense = 0;
        let mut suspense_resolved = 0;

        for item in &items {
            if item.reconciled {
                matched += 1;
                if let Some(match_type) = item.match_type {
                    by_match_type.record(match_type);
                }
            }
            if item.is_open_suspense() {
                suspense += 1;
            }
            if item.suspense_resolved {
                suspense_resolved += 1;
            }
        }

        Ok(ReconciliationSummary {
            statement_id: statement.id,
            total_items: items.len(),
            matched,
            pending: items.len() - matched,
            suspense,
            suspense_resolved,
            by_match_type,
        })
    }
}
