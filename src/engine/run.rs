//! Statement run controller
//!
//! Iterates every unmatched line of a statement, runs the matcher per
//! line, commits hits through the executor, parks misses in suspense,
//! and recomputes the statement's aggregates.

use tracing::{debug, info};

use crate::engine::executor::MatchExecutor;
use crate::engine::matcher;
use crate::traits::*;
use crate::types::*;

/// Controller for automatic reconciliation runs over one statement
pub struct StatementRunner<S: ReconciliationStorage> {
    executor: MatchExecutor<S>,
}

impl<S: ReconciliationStorage> StatementRunner<S> {
    /// Create a new runner over the given storage backend
    pub fn new(storage: S) -> Self {
        Self {
            executor: MatchExecutor::new(storage),
        }
    }

    /// Try to reconcile every currently-unreconciled line of the
    /// statement. Each line's outcome commits independently, so a failure
    /// partway leaves committed matches intact and the run can be retried
    /// on the remainder. Running on a fully-reconciled statement is a
    /// no-op.
    pub async fn auto_match_statement_items(
        &mut self,
        statement_id: &str,
    ) -> ReconciliationResult<RunReport> {
        let statement = self.executor.get_statement_required(statement_id).await?;
        let tolerance = statement.tolerance();

        let items = self
            .executor
            .storage()
            .list_statement_items(statement_id, true)
            .await?;

        let mut matched = 0;
        let mut suspense = 0;
        let mut results = Vec::with_capacity(items.len());

        for item in &items {
            let pool = self
                .executor
                .storage()
                .list_unreconciled_movements(
                    &statement.bank_account_id,
                    Some(&statement.company_id),
                )
                .await?;

            let outcome = match matcher::find_match(item, &pool, &tolerance) {
                Some(candidate) => {
                    match self
                        .executor
                        .apply_match(
                            &item.id,
                            &candidate.movement_id,
                            candidate.match_type,
                            candidate.confidence,
                            None,
                        )
                        .await
                    {
                        Ok(result) => {
                            matched += 1;
                            ItemOutcome {
                                item_id: item.id.clone(),
                                match_type: Some(result.match_type),
                                movement_id: Some(result.movement_id),
                                confidence: Some(result.confidence),
                            }
                        }
                        // Another writer got to one of the sides first;
                        // park this line instead of aborting the run.
                        Err(
                            ReconciliationError::ItemAlreadyReconciled(_)
                            | ReconciliationError::MovementAlreadyReconciled(_),
                        ) => {
                            debug!(item_id = %item.id, "candidate raced away, parking in suspense");
                            if self.park_suspense(&item.id).await? {
                                suspense += 1;
                            }
                            ItemOutcome {
                                item_id: item.id.clone(),
                                match_type: None,
                                movement_id: None,
                                confidence: None,
                            }
                        }
                        Err(e) => return Err(e),
                    }
                }
                None => {
                    if self.park_suspense(&item.id).await? {
                        suspense += 1;
                    }
                    ItemOutcome {
                        item_id: item.id.clone(),
                        match_type: None,
                        movement_id: None,
                        confidence: None,
                    }
                }
            };
            results.push(outcome);
        }

        self.recompute_aggregates(statement_id).await?;

        let report = RunReport {
            statement_id: statement_id.to_string(),
            total_items: items.len(),
            matched,
            unmatched: items.len() - matched,
            suspense,
            results,
        };
        info!(
            statement_id,
            total = report.total_items,
            matched = report.matched,
            suspense = report.suspense,
            "statement run finished"
        );
        Ok(report)
    }

    /// Flag one missed line as suspense, adjusting the statement counter
    /// only when the flag is new. The line is re-read from storage so a
    /// racing writer's committed reconciliation is never overwritten; a
    /// line found already reconciled is left untouched. Returns whether
    /// the line was parked.
    async fn park_suspense(&mut self, item_id: &str) -> ReconciliationResult<bool> {
        let mut item = self.executor.get_item_required(item_id).await?;
        if item.reconciled {
            return Ok(false);
        }
        let newly_flagged = item.mark_suspense();

        let statement = if newly_flagged {
            let mut statement = self
                .executor
                .get_statement_required(&item.statement_id)
                .await?;
            statement.enter_suspense();
            Some(statement)
        } else {
            None
        };

        let unit = ReconciliationUnit {
            item,
            movement: None,
            statement,
        };
        self.executor.storage_mut().commit_unit(&unit).await?;

        Ok(true)
    }

    /// Recompute the statement's counters from its lines and persist them
    /// with the resulting lifecycle status
    async fn recompute_aggregates(&mut self, statement_id: &str) -> ReconciliationResult<()> {
        let items = self
            .executor
            .storage()
            .list_statement_items(statement_id, false)
            .await?;

        let mut statement = self.executor.get_statement_required(statement_id).await?;
        statement.items_reconciled = items.iter().filter(|i| i.reconciled).count() as u32;
        statement.items_pending = items.iter().filter(|i| !i.reconciled).count() as u32;
        statement.items_suspense = items.iter().filter(|i| i.is_open_suspense()).count() as u32;
        statement.refresh_status();

        self.executor
            .storage_mut()
            .update_statement(&statement)
            .await
    }
}
