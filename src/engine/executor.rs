//! Atomic application and reversal of decided matches

use tracing::debug;

use crate::traits::*;
use crate::types::*;

/// Applies a decided match (automatic or manual) to an item/movement pair:
/// links both sides, flips the reconciled flags, records match metadata,
/// and adjusts the owning statement's counters, all as one storage unit.
pub struct MatchExecutor<S: ReconciliationStorage> {
    storage: S,
}

impl<S: ReconciliationStorage> MatchExecutor<S> {
    /// Create a new executor over the given storage backend
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Apply one decided match. Rejects either side if it is already
    /// reconciled; otherwise the item, the movement, and the statement
    /// counters commit together.
    pub async fn apply_match(
        &mut self,
        item_id: &str,
        movement_id: &str,
        match_type: MatchType,
        confidence: f64,
        acting_user: Option<&str>,
    ) -> ReconciliationResult<MatchResult> {
        let mut item = self.get_item_required(item_id).await?;
        if item.reconciled {
            return Err(ReconciliationError::ItemAlreadyReconciled(
                item_id.to_string(),
            ));
        }

        let mut movement = self.get_movement_required(movement_id).await?;
        if movement.reconciled {
            return Err(ReconciliationError::MovementAlreadyReconciled(
                movement_id.to_string(),
            ));
        }

        let mut statement = self.get_statement_required(&item.statement_id).await?;

        let was_suspense = item.apply_match(match_type, confidence, movement_id.to_string());
        if let Some(user) = acting_user {
            item.matched_by = Some(user.to_string());
        }
        movement.link(item_id.to_string());
        statement.register_match(was_suspense);

        let unit = ReconciliationUnit {
            item,
            movement: Some(movement),
            statement: Some(statement),
        };
        self.storage.commit_unit(&unit).await?;

        debug!(
            item_id,
            movement_id,
            ?match_type,
            confidence,
            "match applied"
        );

        Ok(MatchResult {
            item_id: item_id.to_string(),
            movement_id: movement_id.to_string(),
            match_type,
            confidence,
        })
    }

    /// Undo an existing link: the exact inverse of a successful match.
    /// Tolerates an item whose linked movement no longer resolves, in
    /// which case only the item side is cleared.
    pub async fn revert_match(&mut self, item_id: &str) -> ReconciliationResult<()> {
        let mut item = self.get_item_required(item_id).await?;
        if !item.reconciled {
            return Err(ReconciliationError::ItemNotReconciled(item_id.to_string()));
        }

        let movement = match item.movement_id.as_deref() {
            Some(movement_id) => self.storage.get_movement(movement_id).await?.map(|mut m| {
                m.unlink();
                m
            }),
            None => None,
        };

        let mut statement = self.get_statement_required(&item.statement_id).await?;

        item.clear_match();
        statement.register_unmatch();

        let unit = ReconciliationUnit {
            item,
            movement,
            statement: Some(statement),
        };
        self.storage.commit_unit(&unit).await?;

        debug!(item_id, "match reverted");
        Ok(())
    }

    pub(crate) async fn get_item_required(
        &self,
        item_id: &str,
    ) -> ReconciliationResult<StatementItem> {
        self.storage
            .get_item(item_id)
            .await?
            .ok_or_else(|| ReconciliationError::ItemNotFound(item_id.to_string()))
    }

    pub(crate) async fn get_movement_required(
        &self,
        movement_id: &str,
    ) -> ReconciliationResult<TreasuryMovement> {
        self.storage
            .get_movement(movement_id)
            .await?
            .ok_or_else(|| ReconciliationError::MovementNotFound(movement_id.to_string()))
    }

    pub(crate) async fn get_statement_required(
        &self,
        statement_id: &str,
    ) -> ReconciliationResult<BankStatement> {
        self.storage
            .get_statement(statement_id)
            .await?
            .ok_or_else(|| ReconciliationError::StatementNotFound(statement_id.to_string()))
    }

    pub(crate) fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub(crate) fn storage(&self) -> &S {
        &self.storage
    }
}
