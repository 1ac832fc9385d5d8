//! Manual override operations
//!
//! Human-driven counterparts to the automatic run: force-link two
//! records, undo a link, close a suspense line without a movement, or
//! manufacture a ledger movement directly from a suspense line.

use tracing::info;
use uuid::Uuid;

use crate::engine::executor::MatchExecutor;
use crate::traits::*;
use crate::types::*;
use crate::utils::validation;

/// Confidence recorded on every manual match
pub const MANUAL_CONFIDENCE: f64 = 1.0;

/// Operator-driven reconciliation operations
pub struct ManualOperations<S: ReconciliationStorage> {
    executor: MatchExecutor<S>,
    classifier: Box<dyn ChannelClassifier>,
}

impl<S: ReconciliationStorage> ManualOperations<S> {
    /// Create manual operations with the default keyword channel classifier
    pub fn new(storage: S) -> Self {
        Self::with_classifier(storage, Box::new(KeywordChannelClassifier::default()))
    }

    /// Create manual operations with a custom channel classifier
    pub fn with_classifier(storage: S, classifier: Box<dyn ChannelClassifier>) -> Self {
        Self {
            executor: MatchExecutor::new(storage),
            classifier,
        }
    }

    /// Force-link a statement line to a movement on behalf of a user.
    /// Both sides must exist and be unreconciled.
    pub async fn manual_match(
        &mut self,
        item_id: &str,
        movement_id: &str,
        user_id: &str,
    ) -> ReconciliationResult<MatchResult> {
        let result = self
            .executor
            .apply_match(
                item_id,
                movement_id,
                MatchType::Manual,
                MANUAL_CONFIDENCE,
                Some(user_id),
            )
            .await?;
        info!(item_id, movement_id, user_id, "manual match applied");
        Ok(result)
    }

    /// Undo an existing link, restoring both sides to their pre-match
    /// state for audit and correction purposes
    pub async fn unmatch(&mut self, item_id: &str) -> ReconciliationResult<()> {
        self.executor.revert_match(item_id).await?;
        info!(item_id, "match undone");
        Ok(())
    }

    /// Administratively close a suspense line with a human reason,
    /// without creating or touching any movement and without reconciling
    /// the line
    pub async fn resolve_suspense(
        &mut self,
        item_id: &str,
        reason: &str,
        user_id: &str,
    ) -> ReconciliationResult<()> {
        validation::validate_reason(reason)?;

        let mut item = self.executor.get_item_required(item_id).await?;
        let was_open = item.resolve_suspense(reason.to_string(), user_id.to_string());

        let statement = if was_open {
            let mut statement = self
                .executor
                .get_statement_required(&item.statement_id)
                .await?;
            statement.leave_suspense();
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

        info!(item_id, user_id, "suspense resolved");
        Ok(())
    }

    /// Manufacture a brand-new treasury movement from a suspense line and
    /// reconcile the line against it in the same step. The payment channel
    /// is inferred from the line's description; direction and amount come
    /// from its non-zero side. Returns the new movement's id.
    pub async fn create_movement_from_suspense(
        &mut self,
        item_id: &str,
        category: &str,
        description: &str,
        user_id: &str,
    ) -> ReconciliationResult<String> {
        let mut item = self.executor.get_item_required(item_id).await?;
        if item.reconciled {
            return Err(ReconciliationError::ItemAlreadyReconciled(
                item_id.to_string(),
            ));
        }
        validation::validate_positive_amount(item.amount())?;

        let mut statement = self
            .executor
            .get_statement_required(&item.statement_id)
            .await?;

        let movement_id = Uuid::new_v4().to_string();
        let movement_description = if description.trim().is_empty() {
            item.description.clone()
        } else {
            description.to_string()
        };

        let mut movement = TreasuryMovement::new(
            movement_id.clone(),
            statement.bank_account_id.clone(),
            statement.company_id.clone(),
            item.required_direction(),
            item.amount().clone(),
            item.value_date,
            self.classifier.classify(&item.description),
            movement_description,
        );
        movement.category = Some(category.to_string());
        movement.reference = item.reference.clone();
        movement.created_by = Some(user_id.to_string());
        movement.link(item.id.clone());

        // Keep a prior match type/confidence when the line carries one,
        // otherwise mark the link as manual.
        let match_type = item.match_type.unwrap_or(MatchType::Manual);
        let confidence = item.confidence.unwrap_or(MANUAL_CONFIDENCE);
        let was_suspense = item.apply_match(match_type, confidence, movement_id.clone());
        item.matched_by = Some(user_id.to_string());

        statement.register_match(was_suspense);

        let unit = ReconciliationUnit {
            item,
            movement: Some(movement),
            statement: Some(statement),
        };
        self.executor.storage_mut().commit_unit(&unit).await?;

        info!(item_id, movement_id = %movement_id, user_id, "movement created from suspense");
        Ok(movement_id)
    }
}
