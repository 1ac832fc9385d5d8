//! Main engine facade that coordinates matching, execution, and reporting

use bigdecimal::BigDecimal;

use crate::engine::manual::ManualOperations;
use crate::engine::query::ReconciliationQueries;
use crate::engine::run::StatementRunner;
use crate::traits::*;
use crate::types::*;
use crate::utils::validation;

/// Main reconciliation engine tying the statement run controller, the
/// manual override operations, and the query surface over one storage
/// backend
pub struct ReconciliationEngine<S: ReconciliationStorage + Clone> {
    runner: StatementRunner<S>,
    manual: ManualOperations<S>,
    queries: ReconciliationQueries<S>,
    storage: S,
}

impl<S: ReconciliationStorage + Clone> ReconciliationEngine<S> {
    /// Create a new engine with the given storage backend and the default
    /// keyword channel classifier.
    ///
    /// The backend's `Clone` must produce handles over one shared store,
    /// as [`MemoryStorage`](crate::utils::memory_storage::MemoryStorage)
    /// does with its inner `Arc`; a deep-copying clone would leave the
    /// engine's sub-components writing to diverging stores.
    pub fn new(storage: S) -> Self {
        Self {
            runner: StatementRunner::new(storage.clone()),
            manual: ManualOperations::new(storage.clone()),
            queries: ReconciliationQueries::new(storage.clone()),
            storage,
        }
    }

    /// Create a new engine with a custom channel classifier
    pub fn with_classifier(storage: S, classifier: Box<dyn ChannelClassifier>) -> Self {
        Self {
            runner: StatementRunner::new(storage.clone()),
            manual: ManualOperations::with_classifier(storage.clone(), classifier),
            queries: ReconciliationQueries::new(storage.clone()),
            storage,
        }
    }

    // Registration operations
    /// Register a freshly imported statement with no lines yet; lines
    /// added through [`register_item`](Self::register_item) keep the
    /// pending counter in step
    pub async fn register_statement(
        &mut self,
        id: String,
        bank_account_id: String,
        company_id: String,
        amount_tolerance: BigDecimal,
        day_tolerance: u32,
    ) -> ReconciliationResult<BankStatement> {
        validation::validate_id(&id, "statement")?;
        validation::validate_id(&bank_account_id, "bank account")?;
        validation::validate_id(&company_id, "company")?;
        validation::validate_non_negative_amount(&amount_tolerance)?;

        if self.storage.get_statement(&id).await?.is_some() {
            return Err(ReconciliationError::Validation(format!(
                "Statement with ID '{}' already exists",
                id
            )));
        }

        let statement = BankStatement::new(
            id,
            bank_account_id,
            company_id,
            amount_tolerance,
            day_tolerance,
            0,
        );
        self.storage.save_statement(&statement).await?;
        Ok(statement)
    }

    /// Register one statement line against an existing statement,
    /// incrementing the statement's pending counter in the same unit
    pub async fn register_item(&mut self, item: StatementItem) -> ReconciliationResult<()> {
        validation::validate_id(&item.id, "item")?;
        validation::validate_item_amounts(&item.debit, &item.credit)?;

        if self.storage.get_item(&item.id).await?.is_some() {
            return Err(ReconciliationError::Validation(format!(
                "Statement item with ID '{}' already exists",
                item.id
            )));
        }

        let mut statement = self
            .storage
            .get_statement(&item.statement_id)
            .await?
            .ok_or_else(|| {
                ReconciliationError::StatementNotFound(item.statement_id.clone())
            })?;
        statement.items_pending += 1;
        statement.updated_at = chrono::Utc::now().naive_utc();

        let unit = ReconciliationUnit {
            item,
            movement: None,
            statement: Some(statement),
        };
        self.storage.commit_unit(&unit).await
    }

    /// Register a treasury movement recorded by an upstream process
    pub async fn register_movement(
        &mut self,
        movement: TreasuryMovement,
    ) -> ReconciliationResult<()> {
        validation::validate_id(&movement.id, "movement")?;
        validation::validate_id(&movement.bank_account_id, "bank account")?;
        validation::validate_positive_amount(&movement.amount)?;

        if self.storage.get_movement(&movement.id).await?.is_some() {
            return Err(ReconciliationError::Validation(format!(
                "Treasury movement with ID '{}' already exists",
                movement.id
            )));
        }

        self.storage.save_movement(&movement).await
    }

    // Reconciliation operations
    /// Run the automatic matcher over every unreconciled line of a
    /// statement
    pub async fn auto_match_statement_items(
        &mut self,
        statement_id: &str,
    ) -> ReconciliationResult<RunReport> {
        self.runner.auto_match_statement_items(statement_id).await
    }

    /// Force-link a statement line to a movement on behalf of a user
    pub async fn manual_match(
        &mut self,
        item_id: &str,
        movement_id: &str,
        user_id: &str,
    ) -> ReconciliationResult<MatchResult> {
        self.manual.manual_match(item_id, movement_id, user_id).await
    }

    /// Undo an existing link
    pub async fn unmatch(&mut self, item_id: &str) -> ReconciliationResult<()> {
        self.manual.unmatch(item_id).await
    }

    /// Administratively close a suspense line without a movement
    pub async fn resolve_suspense(
        &mut self,
        item_id: &str,
        reason: &str,
        user_id: &str,
    ) -> ReconciliationResult<()> {
        self.manual.resolve_suspense(item_id, reason, user_id).await
    }

    /// Manufacture a new movement from a suspense line and reconcile the
    /// line against it; returns the new movement's id
    pub async fn create_movement_from_suspense(
        &mut self,
        item_id: &str,
        category: &str,
        description: &str,
        user_id: &str,
    ) -> ReconciliationResult<String> {
        self.manual
            .create_movement_from_suspense(item_id, category, description, user_id)
            .await
    }

    // Query operations
    /// List unreconciled movements for a bank account under optional
    /// filters, newest first
    pub async fn get_unmatched_movements(
        &self,
        bank_account_id: &str,
        filter: Option<&MovementFilter>,
    ) -> ReconciliationResult<Vec<TreasuryMovement>> {
        self.queries
            .get_unmatched_movements(bank_account_id, filter)
            .await
    }

    /// Summarize a statement's reconciliation state
    pub async fn get_reconciliation_summary(
        &self,
        statement_id: &str,
    ) -> ReconciliationResult<ReconciliationSummary> {
        self.queries.get_reconciliation_summary(statement_id).await
    }

    // Entity lookups
    /// Get a statement by ID
    pub async fn get_statement(
        &self,
        statement_id: &str,
    ) -> ReconciliationResult<Option<BankStatement>> {
        self.storage.get_statement(statement_id).await
    }

    /// Get a statement line by ID
    pub async fn get_item(&self, item_id: &str) -> ReconciliationResult<Option<StatementItem>> {
        self.storage.get_item(item_id).await
    }

    /// Get a treasury movement by ID
    pub async fn get_movement(
        &self,
        movement_id: &str,
    ) -> ReconciliationResult<Option<TreasuryMovement>> {
        self.storage.get_movement(movement_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::memory_storage::MemoryStorage;
    use chrono::NaiveDate;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, day).unwrap()
    }

    #[tokio::test]
    async fn test_engine_basic_run() {
        let storage = MemoryStorage::new();
        let mut engine = ReconciliationEngine::new(storage);

        engine
            .register_statement(
                "stmt-1".to_string(),
                "acct-1".to_string(),
                "co-1".to_string(),
                BigDecimal::from(10),
                3,
            )
            .await
            .unwrap();

        engine
            .register_item(StatementItem::new(
                "item-1".to_string(),
                "stmt-1".to_string(),
                date(15),
                BigDecimal::from(5000),
                BigDecimal::from(0),
                None,
                "PAGO PROVEEDOR".to_string(),
            ))
            .await
            .unwrap();

        engine
            .register_movement(TreasuryMovement::new(
                "mov-1".to_string(),
                "acct-1".to_string(),
                "co-1".to_string(),
                MovementDirection::Egreso,
                BigDecimal::from(5000),
                date(15),
                "TRANSFERENCIA".to_string(),
                "Pago proveedor".to_string(),
            ))
            .await
            .unwrap();

        let report = engine.auto_match_statement_items("stmt-1").await.unwrap();
        assert_eq!(report.matched, 1);
        assert_eq!(report.unmatched, 0);

        let statement = engine.get_statement("stmt-1").await.unwrap().unwrap();
        assert_eq!(statement.status, StatementStatus::Completada);
        assert_eq!(statement.items_reconciled, 1);
        assert_eq!(statement.items_pending, 0);

        let item = engine.get_item("item-1").await.unwrap().unwrap();
        assert_eq!(item.match_type, Some(MatchType::Exact));
        assert_eq!(item.movement_id.as_deref(), Some("mov-1"));

        let movement = engine.get_movement("mov-1").await.unwrap().unwrap();
        assert!(movement.reconciled);
        assert_eq!(movement.item_id.as_deref(), Some("item-1"));
    }

    #[tokio::test]
    async fn test_register_item_rejects_double_sided_line() {
        let storage = MemoryStorage::new();
        let mut engine = ReconciliationEngine::new(storage);

        engine
            .register_statement(
                "stmt-1".to_string(),
                "acct-1".to_string(),
                "co-1".to_string(),
                BigDecimal::from(0),
                0,
            )
            .await
            .unwrap();

        let result = engine
            .register_item(StatementItem::new(
                "item-1".to_string(),
                "stmt-1".to_string(),
                date(15),
                BigDecimal::from(100),
                BigDecimal::from(100),
                None,
                "AMBIGUOUS".to_string(),
            ))
            .await;

        assert!(matches!(result, Err(ReconciliationError::Validation(_))));
    }

    #[tokio::test]
    async fn test_unknown_statement_run_fails() {
        let storage = MemoryStorage::new();
        let mut engine = ReconciliationEngine::new(storage);

        let result = engine.auto_match_statement_items("missing").await;
        assert!(matches!(
            result,
            Err(ReconciliationError::StatementNotFound(_))
        ));
    }
}
