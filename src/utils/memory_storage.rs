//! In-memory storage implementation for testing

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::traits::*;
use crate::types::*;

#[derive(Debug, Default)]
struct Inner {
    statements: HashMap<String, BankStatement>,
    items: HashMap<String, StatementItem>,
    movements: HashMap<String, TreasuryMovement>,
}

/// In-memory storage implementation for testing and development.
///
/// All three entity maps live behind one lock so that `commit_unit`
/// applies an operation's writes under a single critical section: no
/// reader observes a partially applied unit.
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStorage {
    /// Create a new memory storage instance
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
        }
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) {
        let mut inner = self.inner.write().unwrap();
        inner.statements.clear();
        inner.items.clear();
        inner.movements.clear();
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReconciliationStorage for MemoryStorage {
    async fn save_statement(&mut self, statement: &BankStatement) -> ReconciliationResult<()> {
        self.inner
            .write()
            .unwrap()
            .statements
            .insert(statement.id.clone(), statement.clone());
        Ok(())
    }

    async fn get_statement(
        &self,
        statement_id: &str,
    ) -> ReconciliationResult<Option<BankStatement>> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .statements
            .get(statement_id)
            .cloned())
    }

    async fn update_statement(&mut self, statement: &BankStatement) -> ReconciliationResult<()> {
        let mut inner = self.inner.write().unwrap();
        if inner.statements.contains_key(&statement.id) {
            inner
                .statements
                .insert(statement.id.clone(), statement.clone());
            Ok(())
        } else {
            Err(ReconciliationError::StatementNotFound(statement.id.clone()))
        }
    }

    async fn save_item(&mut self, item: &StatementItem) -> ReconciliationResult<()> {
        self.inner
            .write()
            .unwrap()
            .items
            .insert(item.id.clone(), item.clone());
        Ok(())
    }

    async fn get_item(&self, item_id: &str) -> ReconciliationResult<Option<StatementItem>> {
        Ok(self.inner.read().unwrap().items.get(item_id).cloned())
    }

    async fn list_statement_items(
        &self,
        statement_id: &str,
        only_unreconciled: bool,
    ) -> ReconciliationResult<Vec<StatementItem>> {
        let inner = self.inner.read().unwrap();
        let mut items: Vec<StatementItem> = inner
            .items
            .values()
            .filter(|item| {
                item.statement_id == statement_id && (!only_unreconciled || !item.reconciled)
            })
            .cloned()
            .collect();
        // Import order is carried by the line ids
        items.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(items)
    }

    async fn save_movement(&mut self, movement: &TreasuryMovement) -> ReconciliationResult<()> {
        self.inner
            .write()
            .unwrap()
            .movements
            .insert(movement.id.clone(), movement.clone());
        Ok(())
    }

    async fn get_movement(
        &self,
        movement_id: &str,
    ) -> ReconciliationResult<Option<TreasuryMovement>> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .movements
            .get(movement_id)
            .cloned())
    }

    async fn list_unreconciled_movements(
        &self,
        bank_account_id: &str,
        company_id: Option<&str>,
    ) -> ReconciliationResult<Vec<TreasuryMovement>> {
        let inner = self.inner.read().unwrap();
        let mut movements: Vec<TreasuryMovement> = inner
            .movements
            .values()
            .filter(|movement| {
                !movement.reconciled
                    && movement.bank_account_id == bank_account_id
                    && company_id.is_none_or(|c| movement.company_id == c)
            })
            .cloned()
            .collect();
        movements.sort_by(|a, b| a.value_date.cmp(&b.value_date).then_with(|| a.id.cmp(&b.id)));
        Ok(movements)
    }

    async fn commit_unit(&mut self, unit: &ReconciliationUnit) -> ReconciliationResult<()> {
        let mut inner = self.inner.write().unwrap();
        inner.items.insert(unit.item.id.clone(), unit.item.clone());
        if let Some(ref movement) = unit.movement {
            inner
                .movements
                .insert(movement.id.clone(), movement.clone());
        }
        if let Some(ref statement) = unit.statement {
            inner
                .statements
                .insert(statement.id.clone(), statement.clone());
        }
        Ok(())
    }
}
