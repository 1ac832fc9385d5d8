//! Traits for storage abstraction and extensibility

use async_trait::async_trait;

use crate::types::*;

/// The set of rows one reconciliation operation writes together.
///
/// A backend must apply every present record in one atomic unit: either
/// the item, its counterpart movement, and the owning statement's counters
/// all commit, or none do. This is how the engine expresses the
/// item + movement + statement transactional contract without owning a
/// database handle itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciliationUnit {
    pub item: StatementItem,
    pub movement: Option<TreasuryMovement>,
    pub statement: Option<BankStatement>,
}

impl ReconciliationUnit {
    /// Unit touching only the item row
    pub fn item_only(item: StatementItem) -> Self {
        Self {
            item,
            movement: None,
            statement: None,
        }
    }
}

/// Storage abstraction for the reconciliation engine
///
/// This trait allows the engine to work with any storage backend
/// (PostgreSQL, MySQL, SQLite, in-memory, etc.) by implementing these
/// methods. Writers take `&mut self`; concurrent mutation of the same
/// records is serialized by exclusive access or by the backend's own
/// transaction isolation.
#[async_trait]
pub trait ReconciliationStorage: Send + Sync {
    /// Save a bank statement to storage
    async fn save_statement(&mut self, statement: &BankStatement) -> ReconciliationResult<()>;

    /// Get a statement by ID
    async fn get_statement(&self, statement_id: &str) -> ReconciliationResult<Option<BankStatement>>;

    /// Update a statement
    async fn update_statement(&mut self, statement: &BankStatement) -> ReconciliationResult<()>;

    /// Save a statement item to storage
    async fn save_item(&mut self, item: &StatementItem) -> ReconciliationResult<()>;

    /// Get a statement item by ID
    async fn get_item(&self, item_id: &str) -> ReconciliationResult<Option<StatementItem>>;

    /// List the items of a statement in input order, optionally restricted
    /// to unreconciled ones
    async fn list_statement_items(
        &self,
        statement_id: &str,
        only_unreconciled: bool,
    ) -> ReconciliationResult<Vec<StatementItem>>;

    /// Save a treasury movement to storage
    async fn save_movement(&mut self, movement: &TreasuryMovement) -> ReconciliationResult<()>;

    /// Get a treasury movement by ID
    async fn get_movement(
        &self,
        movement_id: &str,
    ) -> ReconciliationResult<Option<TreasuryMovement>>;

    /// List the unreconciled movements of one bank account, optionally
    /// restricted to one tenant. This is the matcher's candidate pool.
    async fn list_unreconciled_movements(
        &self,
        bank_account_id: &str,
        company_id: Option<&str>,
    ) -> ReconciliationResult<Vec<TreasuryMovement>>;

    /// Apply one operation's writes atomically: every record present in
    /// the unit commits together or not at all
    async fn commit_unit(&mut self, unit: &ReconciliationUnit) -> ReconciliationResult<()>;
}

/// Infers the payment channel of a movement from free-text description
pub trait ChannelClassifier: Send + Sync {
    /// Map a statement-line description to a channel category
    fn classify(&self, description: &str) -> String;
}

/// Default classifier: case-insensitive keyword containment, first rule
/// wins, falling back to an adjustment channel
pub struct KeywordChannelClassifier {
    rules: Vec<(String, String)>,
    fallback: String,
}

impl KeywordChannelClassifier {
    /// Classifier with custom rules, each `(keyword, channel)`
    pub fn new(rules: Vec<(String, String)>, fallback: String) -> Self {
        Self { rules, fallback }
    }
}

impl Default for KeywordChannelClassifier {
    fn default() -> Self {
        let rules = ["COMISION", "INTERES", "TRANSFERENCIA", "IMPUESTO"]
            .iter()
            .map(|k| (k.to_string(), k.to_string()))
            .collect();
        Self::new(rules, "AJUSTE".to_string())
    }
}

impl ChannelClassifier for KeywordChannelClassifier {
    fn classify(&self, description: &str) -> String {
        let normalized = description.to_uppercase();
        self.rules
            .iter()
            .find(|(keyword, _)| normalized.contains(keyword.as_str()))
            .map(|(_, channel)| channel.clone())
            .unwrap_or_else(|| self.fallback.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_classifier_known_channels() {
        let classifier = KeywordChannelClassifier::default();
        assert_eq!(
            classifier.classify("COMISION MANTENIMIENTO CUENTA"),
            "COMISION"
        );
        assert_eq!(classifier.classify("interes cuenta corriente"), "INTERES");
        assert_eq!(classifier.classify("Transferencia recibida"), "TRANSFERENCIA");
    }

    #[test]
    fn test_keyword_classifier_fallback() {
        let classifier = KeywordChannelClassifier::default();
        assert_eq!(classifier.classify("PAGO NOMINA ENERO"), "AJUSTE");
        assert_eq!(classifier.classify(""), "AJUSTE");
    }
}
