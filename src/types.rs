//! Core types and data structures for the reconciliation engine

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Lifecycle status of an imported bank statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatementStatus {
    /// Freshly imported, no reconciliation run has touched it yet
    #[serde(rename = "IMPORTED")]
    Imported,
    /// At least one run has happened and unreconciled lines remain
    #[serde(rename = "EN_PROCESO")]
    EnProceso,
    /// Every line of the statement is reconciled
    #[serde(rename = "COMPLETADA")]
    Completada,
}

/// Provenance of a reconciled link, in automatic-strategy priority order
/// plus the manual override
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchType {
    Exact,
    Fuzzy,
    Reference,
    Manual,
}

/// Direction of an internally recorded cash movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementDirection {
    /// Money entering the bank account
    #[serde(rename = "INGRESO")]
    Ingreso,
    /// Money leaving the bank account
    #[serde(rename = "EGRESO")]
    Egreso,
}

/// Tolerance window within which a FUZZY match is permitted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    /// Maximum absolute amount delta
    pub amount: BigDecimal,
    /// Maximum absolute day delta (inclusive)
    pub days: u32,
}

/// One imported bank statement for one bank account over a date range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankStatement {
    /// Unique identifier for the statement
    pub id: String,
    /// Bank account the statement belongs to
    pub bank_account_id: String,
    /// Owning company/tenant
    pub company_id: String,
    /// Amount tolerance applied to FUZZY matching of this statement's lines
    pub amount_tolerance: BigDecimal,
    /// Day tolerance applied to FUZZY matching of this statement's lines
    pub day_tolerance: u32,
    /// Lifecycle status
    pub status: StatementStatus,
    /// Count of reconciled lines
    pub items_reconciled: u32,
    /// Count of pending (unreconciled) lines; suspense lines are a subset
    pub items_pending: u32,
    /// Count of lines currently parked in suspense
    pub items_suspense: u32,
    /// When the statement was imported
    pub created_at: NaiveDateTime,
    /// When the statement was last updated
    pub updated_at: NaiveDateTime,
}

impl BankStatement {
    /// Create a new statement with `total_items` lines, all pending
    pub fn new(
        id: String,
        bank_account_id: String,
        company_id: String,
        amount_tolerance: BigDecimal,
        day_tolerance: u32,
        total_items: u32,
    ) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id,
            bank_account_id,
            company_id,
            amount_tolerance,
            day_tolerance,
            status: StatementStatus::Imported,
            items_reconciled: 0,
            items_pending: total_items,
            items_suspense: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Total line count (reconciled + pending at all times)
    pub fn total_items(&self) -> u32 {
        self.items_reconciled + self.items_pending
    }

    /// Tolerance window configured on this statement
    pub fn tolerance(&self) -> Tolerance {
        Tolerance {
            amount: self.amount_tolerance.clone(),
            days: self.day_tolerance,
        }
    }

    /// Move one line from pending to reconciled
    pub fn register_match(&mut self, was_suspense: bool) {
        self.items_reconciled += 1;
        self.items_pending = self.items_pending.saturating_sub(1);
        if was_suspense {
            self.items_suspense = self.items_suspense.saturating_sub(1);
        }
        self.refresh_status();
    }

    /// Move one line back from reconciled to pending (inverse of a match)
    pub fn register_unmatch(&mut self) {
        self.items_reconciled = self.items_reconciled.saturating_sub(1);
        self.items_pending += 1;
        self.refresh_status();
    }

    /// Record a line entering suspense
    pub fn enter_suspense(&mut self) {
        self.items_suspense += 1;
        self.refresh_status();
    }

    /// Record a line leaving suspense without being matched
    pub fn leave_suspense(&mut self) {
        self.items_suspense = self.items_suspense.saturating_sub(1);
        self.refresh_status();
    }

    /// Recompute the lifecycle status from the counters. COMPLETADA iff
    /// nothing is pending; a touched statement never regresses to IMPORTED.
    pub fn refresh_status(&mut self) {
        self.status = if self.items_pending == 0 {
            StatementStatus::Completada
        } else {
            StatementStatus::EnProceso
        };
        self.updated_at = chrono::Utc::now().naive_utc();
    }
}

/// One debit/credit line of a bank statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementItem {
    /// Unique identifier for the line
    pub id: String,
    /// Owning statement
    pub statement_id: String,
    /// Value date of the line
    pub value_date: NaiveDate,
    /// Debit amount (money leaving the account), zero when the line is a credit
    pub debit: BigDecimal,
    /// Credit amount (money entering the account), zero when the line is a debit
    pub credit: BigDecimal,
    /// Free-text bank reference code, when the bank supplied one
    pub reference: Option<String>,
    /// Free-text description from the bank file
    pub description: String,
    /// Whether the line is linked to a treasury movement
    pub reconciled: bool,
    /// Whether the line is parked in suspense awaiting human review
    pub is_suspense: bool,
    /// Historical marker: the line was administratively closed without a match
    pub suspense_resolved: bool,
    /// Human reason supplied when the suspense was resolved
    pub suspense_reason: Option<String>,
    /// User that resolved the suspense
    pub resolved_by: Option<String>,
    /// How the link was established
    pub match_type: Option<MatchType>,
    /// Match certainty in [0,1]
    pub confidence: Option<f64>,
    /// Linked treasury movement, bidirectional with `TreasuryMovement::item_id`
    pub movement_id: Option<String>,
    /// User that forced a manual link, for audit
    pub matched_by: Option<String>,
    /// When the line was imported
    pub created_at: NaiveDateTime,
    /// When the line was last updated
    pub updated_at: NaiveDateTime,
}

impl StatementItem {
    /// Create a new pending statement line
    pub fn new(
        id: String,
        statement_id: String,
        value_date: NaiveDate,
        debit: BigDecimal,
        credit: BigDecimal,
        reference: Option<String>,
        description: String,
    ) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id,
            statement_id,
            value_date,
            debit,
            credit,
            reference,
            description,
            reconciled: false,
            is_suspense: false,
            suspense_resolved: false,
            suspense_reason: None,
            resolved_by: None,
            match_type: None,
            confidence: None,
            movement_id: None,
            matched_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the line is a debit (money leaving the bank account)
    pub fn is_debit(&self) -> bool {
        self.debit > BigDecimal::from(0)
    }

    /// The non-zero side of the line
    pub fn amount(&self) -> &BigDecimal {
        if self.is_debit() {
            &self.debit
        } else {
            &self.credit
        }
    }

    /// Direction a counterpart movement must carry: a debit line settles
    /// against an outflow, a credit line against an inflow
    pub fn required_direction(&self) -> MovementDirection {
        if self.is_debit() {
            MovementDirection::Egreso
        } else {
            MovementDirection::Ingreso
        }
    }

    /// Whether the line sits in the open suspense queue
    pub fn is_open_suspense(&self) -> bool {
        self.is_suspense && !self.suspense_resolved
    }

    /// Link the line to a movement. Returns whether the line was in open
    /// suspense, so the caller can adjust the statement counter.
    pub fn apply_match(
        &mut self,
        match_type: MatchType,
        confidence: f64,
        movement_id: String,
    ) -> bool {
        let was_suspense = self.is_open_suspense();
        self.reconciled = true;
        self.match_type = Some(match_type);
        self.confidence = Some(confidence);
        self.movement_id = Some(movement_id);
        self.is_suspense = false;
        self.updated_at = chrono::Utc::now().naive_utc();
        was_suspense
    }

    /// Park the line in suspense, leaving it unreconciled/pending.
    /// Returns whether the line was newly flagged.
    pub fn mark_suspense(&mut self) -> bool {
        let newly_flagged = !self.is_suspense;
        self.is_suspense = true;
        self.updated_at = chrono::Utc::now().naive_utc();
        newly_flagged
    }

    /// Administratively close the line without creating a movement and
    /// without reconciling it. Returns whether it was in open suspense.
    pub fn resolve_suspense(&mut self, reason: String, resolved_by: String) -> bool {
        let was_open = self.is_open_suspense();
        self.suspense_resolved = true;
        self.suspense_reason = Some(reason);
        self.resolved_by = Some(resolved_by);
        self.is_suspense = false;
        self.updated_at = chrono::Utc::now().naive_utc();
        was_open
    }

    /// Clear the link, restoring the line to its pre-match pending state
    pub fn clear_match(&mut self) {
        self.reconciled = false;
        self.match_type = None;
        self.confidence = None;
        self.movement_id = None;
        self.matched_by = None;
        self.updated_at = chrono::Utc::now().naive_utc();
    }
}

/// One internally recorded cash movement in the treasury ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreasuryMovement {
    /// Unique identifier for the movement
    pub id: String,
    /// Bank account the movement belongs to
    pub bank_account_id: String,
    /// Owning company/tenant
    pub company_id: String,
    /// Inflow or outflow
    pub direction: MovementDirection,
    /// Movement amount, always positive
    pub amount: BigDecimal,
    /// Value date of the movement
    pub value_date: NaiveDate,
    /// Payment channel/medium (free-form category, e.g. TRANSFERENCIA, COMISION)
    pub channel: String,
    /// Reference code, when the recording process supplied one
    pub reference: Option<String>,
    /// Human description of the movement
    pub description: String,
    /// Caller-supplied category label for movements created from suspense
    pub category: Option<String>,
    /// Whether the movement is linked to a statement line
    pub reconciled: bool,
    /// Linked statement line, bidirectional with `StatementItem::movement_id`
    pub item_id: Option<String>,
    /// User that created the movement, for engine-created movements
    pub created_by: Option<String>,
    /// When the movement was recorded
    pub created_at: NaiveDateTime,
    /// When the movement was last updated
    pub updated_at: NaiveDateTime,
}

impl TreasuryMovement {
    /// Create a new unreconciled movement
    pub fn new(
        id: String,
        bank_account_id: String,
        company_id: String,
        direction: MovementDirection,
        amount: BigDecimal,
        value_date: NaiveDate,
        channel: String,
        description: String,
    ) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id,
            bank_account_id,
            company_id,
            direction,
            amount,
            value_date,
            channel,
            reference: None,
            description,
            category: None,
            reconciled: false,
            item_id: None,
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Mark the movement as settled against a statement line
    pub fn link(&mut self, item_id: String) {
        self.reconciled = true;
        self.item_id = Some(item_id);
        self.updated_at = chrono::Utc::now().naive_utc();
    }

    /// Clear the settlement link
    pub fn unlink(&mut self) {
        self.reconciled = false;
        self.item_id = None;
        self.updated_at = chrono::Utc::now().naive_utc();
    }
}

/// Outcome of one applied match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub item_id: String,
    pub movement_id: String,
    pub match_type: MatchType,
    pub confidence: f64,
}

/// Per-line result of a statement run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemOutcome {
    pub item_id: String,
    pub match_type: Option<MatchType>,
    pub movement_id: Option<String>,
    pub confidence: Option<f64>,
}

/// Report produced by one automatic statement run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub statement_id: String,
    /// Lines processed by this run (the unreconciled lines at its start)
    pub total_items: usize,
    pub matched: usize,
    pub unmatched: usize,
    /// Lines left in open suspense by this run
    pub suspense: usize,
    pub results: Vec<ItemOutcome>,
}

/// Matched-line counts broken down by match type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchTypeBreakdown {
    pub exact: usize,
    pub fuzzy: usize,
    pub reference: usize,
    pub manual: usize,
}

impl MatchTypeBreakdown {
    /// Count one matched line under its type
    pub fn record(&mut self, match_type: MatchType) {
        match match_type {
            MatchType::Exact => self.exact += 1,
            MatchType::Fuzzy => self.fuzzy += 1,
            MatchType::Reference => self.reference += 1,
            MatchType::Manual => self.manual += 1,
        }
    }
}

/// Snapshot of a statement's reconciliation state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationSummary {
    pub statement_id: String,
    pub total_items: usize,
    pub matched: usize,
    pub pending: usize,
    /// Lines currently flagged suspense and not yet resolved
    pub suspense: usize,
    pub suspense_resolved: usize,
    pub by_match_type: MatchTypeBreakdown,
}

/// Additive filters for listing unreconciled movements. Omitted fields
/// impose no constraint; range bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MovementFilter {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub direction: Option<MovementDirection>,
    pub amount_min: Option<BigDecimal>,
    pub amount_max: Option<BigDecimal>,
}

impl MovementFilter {
    /// Whether a movement passes every present constraint
    pub fn accepts(&self, movement: &TreasuryMovement) -> bool {
        if let Some(from) = self.date_from {
            if movement.value_date < from {
                return false;
            }
        }
        if let Some(to) = self.date_to {
            if movement.value_date > to {
                return false;
            }
        }
        if let Some(direction) = self.direction {
            if movement.direction != direction {
                return false;
            }
        }
        if let Some(ref min) = self.amount_min {
            if movement.amount < *min {
                return false;
            }
        }
        if let Some(ref max) = self.amount_max {
            if movement.amount > *max {
                return false;
            }
        }
        true
    }
}

/// Errors that can occur in the reconciliation engine
#[derive(Debug, thiserror::Error)]
pub enum ReconciliationError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Statement not found: {0}")]
    StatementNotFound(String),
    #[error("Statement item not found: {0}")]
    ItemNotFound(String),
    #[error("Treasury movement not found: {0}")]
    MovementNotFound(String),
    #[error("Statement item already reconciled: {0}")]
    ItemAlreadyReconciled(String),
    #[error("Treasury movement already reconciled: {0}")]
    MovementAlreadyReconciled(String),
    #[error("Statement item is not reconciled: {0}")]
    ItemNotReconciled(String),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type for reconciliation operations
pub type ReconciliationResult<T> = Result<T, ReconciliationError>;
