//! Validation utilities

use crate::types::*;
use bigdecimal::BigDecimal;

/// Validate that an amount is strictly positive
pub fn validate_positive_amount(amount: &BigDecimal) -> ReconciliationResult<()> {
    if *amount <= BigDecimal::from(0) {
        Err(ReconciliationError::Validation(
            "Amount must be positive".to_string(),
        ))
    } else {
        Ok(())
    }
}

/// Validate that an amount (e.g. a tolerance) is not negative
pub fn validate_non_negative_amount(amount: &BigDecimal) -> ReconciliationResult<()> {
    if *amount < BigDecimal::from(0) {
        Err(ReconciliationError::Validation(
            "Amount cannot be negative".to_string(),
        ))
    } else {
        Ok(())
    }
}

/// Validate that an entity ID is usable
pub fn validate_id(id: &str, what: &str) -> ReconciliationResult<()> {
    if id.trim().is_empty() {
        return Err(ReconciliationError::Validation(format!(
            "{} ID cannot be empty",
            what
        )));
    }

    if id.len() > 64 {
        return Err(ReconciliationError::Validation(format!(
            "{} ID cannot exceed 64 characters",
            what
        )));
    }

    Ok(())
}

/// Validate the debit/credit pair of a statement line: both sides
/// non-negative and exactly one of them positive
pub fn validate_item_amounts(
    debit: &BigDecimal,
    credit: &BigDecimal,
) -> ReconciliationResult<()> {
    let zero = BigDecimal::from(0);
    if *debit < zero || *credit < zero {
        return Err(ReconciliationError::Validation(
            "Debit and credit amounts cannot be negative".to_string(),
        ));
    }
    match (*debit > zero, *credit > zero) {
        (true, true) => Err(ReconciliationError::Validation(
            "A statement line cannot carry both a debit and a credit".to_string(),
        )),
        (false, false) => Err(ReconciliationError::Validation(
            "A statement line must carry a debit or a credit".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Validate a suspense-resolution reason
pub fn validate_reason(reason: &str) -> ReconciliationResult<()> {
    if reason.trim().is_empty() {
        return Err(ReconciliationError::Validation(
            "Resolution reason cannot be empty".to_string(),
        ));
    }

    if reason.len() > 500 {
        return Err(ReconciliationError::Validation(
            "Resolution reason cannot exceed 500 characters".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_amounts_exactly_one_side() {
        let zero = BigDecimal::from(0);
        let hundred = BigDecimal::from(100);

        assert!(validate_item_amounts(&hundred, &zero).is_ok());
        assert!(validate_item_amounts(&zero, &hundred).is_ok());
        assert!(validate_item_amounts(&hundred, &hundred).is_err());
        assert!(validate_item_amounts(&zero, &zero).is_err());
        assert!(validate_item_amounts(&BigDecimal::from(-1), &zero).is_err());
    }

    #[test]
    fn test_reason_must_be_non_blank() {
        assert!(validate_reason("duplicate bank charge").is_ok());
        assert!(validate_reason("   ").is_err());
    }
}
