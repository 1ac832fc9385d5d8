//! Tolerance-aware matching strategies
//!
//! Pure decision logic: given one unreconciled statement line and the
//! candidate pool of unreconciled movements on the same bank account,
//! decide whether they correspond and with what confidence. Strategies
//! are tried in fixed priority order (EXACT, FUZZY, REFERENCE) and the
//! chain stops at the first hit.

use bigdecimal::{BigDecimal, ToPrimitive};

use crate::types::*;

/// Confidence assigned to every REFERENCE hit
pub const REFERENCE_CONFIDENCE: f64 = 0.7;

// FUZZY confidence lives in the open interval (0,1): 1.0 is reserved for
// EXACT and a hit inside the tolerance window must never score 0.
const FUZZY_FLOOR: f64 = 0.01;
const FUZZY_CEIL: f64 = 0.99;

/// A discovered candidate match for one statement line
#[derive(Debug, Clone, PartialEq)]
pub struct MatchCandidate {
    pub movement_id: String,
    pub match_type: MatchType,
    pub confidence: f64,
}

/// Run the strategy chain for one line against the candidate pool.
///
/// The pool is expected to be pre-filtered to the line's bank account and
/// tenant; direction and reconciled-state eligibility are enforced here.
pub fn find_match(
    item: &StatementItem,
    pool: &[TreasuryMovement],
    tolerance: &Tolerance,
) -> Option<MatchCandidate> {
    let candidates: Vec<&TreasuryMovement> = pool
        .iter()
        .filter(|movement| eligible(item, movement))
        .collect();

    if candidates.is_empty() {
        return None;
    }

    exact_match(item, &candidates)
        .or_else(|| fuzzy_match(item, &candidates, tolerance))
        .or_else(|| reference_match(item, &candidates))
}

/// A debit line settles only against an outflow, a credit line only
/// against an inflow; already-settled movements never qualify
fn eligible(item: &StatementItem, movement: &TreasuryMovement) -> bool {
    !movement.reconciled && movement.direction == item.required_direction()
}

/// EXACT: same amount and same calendar day. Confidence 1.0.
fn exact_match(item: &StatementItem, candidates: &[&TreasuryMovement]) -> Option<MatchCandidate> {
    candidates
        .iter()
        .filter(|m| m.amount == *item.amount() && m.value_date == item.value_date)
        .min_by(|a, b| a.id.cmp(&b.id))
        .map(|m| MatchCandidate {
            movement_id: m.id.clone(),
            match_type: MatchType::Exact,
            confidence: 1.0,
        })
}

/// FUZZY: amount and date each inside the configured tolerance window
/// (inclusive). The best-scoring candidate wins; ties break toward the
/// earliest date, then the lowest id.
fn fuzzy_match(
    item: &StatementItem,
    candidates: &[&TreasuryMovement],
    tolerance: &Tolerance,
) -> Option<MatchCandidate> {
    let mut best: Option<(f64, &TreasuryMovement)> = None;

    for movement in candidates {
        let amount_delta = (&movement.amount - item.amount()).abs();
        let day_delta = (movement.value_date - item.value_date).num_days().abs();

        if amount_delta > tolerance.amount || day_delta > i64::from(tolerance.days) {
            continue;
        }

        let score =
            (amount_score(&amount_delta, &tolerance.amount) + date_score(day_delta, tolerance.days))
                / 2.0;

        let better = match best {
            None => true,
            Some((best_score, best_movement)) => {
                score > best_score
                    || (score == best_score
                        && (movement.value_date, &movement.id)
                            < (best_movement.value_date, &best_movement.id))
            }
        };
        if better {
            best = Some((score, movement));
        }
    }

    best.map(|(score, movement)| MatchCandidate {
        movement_id: movement.id.clone(),
        match_type: MatchType::Fuzzy,
        confidence: score.clamp(FUZZY_FLOOR, FUZZY_CEIL),
    })
}

/// REFERENCE: only attempted when the line carries a non-empty reference
/// code; matches on normalized reference equality regardless of amount or
/// date proximity. Confidence fixed at 0.7.
fn reference_match(
    item: &StatementItem,
    candidates: &[&TreasuryMovement],
) -> Option<MatchCandidate> {
    let reference = normalize_reference(item.reference.as_deref())?;

    candidates
        .iter()
        .filter(|m| normalize_reference(m.reference.as_deref()).as_deref() == Some(&reference))
        .min_by(|a, b| a.value_date.cmp(&b.value_date).then_with(|| a.id.cmp(&b.id)))
        .map(|m| MatchCandidate {
            movement_id: m.id.clone(),
            match_type: MatchType::Reference,
            confidence: REFERENCE_CONFIDENCE,
        })
}

fn normalize_reference(reference: Option<&str>) -> Option<String> {
    let trimmed = reference?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_uppercase())
    }
}

/// Per-axis closeness: `1 - |delta| / tolerance`, clamped to [0,1].
/// A zero tolerance scores 0 on the axis (the window only admits an exact
/// delta there, which carries no closeness information).
fn amount_score(delta: &BigDecimal, tolerance: &BigDecimal) -> f64 {
    if *tolerance == BigDecimal::from(0) {
        return 0.0;
    }
    let ratio = (delta / tolerance).to_f64().unwrap_or(1.0);
    (1.0 - ratio).clamp(0.0, 1.0)
}

fn date_score(day_delta: i64, tolerance_days: u32) -> f64 {
    if tolerance_days == 0 {
        return 0.0;
    }
    let ratio = day_delta as f64 / f64::from(tolerance_days);
    (1.0 - ratio).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, day).unwrap()
    }

    fn debit_item(amount: i64, day: u32) -> StatementItem {
        StatementItem::new(
            "item-1".to_string(),
            "stmt-1".to_string(),
            date(day),
            BigDecimal::from(amount),
            BigDecimal::from(0),
            None,
            "PAGO PROVEEDOR".to_string(),
        )
    }

    fn egreso(id: &str, amount: i64, day: u32) -> TreasuryMovement {
        TreasuryMovement::new(
            id.to_string(),
            "acct-1".to_string(),
            "co-1".to_string(),
            MovementDirection::Egreso,
            BigDecimal::from(amount),
            date(day),
            "TRANSFERENCIA".to_string(),
            "Pago proveedor".to_string(),
        )
    }

    fn tolerance(amount: i64, days: u32) -> Tolerance {
        Tolerance {
            amount: BigDecimal::from(amount),
            days,
        }
    }

    #[test]
    fn test_exact_beats_fuzzy() {
        let item = debit_item(5000, 15);
        let pool = vec![egreso("mov-fuzzy", 5003, 16), egreso("mov-exact", 5000, 15)];

        let hit = find_match(&item, &pool, &tolerance(10, 3)).unwrap();
        assert_eq!(hit.movement_id, "mov-exact");
        assert_eq!(hit.match_type, MatchType::Exact);
        assert_eq!(hit.confidence, 1.0);
    }

    #[test]
    fn test_fuzzy_within_tolerance() {
        let item = debit_item(5000, 15);
        let pool = vec![egreso("mov-1", 5005, 16)];

        let hit = find_match(&item, &pool, &tolerance(10, 3)).unwrap();
        assert_eq!(hit.match_type, MatchType::Fuzzy);
        assert!(hit.confidence > 0.0 && hit.confidence < 1.0);
        // amount axis: 1 - 5/10 = 0.5; date axis: 1 - 1/3 ≈ 0.667
        let expected = (0.5 + (1.0 - 1.0 / 3.0)) / 2.0;
        assert!((hit.confidence - expected).abs() < 1e-9);
    }

    #[test]
    fn test_fuzzy_before_reference() {
        let mut item = debit_item(5000, 15);
        item.reference = Some("OP-77".to_string());

        let mut by_reference = egreso("mov-ref", 9999, 28);
        by_reference.reference = Some("OP-77".to_string());
        let pool = vec![by_reference, egreso("mov-close", 5002, 15)];

        let hit = find_match(&item, &pool, &tolerance(10, 3)).unwrap();
        assert_eq!(hit.movement_id, "mov-close");
        assert_eq!(hit.match_type, MatchType::Fuzzy);
    }

    #[test]
    fn test_reference_fallback() {
        let mut item = debit_item(5000, 15);
        item.reference = Some("  op-77 ".to_string());

        let mut movement = egreso("mov-ref", 9999, 28);
        movement.reference = Some("OP-77".to_string());
        let pool = vec![movement];

        let hit = find_match(&item, &pool, &tolerance(10, 3)).unwrap();
        assert_eq!(hit.movement_id, "mov-ref");
        assert_eq!(hit.match_type, MatchType::Reference);
        assert_eq!(hit.confidence, REFERENCE_CONFIDENCE);
    }

    #[test]
    fn test_no_reference_strategy_without_reference_code() {
        let item = debit_item(5000, 15);
        let mut movement = egreso("mov-ref", 9999, 28);
        movement.reference = Some("OP-77".to_string());

        assert!(find_match(&item, &[movement], &tolerance(10, 3)).is_none());
    }

    #[test]
    fn test_direction_blocks_perfect_candidate() {
        let item = debit_item(5000, 15);
        let mut inflow = egreso("mov-1", 5000, 15);
        inflow.direction = MovementDirection::Ingreso;

        assert!(find_match(&item, &[inflow], &tolerance(10, 3)).is_none());
    }

    #[test]
    fn test_reconciled_movements_excluded() {
        let item = debit_item(5000, 15);
        let mut movement = egreso("mov-1", 5000, 15);
        movement.link("other-item".to_string());

        assert!(find_match(&item, &[movement], &tolerance(10, 3)).is_none());
    }

    #[test]
    fn test_fuzzy_picks_highest_score() {
        let item = debit_item(5000, 15);
        let pool = vec![egreso("mov-far", 5009, 17), egreso("mov-near", 5001, 15)];

        let hit = find_match(&item, &pool, &tolerance(10, 3)).unwrap();
        assert_eq!(hit.movement_id, "mov-near");
    }

    #[test]
    fn test_fuzzy_tie_breaks_earliest_date_then_lowest_id() {
        let item = debit_item(5000, 15);
        // Equal deltas on both axes in both directions
        let pool = vec![egreso("mov-b", 5004, 16), egreso("mov-a", 5004, 14)];
        let hit = find_match(&item, &pool, &tolerance(10, 3)).unwrap();
        assert_eq!(hit.movement_id, "mov-a");

        let pool = vec![egreso("mov-b", 5004, 16), egreso("mov-a", 5004, 16)];
        let hit = find_match(&item, &pool, &tolerance(10, 3)).unwrap();
        assert_eq!(hit.movement_id, "mov-a");
    }

    #[test]
    fn test_fuzzy_boundary_delta_accepted_with_floor_confidence() {
        let item = debit_item(5000, 15);
        // Both deltas sit exactly on the tolerance edge: axis scores are 0,
        // but the candidate is inside the inclusive window.
        let pool = vec![egreso("mov-1", 5010, 18)];

        let hit = find_match(&item, &pool, &tolerance(10, 3)).unwrap();
        assert_eq!(hit.match_type, MatchType::Fuzzy);
        assert!(hit.confidence > 0.0);
    }

    #[test]
    fn test_fuzzy_outside_tolerance_rejected() {
        let item = debit_item(5000, 15);
        let pool = vec![egreso("mov-amount", 5011, 15), egreso("mov-date", 5000, 19)];

        assert!(find_match(&item, &pool, &tolerance(10, 3)).is_none());
    }

    #[test]
    fn test_credit_item_matches_ingreso() {
        let mut item = debit_item(0, 15);
        item.credit = BigDecimal::from(1000);

        let mut inflow = egreso("mov-1", 1000, 15);
        inflow.direction = MovementDirection::Ingreso;

        let hit = find_match(&item, &[inflow], &tolerance(10, 3)).unwrap();
        assert_eq!(hit.match_type, MatchType::Exact);
    }
}
