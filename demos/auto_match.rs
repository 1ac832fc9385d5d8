//! End-to-end reconciliation run over an in-memory backend

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use reconciliation_core::{
    MemoryStorage, MovementDirection, ReconciliationEngine, StatementItem, TreasuryMovement,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let storage = MemoryStorage::new();
    let mut engine = ReconciliationEngine::new(storage);

    let date = |day| NaiveDate::from_ymd_opt(2026, 1, day).unwrap();

    engine
        .register_statement(
            "stmt-2026-01".to_string(),
            "acct-main".to_string(),
            "co-demo".to_string(),
            BigDecimal::from(10),
            3,
        )
        .await?;

    // Three statement lines: one exact hit, one fuzzy hit, one miss
    engine
        .register_item(StatementItem::new(
            "line-001".to_string(),
            "stmt-2026-01".to_string(),
            date(15),
            BigDecimal::from(5000),
            BigDecimal::from(0),
            None,
            "PAGO PROVEEDOR ACME".to_string(),
        ))
        .await?;
    engine
        .register_item(StatementItem::new(
            "line-002".to_string(),
            "stmt-2026-01".to_string(),
            date(16),
            BigDecimal::from(0),
            BigDecimal::from(1200),
            None,
            "ABONO CLIENTE NORTE".to_string(),
        ))
        .await?;
    engine
        .register_item(StatementItem::new(
            "line-003".to_string(),
            "stmt-2026-01".to_string(),
            date(17),
            BigDecimal::from(500),
            BigDecimal::from(0),
            None,
            "COMISION MANTENIMIENTO CUENTA".to_string(),
        ))
        .await?;

    engine
        .register_movement(TreasuryMovement::new(
            "mov-101".to_string(),
            "acct-main".to_string(),
            "co-demo".to_string(),
            MovementDirection::Egreso,
            BigDecimal::from(5000),
            date(15),
            "TRANSFERENCIA".to_string(),
            "Pago proveedor ACME".to_string(),
        ))
        .await?;
    engine
        .register_movement(TreasuryMovement::new(
            "mov-102".to_string(),
            "acct-main".to_string(),
            "co-demo".to_string(),
            MovementDirection::Ingreso,
            BigDecimal::from(1195),
            date(17),
            "TRANSFERENCIA".to_string(),
            "Cobro cliente Norte".to_string(),
        ))
        .await?;

    let report = engine.auto_match_statement_items("stmt-2026-01").await?;
    println!(
        "run: {} lines, {} matched, {} in suspense",
        report.total_items, report.matched, report.suspense
    );
    for outcome in &report.results {
        println!(
            "  {} -> {:?} ({:?}, confidence {:?})",
            outcome.item_id, outcome.movement_id, outcome.match_type, outcome.confidence
        );
    }

    // The miss is a bank fee with no internal counterpart: manufacture the
    // movement straight from the suspense line.
    let movement_id = engine
        .create_movement_from_suspense(
            "line-003",
            "GASTOS BANCARIOS",
            "Comision de mantenimiento enero",
            "demo-user",
        )
        .await?;
    let movement = engine.get_movement(&movement_id).await?.unwrap();
    println!(
        "created movement {} on channel {} for {}",
        movement.id, movement.channel, movement.amount
    );

    let summary = engine.get_reconciliation_summary("stmt-2026-01").await?;
    println!(
        "summary: {}/{} matched (exact {}, fuzzy {}, manual {})",
        summary.matched,
        summary.total_items,
        summary.by_match_type.exact,
        summary.by_match_type.fuzzy,
        summary.by_match_type.manual
    );

    Ok(())
}
