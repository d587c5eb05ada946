//! Invoice-detail recalculation.
//!
//! The recalculator is the authority on every ledger-derived field of an
//! invoice line: payment totals per payer, writeoffs, balance, submit
//! state, and the current payer. It is a pure reducer over the line's
//! transactions in insertion order — see [`recalculate`] — plus a thin
//! application layer that writes the projection back to the store and
//! refreshes the invoice's running balance.
//!
//! Two concurrent posts to the same line produce different terminal
//! ledgers, but each recalc is internally consistent; callers serialize
//! the post-and-recalc pair per invoice line.

mod reducer;

pub use reducer::*;

use rust_decimal::Decimal;

use crate::core::{BillingError, InvoiceId, InvoiceLineId};
use crate::store::BillingStore;

/// Which lines a recalculation covers.
#[derive(Debug, Clone, Copy)]
pub enum RecalcScope {
    Invoice(InvoiceId),
    Line(InvoiceLineId),
}

/// Recalculate every line in scope.
pub fn recalculate_scope(store: &mut BillingStore, scope: RecalcScope) -> Result<(), BillingError> {
    match scope {
        RecalcScope::Line(line_id) => recalculate_invoice_line(store, line_id),
        RecalcScope::Invoice(invoice_id) => recalculate_invoice(store, invoice_id),
    }
}

/// Recalculate all lines of one invoice.
pub fn recalculate_invoice(
    store: &mut BillingStore,
    invoice_id: InvoiceId,
) -> Result<(), BillingError> {
    for line_id in store.invoice_line_ids(invoice_id) {
        recalculate_invoice_line(store, line_id)?;
    }
    Ok(())
}

/// Reduce one line's ledger and write the projection back, then refresh
/// the invoice balance from its line balances.
pub fn recalculate_invoice_line(
    store: &mut BillingStore,
    line_id: InvoiceLineId,
) -> Result<(), BillingError> {
    let line = store
        .invoice_lines
        .get(&line_id)
        .ok_or(BillingError::unknown("invoice line", line_id))?;
    let invoice = store.invoice(line.invoice_id)?;
    let invoice_id = invoice.id;

    let snapshot = LineSnapshot::of(line, invoice);
    let projection = recalculate(&snapshot, store.ledger.entries_for_line(line_id));

    tracing::debug!(
        line = line_id,
        balance = %projection.balance,
        current_payer = crate::core::current_payer_token(projection.current_payer),
        "recalculated invoice line"
    );

    let line = store
        .invoice_lines
        .get_mut(&line_id)
        .ok_or(BillingError::unknown("invoice line", line_id))?;
    line.payment_amount = projection.payment_total;
    line.writeoff_amount = projection.writeoff_total;
    line.deductible_amount = projection.deductible;
    line.balance = projection.balance;
    line.current_payer = projection.current_payer;
    line.current_customer_insurance_id = projection.current_customer_insurance_id;
    line.current_insurance_company_id = projection.current_insurance_company_id;
    line.submitted = projection.submitted;
    line.submitted_date = projection.submitted_date;
    line.submit_dates = projection.submit_dates;
    line.submits = projection.submits;
    line.pendings = projection.pendings;
    line.payments = projection.payments;

    let invoice_balance: Decimal = store
        .invoice_lines
        .values()
        .filter(|l| l.invoice_id == invoice_id)
        .map(|l| l.balance)
        .sum();
    if let Some(invoice) = store.invoices.get_mut(&invoice_id) {
        invoice.balance = invoice_balance;
    }

    Ok(())
}
