//! Submission posting: manual submits, exactly-once auto-submits,
//! reflagging (voiding the live submission), and pending-submission
//! bookkeeping.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::json;

use crate::core::{
    BillingError, CompanyId, InvoiceId, InvoiceLineId, Payer, PolicySlot, PostOutcome,
    UserContext,
};
use crate::ledger::{NewEntry, TxKind};
use crate::settle::recalculate_invoice_line;
use crate::store::BillingStore;

/// Record a manual claim submission for one payer of a line.
///
/// `submit_to` is the patient or one of the four insurance slots; an
/// insurance submit against an empty slot is rejected.
pub fn add_submitted(
    store: &mut BillingStore,
    line_id: InvoiceLineId,
    amount: Decimal,
    submit_to: Payer,
    submitted_by: &str,
    batch: &str,
    tx_date: NaiveDate,
    user: &UserContext,
) -> Result<PostOutcome, BillingError> {
    let Some(line) = store.invoice_lines.get(&line_id) else {
        return Ok(PostOutcome::InvoiceDetailsIdWrong);
    };
    let invoice = store.invoice(line.invoice_id)?;

    let slot = match submit_to {
        Payer::Patient => None,
        insurance => match invoice.slot_for(insurance) {
            Some(slot) => Some(slot),
            None => return Ok(PostOutcome::InsuranceCompanyIdWrong),
        },
    };

    let entry = NewEntry {
        customer_id: line.customer_id,
        invoice_id: line.invoice_id,
        invoice_line_id: line_id,
        insurance_company_id: slot.map(|s| s.company_id),
        customer_insurance_id: slot.map(|s| s.policy_id),
        kind: TxKind::Submit,
        amount,
        tx_date,
        extra: Some(json!({ "SubmittedBy": submitted_by, "Batch": batch })),
        comments: String::new(),
        posted_by: user.user_id,
    };
    store.ledger.append(entry)?;
    recalculate_invoice_line(store, line_id)?;
    Ok(PostOutcome::Success)
}

/// Record an automated (batch) submission to an insurance company.
///
/// Exactly one `Auto Submit` may exist per line and company; a repeat
/// reports `Transaction already exists` and changes nothing.
pub fn add_auto_submit(
    store: &mut BillingStore,
    line_id: InvoiceLineId,
    insurance_company_id: CompanyId,
    tx_date: NaiveDate,
    user: &UserContext,
) -> Result<PostOutcome, BillingError> {
    let Some(line) = store.invoice_lines.get(&line_id) else {
        return Ok(PostOutcome::InvoiceDetailsIdWrong);
    };
    if !store.insurance_companies.contains_key(&insurance_company_id) {
        return Ok(PostOutcome::AutosubmitCompanyIdWrong);
    }
    let invoice = store.invoice(line.invoice_id)?;
    let Some(slot_index) = invoice.slot_of_company(insurance_company_id) else {
        return Ok(PostOutcome::AutosubmitPayerWrong);
    };
    let slot = invoice.policies[slot_index];

    let already_submitted = store.ledger.entries_for_line(line_id).iter().any(|e| {
        e.kind == TxKind::AutoSubmit && e.insurance_company_id == Some(insurance_company_id)
    });
    if already_submitted {
        return Ok(PostOutcome::TransactionAlreadyExists);
    }

    let entry = NewEntry {
        customer_id: line.customer_id,
        invoice_id: line.invoice_id,
        invoice_line_id: line_id,
        insurance_company_id: slot.map(|s| s.company_id),
        customer_insurance_id: slot.map(|s| s.policy_id),
        kind: TxKind::AutoSubmit,
        amount: line.billable_amount,
        tx_date,
        extra: None,
        comments: String::new(),
        posted_by: user.user_id,
    };
    store.ledger.append(entry)?;
    recalculate_invoice_line(store, line_id)?;
    Ok(PostOutcome::Success)
}

/// Void the live submission of every line whose current payer has one.
///
/// History stays intact: reflagging appends a `Voided Submission`, which
/// clears the payer's submit bit so the claim can be sent again. Returns
/// the number of lines reflagged.
pub fn reflag(
    store: &mut BillingStore,
    line_ids: &[InvoiceLineId],
    tx_date: NaiveDate,
    user: &UserContext,
) -> Result<usize, BillingError> {
    let mut voided = 0usize;
    for &line_id in line_ids {
        let Some(line) = store.invoice_lines.get(&line_id) else {
            continue;
        };
        let Some(current) = line.current_payer else {
            continue;
        };
        if !line.submits.contains(current) {
            continue;
        }

        let slot = current_slot(line.current_customer_insurance_id, line.current_insurance_company_id);
        let entry = NewEntry {
            customer_id: line.customer_id,
            invoice_id: line.invoice_id,
            invoice_line_id: line_id,
            insurance_company_id: slot.map(|s| s.company_id),
            customer_insurance_id: slot.map(|s| s.policy_id),
            kind: TxKind::VoidedSubmission,
            amount: Decimal::ZERO,
            tx_date,
            extra: None,
            comments: String::new(),
            posted_by: user.user_id,
        };
        store.ledger.append(entry)?;
        recalculate_invoice_line(store, line_id)?;
        voided += 1;
    }
    Ok(voided)
}

/// Ensure every line of an invoice has a pending submission recorded for
/// its current payer: the full billable for the primary, the remaining
/// owed amount for everyone else.
pub fn update_pending_submissions(
    store: &mut BillingStore,
    invoice_id: InvoiceId,
    tx_date: NaiveDate,
    user: &UserContext,
) -> Result<(), BillingError> {
    for line_id in store.invoice_line_ids(invoice_id) {
        let Some(line) = store.invoice_lines.get(&line_id) else {
            continue;
        };
        let Some(current) = line.current_payer else {
            continue;
        };
        if line.pendings.contains(current) {
            continue;
        }

        let amount = if current == Payer::Ins1 {
            line.billable_amount
        } else {
            line.billable_amount - line.payment_amount - line.writeoff_amount
        };
        let slot = current_slot(line.current_customer_insurance_id, line.current_insurance_company_id);
        let entry = NewEntry {
            customer_id: line.customer_id,
            invoice_id: line.invoice_id,
            invoice_line_id: line_id,
            insurance_company_id: slot.map(|s| s.company_id),
            customer_insurance_id: slot.map(|s| s.policy_id),
            kind: TxKind::PendingSubmission,
            amount,
            tx_date,
            extra: None,
            comments: String::new(),
            posted_by: user.user_id,
        };
        store.ledger.append(entry)?;
        recalculate_invoice_line(store, line_id)?;
    }
    Ok(())
}

fn current_slot(policy_id: Option<i64>, company_id: Option<i64>) -> Option<PolicySlot> {
    match (policy_id, company_id) {
        (Some(policy_id), Some(company_id)) => Some(PolicySlot {
            policy_id,
            company_id,
        }),
        _ => None,
    }
}
