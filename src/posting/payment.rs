//! Payment posting.
//!
//! `add_payment` is the single entry point for manual and automated (835)
//! payment application. It validates, appends the payment row plus any
//! gated side rows (adjust-allowable, sequestration, contractual writeoff,
//! deductible), recalculates the line, and finally writes off the
//! remaining balance when asked to or when a hardship patient becomes the
//! current payer.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::core::{
    BillingError, CompanyId, InvoiceLineId, Payer, PolicyBasis, PolicyId, PolicySlot,
    PostOutcome, UserContext, cent, is_zero_amount,
};
use crate::ledger::{NewEntry, TxKind};
use crate::settle::recalculate_invoice_line;
use crate::store::BillingStore;

use super::{PaymentExtra, PaymentOptions};

/// Post a payment (or denial) to an invoice line.
///
/// `insurance_company_id` selects the paying slot; `None` posts patient
/// money. `options` is the comma set `Adjust Allowable`, `Post Denied`,
/// `Writeoff Balance`. Validation failures and idempotency rejections come
/// back as a [`PostOutcome`] without touching the ledger.
pub fn add_payment(
    store: &mut BillingStore,
    line_id: InvoiceLineId,
    insurance_company_id: Option<CompanyId>,
    tx_date: NaiveDate,
    extra: &Value,
    comments: &str,
    options: &str,
    user: &UserContext,
) -> Result<PostOutcome, BillingError> {
    let options = PaymentOptions::parse(options);
    let parsed = PaymentExtra::parse(extra);

    let Some(line) = store.invoice_lines.get(&line_id) else {
        return Ok(PostOutcome::InvoiceDetailsIdWrong);
    };
    let invoice = store.invoice(line.invoice_id)?;

    let (payer, slot) = match insurance_company_id {
        None => (Payer::Patient, None),
        Some(company_id) => match invoice.slot_of_company(company_id) {
            Some(slot_index) => {
                let payer = Payer::from_insurance_slot(slot_index)
                    .unwrap_or(Payer::Patient);
                (payer, invoice.policies[slot_index])
            }
            None => return Ok(PostOutcome::InsuranceCompanyIdWrong),
        },
    };

    let Some(paid) = parsed.paid else {
        return Ok(PostOutcome::PaidAmountMissing);
    };

    // 835 de-duplication: the same check may be posted again only under
    // the same posting guid (a re-run of the same remittance file).
    if let (Some(check), Some(guid)) = (&parsed.check_number, &parsed.posting_guid) {
        let payer_policy = slot.map(|s| s.policy_id);
        let duplicate = store.ledger.entries_for_line(line_id).iter().any(|entry| {
            matches!(entry.kind, TxKind::Payment | TxKind::Denied)
                && entry.customer_insurance_id == payer_policy
                && entry
                    .extra
                    .as_ref()
                    .and_then(|e| e.get("CheckNumber"))
                    .and_then(Value::as_str)
                    == Some(check.as_str())
                && entry
                    .extra
                    .as_ref()
                    .and_then(|e| e.get("PostingGuid"))
                    .and_then(Value::as_str)
                    != Some(guid.as_str())
        });
        if duplicate {
            return Ok(PostOutcome::DuplicateCheckPayment {
                check_number: check.clone(),
            });
        }
    }

    let line = &store.invoice_lines[&line_id];
    let row = RowContext {
        customer_id: line.customer_id,
        invoice_id: line.invoice_id,
        line_id,
        slot,
        tx_date,
        user_id: user.user_id,
    };
    let billable = line.billable_amount;
    let mut line_allowable = line.allowable_amount;

    // Primary-payer allowable adjustment, once per line and payer.
    if options.adjust_allowable && payer == Payer::Ins1 {
        if let Some(allowable) = parsed.allowable {
            if (allowable - line_allowable).abs() >= cent() {
                if !has_entry(store, line_id, TxKind::AdjustAllowable, slot) {
                    store.ledger.append(row.entry(
                        TxKind::AdjustAllowable,
                        allowable,
                        None,
                        String::new(),
                    ))?;
                }
                line_allowable = allowable;
            }
        }
    }

    if options.post_denied && is_zero_amount(paid) {
        store.ledger.append(row.entry(
            TxKind::Denied,
            Decimal::ZERO,
            Some(parsed.to_value()),
            comments.to_string(),
        ))?;
    } else {
        store.ledger.append(row.entry(
            TxKind::Payment,
            paid,
            Some(parsed.to_value()),
            comments.to_string(),
        ))?;
    }

    if let Some(slot_ref) = slot {
        post_insurance_side_rows(store, &row, slot_ref, payer, &parsed, billable, line_allowable)?;
    }

    recalculate_invoice_line(store, line_id)?;

    // Remaining-balance writeoff: explicit option, or hardship patients
    // once responsibility lands on them.
    let line = &store.invoice_lines[&line_id];
    let hardship_writeoff = line.hardship && line.current_payer == Some(Payer::Patient);
    let balance = line.balance;
    let current_slot = match (
        line.current_customer_insurance_id,
        line.current_insurance_company_id,
    ) {
        (Some(policy_id), Some(company_id)) => Some(PolicySlot {
            policy_id,
            company_id,
        }),
        _ => None,
    };
    if (options.writeoff_balance || hardship_writeoff) && balance >= cent() {
        let comment = if options.writeoff_balance {
            format!("Wrote off by {}", user.login)
        } else {
            "Hardship Writeoff".to_string()
        };
        let writeoff_row = RowContext {
            slot: current_slot,
            ..row
        };
        store
            .ledger
            .append(writeoff_row.entry(TxKind::Writeoff, balance, None, comment))?;
        recalculate_invoice_line(store, line_id)?;
    }

    tracing::debug!(line = line_id, payer = payer.token(), paid = %paid, "payment posted");
    Ok(PostOutcome::Success)
}

fn post_insurance_side_rows(
    store: &mut BillingStore,
    row: &RowContext,
    slot: PolicySlot,
    payer: Payer,
    parsed: &PaymentExtra,
    billable: Decimal,
    line_allowable: Decimal,
) -> Result<(), BillingError> {
    if let Some(sequestration) = parsed.sequestration {
        if sequestration.abs() >= cent() {
            store.ledger.append(row.entry(
                TxKind::Writeoff,
                sequestration,
                None,
                "Sequestration Writeoff".to_string(),
            ))?;
        }
    }

    if let Some(contractual) = parsed.contractual_writeoff {
        store.ledger.append(row.entry(
            TxKind::ContractualWriteoff,
            contractual,
            None,
            String::new(),
        ))?;
    } else if payer == Payer::Ins1 {
        let basis = store.policy(slot.policy_id)?.basis;
        let gap = billable - line_allowable;
        if basis == PolicyBasis::Allowed
            && gap >= cent()
            && !has_entry(store, row.line_id, TxKind::ContractualWriteoff, Some(slot))
        {
            store.ledger.append(row.entry(
                TxKind::ContractualWriteoff,
                gap,
                None,
                String::new(),
            ))?;
        }
    }

    if let Some(deductible) = parsed.deductible {
        if deductible >= cent() && !has_entry(store, row.line_id, TxKind::Deductible, Some(slot)) {
            store
                .ledger
                .append(row.entry(TxKind::Deductible, deductible, None, String::new()))?;
        }
    }

    Ok(())
}

fn has_entry(
    store: &BillingStore,
    line_id: InvoiceLineId,
    kind: TxKind,
    slot: Option<PolicySlot>,
) -> bool {
    let policy: Option<PolicyId> = slot.map(|s| s.policy_id);
    store
        .ledger
        .entries_for_line(line_id)
        .iter()
        .any(|e| e.kind == kind && e.customer_insurance_id == policy)
}

/// Shared foreign keys for the rows one posting emits.
#[derive(Debug, Clone)]
struct RowContext {
    customer_id: i64,
    invoice_id: i64,
    line_id: InvoiceLineId,
    slot: Option<PolicySlot>,
    tx_date: NaiveDate,
    user_id: i64,
}

impl RowContext {
    fn entry(&self, kind: TxKind, amount: Decimal, extra: Option<Value>, comments: String) -> NewEntry {
        NewEntry {
            customer_id: self.customer_id,
            invoice_id: self.invoice_id,
            invoice_line_id: self.line_id,
            insurance_company_id: self.slot.map(|s| s.company_id),
            customer_insurance_id: self.slot.map(|s| s.policy_id),
            kind,
            amount,
            tx_date: self.tx_date,
            extra,
            comments,
            posted_by: self.user_id,
        }
    }
}
