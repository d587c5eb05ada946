//! Poster behavior: validation outcomes, idempotency guards, option
//! gates, and the writeoff paths.

mod common;

use common::{date, settled_line, user};
use dmebill::core::{Payer, PostOutcome};
use dmebill::ledger::TxKind;
use dmebill::posting::{
    add_auto_submit, add_payment, add_submitted, reflag, update_pending_submissions,
};
use rust_decimal_macros::dec;
use serde_json::json;

#[test]
fn unknown_line_and_company_fail_fast() {
    let mut fx = settled_line(dec!(100), [true, false, false, false]);
    let u = user();

    assert_eq!(
        add_payment(&mut fx.store, 999, Some(10), date(2024, 3, 1), &json!({"Paid": "10"}), "", "", &u)
            .unwrap(),
        PostOutcome::InvoiceDetailsIdWrong
    );
    assert_eq!(
        add_payment(&mut fx.store, fx.line_id, Some(55), date(2024, 3, 1), &json!({"Paid": "10"}), "", "", &u)
            .unwrap(),
        PostOutcome::InsuranceCompanyIdWrong
    );
    assert_eq!(
        add_payment(&mut fx.store, fx.line_id, Some(10), date(2024, 3, 1), &json!({"Paid": "ten"}), "", "", &u)
            .unwrap(),
        PostOutcome::PaidAmountMissing
    );
    assert!(fx.store.ledger.is_empty());
}

#[test]
fn duplicate_check_number_is_rejected() {
    let mut fx = settled_line(dec!(100), [true, false, false, false]);
    let u = user();

    let first = json!({ "Paid": "40", "CheckNumber": "1042", "PostingGuid": "guid-a" });
    assert!(
        add_payment(&mut fx.store, fx.line_id, Some(10), date(2024, 3, 1), &first, "", "", &u)
            .unwrap()
            .is_success()
    );

    // Same check, different remittance run: blocked.
    let second = json!({ "Paid": "40", "CheckNumber": "1042", "PostingGuid": "guid-b" });
    assert_eq!(
        add_payment(&mut fx.store, fx.line_id, Some(10), date(2024, 3, 2), &second, "", "", &u)
            .unwrap(),
        PostOutcome::DuplicateCheckPayment {
            check_number: "1042".into()
        }
    );

    // Same check, same guid: a re-run of the same file posts again.
    assert!(
        add_payment(&mut fx.store, fx.line_id, Some(10), date(2024, 3, 2), &first, "", "", &u)
            .unwrap()
            .is_success()
    );
}

#[test]
fn post_denied_option_posts_a_zero_denial() {
    let mut fx = settled_line(dec!(100), [true, false, false, false]);
    let u = user();

    add_payment(
        &mut fx.store,
        fx.line_id,
        Some(10),
        date(2024, 3, 1),
        &json!({ "Paid": "0" }),
        "",
        "Post Denied",
        &u,
    )
    .unwrap();

    let entries = fx.store.ledger.entries_for_line(fx.line_id);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].kind, TxKind::Denied);
    assert_eq!(entries[0].amount, dec!(0));

    // A denial is audit-only: the payer does not advance.
    let line = &fx.store.invoice_lines[&fx.line_id];
    assert_eq!(line.current_payer, Some(Payer::Ins1));
}

#[test]
fn adjust_allowable_posts_once_per_payer() {
    let mut fx = settled_line(dec!(100), [true, false, false, false]);
    let u = user();

    let blob = json!({ "Paid": "50", "Allowable": "82.50" });
    add_payment(&mut fx.store, fx.line_id, Some(10), date(2024, 3, 1), &blob, "", "Adjust Allowable", &u)
        .unwrap();
    add_payment(&mut fx.store, fx.line_id, Some(10), date(2024, 3, 2), &blob, "", "Adjust Allowable", &u)
        .unwrap();

    let adjustments: Vec<_> = fx
        .store
        .ledger
        .entries_for_line(fx.line_id)
        .into_iter()
        .filter(|e| e.kind == TxKind::AdjustAllowable)
        .collect();
    assert_eq!(adjustments.len(), 1);
    assert_eq!(adjustments[0].amount, dec!(82.50));
    // The stored line keeps its original allowable; the adjustment lives
    // on the ledger.
    assert_eq!(fx.store.invoice_lines[&fx.line_id].allowable_amount, dec!(100));
}

#[test]
fn derived_contractual_writeoff_for_allowed_basis_primary() {
    let mut fx = settled_line(dec!(100), [true, false, false, false]);
    let u = user();
    // The payer reimburses on the allowed amount, below the charge.
    fx.store.invoice_lines.get_mut(&fx.line_id).unwrap().allowable_amount = dec!(80);

    add_payment(&mut fx.store, fx.line_id, Some(10), date(2024, 3, 1), &json!({"Paid": "80"}), "", "", &u)
        .unwrap();

    let writeoffs: Vec<_> = fx
        .store
        .ledger
        .entries_for_line(fx.line_id)
        .into_iter()
        .filter(|e| e.kind == TxKind::ContractualWriteoff)
        .collect();
    assert_eq!(writeoffs.len(), 1);
    assert_eq!(writeoffs[0].amount, dec!(20));

    let line = &fx.store.invoice_lines[&fx.line_id];
    assert_eq!(line.balance, dec!(0));
    assert_eq!(line.current_payer, None);

    // Re-posting does not duplicate the derived writeoff.
    add_payment(&mut fx.store, fx.line_id, Some(10), date(2024, 3, 2), &json!({"Paid": "0"}), "", "", &u)
        .unwrap();
    let writeoffs = fx
        .store
        .ledger
        .entries_for_line(fx.line_id)
        .into_iter()
        .filter(|e| e.kind == TxKind::ContractualWriteoff)
        .count();
    assert_eq!(writeoffs, 1);
}

#[test]
fn explicit_contractual_writeoff_wins_over_derivation() {
    let mut fx = settled_line(dec!(100), [true, false, false, false]);
    let u = user();
    fx.store.invoice_lines.get_mut(&fx.line_id).unwrap().allowable_amount = dec!(80);

    let blob = json!({ "Paid": "75", "ContractualWriteoff": "25" });
    add_payment(&mut fx.store, fx.line_id, Some(10), date(2024, 3, 1), &blob, "", "", &u).unwrap();

    let writeoffs: Vec<_> = fx
        .store
        .ledger
        .entries_for_line(fx.line_id)
        .into_iter()
        .filter(|e| e.kind == TxKind::ContractualWriteoff)
        .collect();
    assert_eq!(writeoffs.len(), 1);
    assert_eq!(writeoffs[0].amount, dec!(25));
}

#[test]
fn sequestration_and_deductible_rows() {
    let mut fx = settled_line(dec!(100), [true, false, false, false]);
    let u = user();

    let blob = json!({ "Paid": "70", "Sequestration": "1.43", "Deductible": "25" });
    add_payment(&mut fx.store, fx.line_id, Some(10), date(2024, 3, 1), &blob, "", "", &u).unwrap();

    let entries = fx.store.ledger.entries_for_line(fx.line_id);
    let sequestration = entries
        .iter()
        .find(|e| e.kind == TxKind::Writeoff)
        .expect("sequestration writeoff");
    assert_eq!(sequestration.amount, dec!(1.43));
    assert_eq!(sequestration.comments, "Sequestration Writeoff");

    let line = &fx.store.invoice_lines[&fx.line_id];
    assert_eq!(line.deductible_amount, dec!(25));

    // Deductible posts once per payer.
    add_payment(&mut fx.store, fx.line_id, Some(10), date(2024, 3, 2), &blob, "", "", &u).unwrap();
    let deductibles = fx
        .store
        .ledger
        .entries_for_line(fx.line_id)
        .into_iter()
        .filter(|e| e.kind == TxKind::Deductible)
        .count();
    assert_eq!(deductibles, 1);
}

#[test]
fn writeoff_balance_option_clears_the_line() {
    let mut fx = settled_line(dec!(100), [true, false, false, false]);
    let u = user();

    add_payment(
        &mut fx.store,
        fx.line_id,
        Some(10),
        date(2024, 3, 1),
        &json!({ "Paid": "60" }),
        "",
        "Writeoff Balance",
        &u,
    )
    .unwrap();

    let line = &fx.store.invoice_lines[&fx.line_id];
    assert_eq!(line.balance, dec!(0));
    assert_eq!(line.current_payer, None);

    let writeoff = fx
        .store
        .ledger
        .entries_for_line(fx.line_id)
        .into_iter()
        .find(|e| e.kind == TxKind::Writeoff)
        .cloned()
        .expect("balance writeoff");
    assert_eq!(writeoff.amount, dec!(40));
    assert_eq!(writeoff.comments, "Wrote off by jdoe");
}

#[test]
fn hardship_patient_balance_is_written_off() {
    let mut fx = settled_line(dec!(100), [true, false, false, false]);
    let u = user();
    fx.store.invoice_lines.get_mut(&fx.line_id).unwrap().hardship = true;

    // Primary pays 60; responsibility falls to the hardship patient.
    add_payment(&mut fx.store, fx.line_id, Some(10), date(2024, 3, 1), &json!({"Paid": "60"}), "", "", &u)
        .unwrap();

    let line = &fx.store.invoice_lines[&fx.line_id];
    assert_eq!(line.balance, dec!(0));
    assert_eq!(line.current_payer, None);

    let writeoff = fx
        .store
        .ledger
        .entries_for_line(fx.line_id)
        .into_iter()
        .find(|e| e.kind == TxKind::Writeoff)
        .cloned()
        .expect("hardship writeoff");
    assert_eq!(writeoff.amount, dec!(40));
    assert_eq!(writeoff.comments, "Hardship Writeoff");
}

// --- Submissions ---

#[test]
fn auto_submit_is_exactly_once() {
    let mut fx = settled_line(dec!(100), [true, false, false, false]);
    let u = user();

    assert_eq!(
        add_auto_submit(&mut fx.store, fx.line_id, 10, date(2024, 2, 2), &u).unwrap(),
        PostOutcome::Success
    );
    assert_eq!(
        add_auto_submit(&mut fx.store, fx.line_id, 10, date(2024, 2, 3), &u).unwrap(),
        PostOutcome::TransactionAlreadyExists
    );

    let submits = fx
        .store
        .ledger
        .entries_for_line(fx.line_id)
        .into_iter()
        .filter(|e| e.kind == TxKind::AutoSubmit)
        .count();
    assert_eq!(submits, 1);
    assert!(fx.store.invoice_lines[&fx.line_id].submitted);
}

#[test]
fn auto_submit_distinguishes_unknown_and_non_payer_companies() {
    let mut fx = settled_line(dec!(100), [true, false, false, false]);
    let u = user();

    assert_eq!(
        add_auto_submit(&mut fx.store, fx.line_id, 555, date(2024, 2, 2), &u).unwrap(),
        PostOutcome::AutosubmitCompanyIdWrong
    );

    // A real company that is not on this invoice.
    fx.store.insurance_companies.insert(
        77,
        dmebill::core::InsuranceCompany {
            id: 77,
            name: "Elsewhere Mutual".into(),
        },
    );
    assert_eq!(
        add_auto_submit(&mut fx.store, fx.line_id, 77, date(2024, 2, 2), &u).unwrap(),
        PostOutcome::AutosubmitPayerWrong
    );
}

#[test]
fn submit_to_an_empty_slot_is_rejected() {
    let mut fx = settled_line(dec!(100), [true, false, false, false]);
    let u = user();
    assert_eq!(
        add_submitted(&mut fx.store, fx.line_id, dec!(100), Payer::Ins3, "emc", "B", date(2024, 2, 2), &u)
            .unwrap(),
        PostOutcome::InsuranceCompanyIdWrong
    );
}

#[test]
fn submit_then_void_leaves_no_live_submission() {
    let mut fx = settled_line(dec!(100), [true, false, false, false]);
    let u = user();

    add_submitted(&mut fx.store, fx.line_id, dec!(100), Payer::Ins1, "emc", "B", date(2024, 2, 2), &u)
        .unwrap();
    assert!(fx.store.invoice_lines[&fx.line_id].submits.contains(Payer::Ins1));

    let voided = reflag(&mut fx.store, &[fx.line_id], date(2024, 2, 10), &u).unwrap();
    assert_eq!(voided, 1);

    let line = &fx.store.invoice_lines[&fx.line_id];
    assert!(!line.submits.contains(Payer::Ins1));
    assert_eq!(line.submit_dates[Payer::Ins1.index()], None);
    assert!(!line.submitted);

    // Nothing live to void on the second pass.
    let voided = reflag(&mut fx.store, &[fx.line_id], date(2024, 2, 11), &u).unwrap();
    assert_eq!(voided, 0);
}

#[test]
fn payment_then_void_then_reversal_restores_balance_without_submission() {
    use dmebill::ledger::{NewEntry, TxKind};
    use dmebill::settle::recalculate_invoice_line;

    let mut fx = settled_line(dec!(100), [true, false, false, false]);
    let u = user();

    add_submitted(&mut fx.store, fx.line_id, dec!(100), Payer::Ins1, "emc", "B", date(2024, 2, 2), &u)
        .unwrap();
    let balance_before = fx.store.invoice_lines[&fx.line_id].balance;

    add_payment(&mut fx.store, fx.line_id, Some(10), date(2024, 2, 20), &json!({"Paid": "100"}), "", "", &u)
        .unwrap();
    fx.store
        .ledger
        .append(NewEntry {
            customer_id: 1,
            invoice_id: fx.invoice_id,
            invoice_line_id: fx.line_id,
            insurance_company_id: Some(10),
            customer_insurance_id: Some(100),
            kind: TxKind::VoidedSubmission,
            amount: dec!(0),
            tx_date: date(2024, 2, 21),
            extra: None,
            comments: String::new(),
            posted_by: u.user_id,
        })
        .unwrap();
    recalculate_invoice_line(&mut fx.store, fx.line_id).unwrap();
    add_payment(&mut fx.store, fx.line_id, Some(10), date(2024, 2, 22), &json!({"Paid": "-100"}), "", "", &u)
        .unwrap();

    let line = &fx.store.invoice_lines[&fx.line_id];
    assert_eq!(line.balance, balance_before);
    assert!(!line.submits.contains(Payer::Ins1));
    assert_eq!(line.current_payer, Some(Payer::Ins1));
}

#[test]
fn pending_submissions_cover_the_current_payer() {
    let mut fx = settled_line(dec!(100), [true, true, false, false]);
    let u = user();

    update_pending_submissions(&mut fx.store, fx.invoice_id, date(2024, 2, 2), &u).unwrap();

    let line = &fx.store.invoice_lines[&fx.line_id];
    assert!(line.pendings.contains(Payer::Ins1));
    let pending = fx
        .store
        .ledger
        .entries_for_line(fx.line_id)
        .into_iter()
        .find(|e| e.kind == TxKind::PendingSubmission)
        .cloned()
        .unwrap();
    // The primary is owed the full billable amount.
    assert_eq!(pending.amount, dec!(100));

    // Running again adds nothing for the same payer.
    update_pending_submissions(&mut fx.store, fx.invoice_id, date(2024, 2, 3), &u).unwrap();
    let count = fx
        .store
        .ledger
        .entries_for_line(fx.line_id)
        .into_iter()
        .filter(|e| e.kind == TxKind::PendingSubmission)
        .count();
    assert_eq!(count, 1);

    // After the primary pays, the secondary's pending amount is what
    // remains.
    add_payment(&mut fx.store, fx.line_id, Some(10), date(2024, 3, 1), &json!({"Paid": "60"}), "", "", &u)
        .unwrap();
    update_pending_submissions(&mut fx.store, fx.invoice_id, date(2024, 3, 2), &u).unwrap();
    let pending: Vec<_> = fx
        .store
        .ledger
        .entries_for_line(fx.line_id)
        .into_iter()
        .filter(|e| e.kind == TxKind::PendingSubmission)
        .cloned()
        .collect();
    assert_eq!(pending.len(), 2);
    assert_eq!(pending[1].amount, dec!(40));
    assert_eq!(pending[1].insurance_company_id, Some(11));
}
