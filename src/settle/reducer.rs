//! The settlement reducer: one pass over a line's ledger, in insertion
//! order, producing the full projection.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::core::{
    CompanyId, Invoice, InvoiceLine, Payer, PayerSet, PolicyId, PolicySlot, cent, is_zero_amount,
};
use crate::ledger::{LedgerEntry, TxKind};

/// The slice of invoice-line state the reducer needs. Policy slots come
/// from the invoice snapshot, so later policy edits cannot change how an
/// already-billed line settles.
#[derive(Debug, Clone)]
pub struct LineSnapshot {
    pub billable_amount: Decimal,
    pub bill_ins: [bool; 4],
    pub nopay_ins1: bool,
    pub policy_slots: [Option<PolicySlot>; 4],
}

impl LineSnapshot {
    pub fn of(line: &InvoiceLine, invoice: &Invoice) -> Self {
        Self {
            billable_amount: line.billable_amount,
            bill_ins: line.bill_ins,
            nopay_ins1: line.nopay_ins1,
            policy_slots: invoice.policies,
        }
    }

    /// Payers that can be asked to pay: each enabled, present insurance
    /// slot (the primary only if it is not flagged no-pay), and always the
    /// patient.
    pub fn eligible_payers(&self) -> PayerSet {
        let mut eligible = PayerSet::EMPTY;
        for payer in Payer::INSURANCES {
            let slot = payer.index();
            if !self.bill_ins[slot] || self.policy_slots[slot].is_none() {
                continue;
            }
            if payer == Payer::Ins1 && self.nopay_ins1 {
                continue;
            }
            eligible.insert(payer);
        }
        eligible.insert(Payer::Patient);
        eligible
    }

    /// Owner of a ledger row: the slot whose policy the row names, or the
    /// patient when it names none. Rows naming a policy outside the
    /// snapshot are not reduced.
    pub fn owner_of(&self, entry: &LedgerEntry) -> Option<Payer> {
        match entry.customer_insurance_id {
            None => Some(Payer::Patient),
            Some(policy_id) => self
                .policy_slots
                .iter()
                .position(|slot| slot.is_some_and(|s| s.policy_id == policy_id))
                .and_then(Payer::from_insurance_slot),
        }
    }
}

/// Everything the reducer derives from a line's ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineProjection {
    /// Payment sum per payer, indexed by [`Payer::index`].
    pub payments_by_payer: [Decimal; 5],
    pub payment_total: Decimal,
    pub writeoff_total: Decimal,
    /// Deductible reported by the primary.
    pub deductible: Decimal,
    pub balance: Decimal,
    pub current_payer: Option<Payer>,
    pub current_customer_insurance_id: Option<PolicyId>,
    pub current_insurance_company_id: Option<CompanyId>,
    pub submitted: bool,
    pub submitted_date: Option<NaiveDate>,
    /// Last live submit date per payer, indexed by [`Payer::index`].
    pub submit_dates: [Option<NaiveDate>; 5],
    pub submits: PayerSet,
    pub pendings: PayerSet,
    pub payments: PayerSet,
    pub zero_payments: PayerSet,
}

/// Reduce a line's ledger into its projection.
///
/// `entries` must be in ascending insertion order — the order the ledger
/// hands them out. The function is pure and deterministic: re-running it
/// over the same input produces a bit-identical projection.
pub fn recalculate<'a, I>(snapshot: &LineSnapshot, entries: I) -> LineProjection
where
    I: IntoIterator<Item = &'a LedgerEntry>,
{
    let eligible = snapshot.eligible_payers();

    let mut payments_by_payer = [Decimal::ZERO; 5];
    let mut payment_total = Decimal::ZERO;
    let mut writeoff_total = Decimal::ZERO;
    let mut deductible = Decimal::ZERO;
    let mut proposed_payer: Option<Payer> = None;
    let mut zero_payments = PayerSet::EMPTY;
    let mut submits = PayerSet::EMPTY;
    let mut pendings = PayerSet::EMPTY;
    let mut submit_dates: [Option<NaiveDate>; 5] = [None; 5];

    for entry in entries {
        let Some(owner) = snapshot.owner_of(entry) else {
            continue;
        };

        match entry.kind {
            TxKind::Writeoff | TxKind::ContractualWriteoff => {
                writeoff_total += entry.amount;
            }
            TxKind::Submit | TxKind::AutoSubmit => {
                submits.insert(owner);
                submit_dates[owner.index()] = Some(entry.tx_date);
            }
            TxKind::VoidedSubmission => {
                submits.remove(owner);
                submit_dates[owner.index()] = None;
            }
            TxKind::PendingSubmission => {
                pendings.insert(owner);
            }
            TxKind::ChangeCurrentPayee => {
                if owner == Payer::Patient || eligible.contains(owner) {
                    proposed_payer = Some(owner);
                }
            }
            TxKind::Payment => {
                if is_zero_amount(entry.amount) {
                    zero_payments.insert(owner);
                } else {
                    zero_payments.remove(owner);
                }
                payments_by_payer[owner.index()] += entry.amount;
                payment_total += entry.amount;
                // A non-negative payment from the proposed payer satisfies
                // the override; responsibility advances normally again.
                if proposed_payer == Some(owner) && entry.amount >= Decimal::ZERO {
                    proposed_payer = None;
                }
            }
            TxKind::Deductible => {
                if owner == Payer::Ins1 {
                    deductible = entry.amount;
                }
            }
            // Posted for audit only; not part of the settlement math.
            TxKind::Denied | TxKind::AdjustAllowable => {}
        }
    }

    let balance = snapshot.billable_amount - payment_total - writeoff_total;

    let current_payer = if balance < cent() {
        None
    } else if let Some(proposed) = proposed_payer {
        Some(proposed)
    } else {
        // Lowest eligible insurance that has neither paid nor explicitly
        // zero-paid; the patient is terminal and never skipped over.
        Payer::INSURANCES
            .into_iter()
            .find(|payer| {
                eligible.contains(*payer)
                    && payments_by_payer[payer.index()] < cent()
                    && !zero_payments.contains(*payer)
            })
            .or(Some(Payer::Patient))
    };

    let current_slot = current_payer
        .and_then(Payer::insurance_slot)
        .and_then(|slot| snapshot.policy_slots[slot]);

    let mut payments = PayerSet::EMPTY;
    for payer in Payer::INSURANCES {
        if payments_by_payer[payer.index()] >= cent() || zero_payments.contains(payer) {
            payments.insert(payer);
        }
    }
    if payments_by_payer[Payer::Patient.index()] >= cent() {
        payments.insert(Payer::Patient);
    }

    LineProjection {
        payments_by_payer,
        payment_total,
        writeoff_total,
        deductible,
        balance,
        current_payer,
        current_customer_insurance_id: current_slot.map(|s| s.policy_id),
        current_insurance_company_id: current_slot.map(|s| s.company_id),
        submitted: current_payer.is_some_and(|p| submits.contains(p)),
        submitted_date: current_payer.and_then(|p| submit_dates[p.index()]),
        submit_dates,
        submits,
        pendings,
        payments,
        zero_payments,
    }
}
