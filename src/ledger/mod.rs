//! Append-only transaction ledger.
//!
//! Every financial or submission event on an invoice line is one
//! [`LedgerEntry`]. Entries are never mutated or deleted after commit — a
//! submission is undone by appending a `Voided Submission`, not by
//! touching the `Submit` row. The recalculator reduces a line's entries in
//! strictly ascending id (insertion) order; `tx_date` is informational and
//! may be backdated.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{
    BillingError, CompanyId, CustomerId, InvoiceId, InvoiceLineId, PolicyId, TxId,
};

/// Kind of a ledger transaction. The `code()` names are wire-stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxKind {
    Payment,
    Denied,
    Writeoff,
    ContractualWriteoff,
    AdjustAllowable,
    Deductible,
    Submit,
    AutoSubmit,
    VoidedSubmission,
    PendingSubmission,
    ChangeCurrentPayee,
}

impl TxKind {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Payment => "Payment",
            Self::Denied => "Denied",
            Self::Writeoff => "Writeoff",
            Self::ContractualWriteoff => "Contractual Writeoff",
            Self::AdjustAllowable => "Adjust Allowable",
            Self::Deductible => "Deductible",
            Self::Submit => "Submit",
            Self::AutoSubmit => "Auto Submit",
            Self::VoidedSubmission => "Voided Submission",
            Self::PendingSubmission => "Pending Submission",
            Self::ChangeCurrentPayee => "Change Current Payee",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "Payment" => Some(Self::Payment),
            "Denied" => Some(Self::Denied),
            "Writeoff" => Some(Self::Writeoff),
            "Contractual Writeoff" => Some(Self::ContractualWriteoff),
            "Adjust Allowable" => Some(Self::AdjustAllowable),
            "Deductible" => Some(Self::Deductible),
            "Submit" => Some(Self::Submit),
            "Auto Submit" => Some(Self::AutoSubmit),
            "Voided Submission" => Some(Self::VoidedSubmission),
            "Pending Submission" => Some(Self::PendingSubmission),
            "Change Current Payee" => Some(Self::ChangeCurrentPayee),
            _ => None,
        }
    }
}

/// One committed ledger row.
///
/// A null `insurance_company_id` denotes patient responsibility, in which
/// case `customer_insurance_id` must be null as well.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: TxId,
    pub customer_id: CustomerId,
    pub invoice_id: InvoiceId,
    pub invoice_line_id: InvoiceLineId,
    pub insurance_company_id: Option<CompanyId>,
    pub customer_insurance_id: Option<PolicyId>,
    pub kind: TxKind,
    pub amount: Decimal,
    pub tx_date: NaiveDate,
    /// Free-form structured payload (the payment extra blob, batch info).
    pub extra: Option<serde_json::Value>,
    pub comments: String,
    pub posted_by: i64,
}

/// Fields of a ledger row not assigned by the ledger itself.
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub customer_id: CustomerId,
    pub invoice_id: InvoiceId,
    pub invoice_line_id: InvoiceLineId,
    pub insurance_company_id: Option<CompanyId>,
    pub customer_insurance_id: Option<PolicyId>,
    pub kind: TxKind,
    pub amount: Decimal,
    pub tx_date: NaiveDate,
    pub extra: Option<serde_json::Value>,
    pub comments: String,
    pub posted_by: i64,
}

/// The append-only transaction log, ids strictly increasing in insertion
/// order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ledger {
    entries: Vec<LedgerEntry>,
    next_id: TxId,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
        }
    }

    /// Append a transaction and return its id.
    pub fn append(&mut self, entry: NewEntry) -> Result<TxId, BillingError> {
        if entry.insurance_company_id.is_none() && entry.customer_insurance_id.is_some() {
            return Err(BillingError::Ledger(
                "patient transaction must not carry a customer insurance id".into(),
            ));
        }

        let id = self.next_id;
        self.next_id += 1;
        tracing::debug!(
            tx_id = id,
            line = entry.invoice_line_id,
            kind = entry.kind.code(),
            amount = %entry.amount,
            "ledger append"
        );
        self.entries.push(LedgerEntry {
            id,
            customer_id: entry.customer_id,
            invoice_id: entry.invoice_id,
            invoice_line_id: entry.invoice_line_id,
            insurance_company_id: entry.insurance_company_id,
            customer_insurance_id: entry.customer_insurance_id,
            kind: entry.kind,
            amount: entry.amount,
            tx_date: entry.tx_date,
            extra: entry.extra,
            comments: entry.comments,
            posted_by: entry.posted_by,
        });
        Ok(id)
    }

    /// All entries for one invoice line, in ascending id order.
    pub fn entries_for_line(&self, line_id: InvoiceLineId) -> Vec<&LedgerEntry> {
        self.entries
            .iter()
            .filter(|e| e.invoice_line_id == line_id)
            .collect()
    }

    /// All entries for one invoice, in ascending id order.
    pub fn entries_for_invoice(&self, invoice_id: InvoiceId) -> Vec<&LedgerEntry> {
        self.entries
            .iter()
            .filter(|e| e.invoice_id == invoice_id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LedgerEntry> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn entry(line: InvoiceLineId, kind: TxKind) -> NewEntry {
        NewEntry {
            customer_id: 1,
            invoice_id: 1,
            invoice_line_id: line,
            insurance_company_id: Some(10),
            customer_insurance_id: Some(100),
            kind,
            amount: dec!(25),
            tx_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            extra: None,
            comments: String::new(),
            posted_by: 1,
        }
    }

    #[test]
    fn ids_are_monotonic_per_insertion() {
        let mut ledger = Ledger::new();
        let a = ledger.append(entry(1, TxKind::Submit)).unwrap();
        let b = ledger.append(entry(2, TxKind::Payment)).unwrap();
        let c = ledger.append(entry(1, TxKind::Payment)).unwrap();
        assert!(a < b && b < c);

        let line1: Vec<TxId> = ledger.entries_for_line(1).iter().map(|e| e.id).collect();
        assert_eq!(line1, vec![a, c]);
    }

    #[test]
    fn patient_rows_must_not_name_a_policy() {
        let mut ledger = Ledger::new();
        let mut bad = entry(1, TxKind::Payment);
        bad.insurance_company_id = None;
        assert!(ledger.append(bad).is_err());

        let mut patient = entry(1, TxKind::Payment);
        patient.insurance_company_id = None;
        patient.customer_insurance_id = None;
        assert!(ledger.append(patient).is_ok());
    }

    #[test]
    fn kind_codes_roundtrip() {
        for kind in [
            TxKind::Payment,
            TxKind::Denied,
            TxKind::Writeoff,
            TxKind::ContractualWriteoff,
            TxKind::AdjustAllowable,
            TxKind::Deductible,
            TxKind::Submit,
            TxKind::AutoSubmit,
            TxKind::VoidedSubmission,
            TxKind::PendingSubmission,
            TxKind::ChangeCurrentPayee,
        ] {
            assert_eq!(TxKind::from_code(kind.code()), Some(kind));
        }
    }
}
