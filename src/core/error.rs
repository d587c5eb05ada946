use std::fmt;

use thiserror::Error;

/// Fatal engine failures: referential breakage inside the store or ledger.
///
/// Poster-level validation and idempotency rejections are *not* errors —
/// they come back as a [`PostOutcome`] and leave the ledger untouched.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BillingError {
    /// A stored entity references another that does not exist.
    #[error("unknown {entity} id {id}")]
    UnknownId { entity: &'static str, id: i64 },

    /// A ledger append would violate a ledger invariant.
    #[error("ledger integrity: {0}")]
    Ledger(String),
}

impl BillingError {
    pub fn unknown(entity: &'static str, id: i64) -> Self {
        BillingError::UnknownId { entity, id }
    }
}

/// Outcome of a posting operation. The `Display` strings are wire-stable:
/// callers and the original automated 835 posting flow match on them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostOutcome {
    Success,
    /// The invoice line id resolved to nothing.
    InvoiceDetailsIdWrong,
    /// The insurance company is not on any policy slot of the invoice.
    InsuranceCompanyIdWrong,
    /// Auto-submit named an insurance company that does not exist.
    AutosubmitCompanyIdWrong,
    /// Auto-submit named a company that is not a payer on this invoice.
    AutosubmitPayerWrong,
    /// The transaction was already posted (exactly-once guard).
    TransactionAlreadyExists,
    /// The payment extra blob carried no parseable `Paid` amount.
    PaidAmountMissing,
    /// An 835 payment with this check number was already posted under a
    /// different posting guid.
    DuplicateCheckPayment { check_number: String },
}

impl PostOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PostOutcome::Success)
    }
}

impl fmt::Display for PostOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostOutcome::Success => write!(f, "Success"),
            PostOutcome::InvoiceDetailsIdWrong => write!(f, "InvoiceDetailsID is wrong"),
            PostOutcome::InsuranceCompanyIdWrong => write!(f, "InsuranceCompanyID is wrong"),
            PostOutcome::AutosubmitCompanyIdWrong => {
                write!(f, "Autosubmitted Company ID is wrong")
            }
            PostOutcome::AutosubmitPayerWrong => write!(f, "Autosubmitted Payer is wrong"),
            PostOutcome::TransactionAlreadyExists => write!(f, "Transaction already exists"),
            PostOutcome::PaidAmountMissing => write!(f, "Paid amount is not specified"),
            PostOutcome::DuplicateCheckPayment { check_number } => {
                write!(f, "Payment for check# {check_number} does already exist")
            }
        }
    }
}
