//! Core data model, payer bitsets, money helpers, and error types.
//!
//! This module provides the foundational types the billing engine settles
//! against: customers, policies, orders, invoices, and the wire-stable
//! payer encoding shared by the ledger projection columns.

mod error;
mod money;
mod payer;
mod types;

pub use error::*;
pub use money::*;
pub use payer::*;
pub use types::*;
