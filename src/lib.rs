//! # dmebill
//!
//! Billing and settlement engine for durable medical equipment (DME)
//! claims: rental schedule mathematics, order → invoice generation, an
//! append-only payment ledger with a deterministic per-line settlement
//! projection, and missing-information (MIR) validation.
//!
//! All monetary values use [`rust_decimal::Decimal`] — never floating
//! point. One cent (`0.01`) is the domain zero: a line whose balance falls
//! below it is settled and carries no current payer.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use dmebill::core::*;
//! use dmebill::schedule;
//! use rust_decimal_macros::dec;
//!
//! // Capped rental, month 4: the 75% phase applies to the allowable only.
//! let m4 = schedule::allowable_amount(
//!     SaleRentType::CappedRental, 4, dec!(100), dec!(1), dec!(0), false);
//! assert_eq!(m4, dec!(75.00));
//! let billable = schedule::billable_amount(
//!     SaleRentType::CappedRental, 4, dec!(100), dec!(1), dec!(0), false);
//! assert_eq!(billable, dec!(100.00));
//!
//! let delivery = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
//! let mods = [String::new(), String::new(), String::new(), String::new()];
//! assert_eq!(schedule::invoice_modifier(delivery, SaleRentType::CappedRental, 4, 1, &mods), "RR");
//! assert_eq!(schedule::invoice_modifier(delivery, SaleRentType::CappedRental, 4, 2, &mods), "KJ");
//! ```
//!
//! ## Subsystems
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`core`] | Data model, payer bitsets, money, result strings |
//! | [`schedule`] | Rental/sale pricing, modifiers, date rolls, skip/close |
//! | [`ledger`] | Append-only typed transaction log |
//! | [`settle`] | Recalculator: ledger → per-line projection |
//! | [`posting`] | Payment & submission posters with idempotency guards |
//! | [`generate`] | Order → invoice generation per billing month |
//! | [`mir`] | Missing/erroneous-information defect codes |
//! | [`store`] | In-memory stand-in for the relational store |

pub mod core;
pub mod generate;
pub mod ledger;
pub mod mir;
pub mod posting;
pub mod schedule;
pub mod settle;
pub mod store;

// Re-export core types at crate root for convenience
pub use crate::core::*;
