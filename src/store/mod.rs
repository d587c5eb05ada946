//! In-memory stand-in for the relational store.
//!
//! The real system runs the engine inside serializable database
//! transactions; this crate keeps persistence at the edges and holds the
//! same tables as plain collections. Posters and the generator take
//! `&mut BillingStore` and complete together with the recalculation they
//! trigger — partial writes are never observable to a caller.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::core::{
    BillingError, CmnForm, CmnFormId, CompanyId, Customer, CustomerId, CustomerInsurance,
    Deposit, Doctor, DoctorId, Facility, FacilityId, INACTIVE_RANK, InsuranceCompany, Invoice,
    InvoiceId, InvoiceLine, InvoiceLineId, Order, OrderId, OrderLine, OrderLineId, PolicyId,
    TaxRate, TaxRateId,
};
use crate::ledger::Ledger;
use crate::mir::DiagnosisTable;

/// All engine state: entity tables plus the append-only ledger.
#[derive(Debug, Default)]
pub struct BillingStore {
    pub customers: HashMap<CustomerId, Customer>,
    pub insurance_companies: HashMap<CompanyId, InsuranceCompany>,
    pub policies: HashMap<PolicyId, CustomerInsurance>,
    pub tax_rates: HashMap<TaxRateId, TaxRate>,
    pub doctors: HashMap<DoctorId, Doctor>,
    pub facilities: HashMap<FacilityId, Facility>,
    pub cmn_forms: HashMap<CmnFormId, CmnForm>,
    pub orders: HashMap<OrderId, Order>,
    pub order_lines: HashMap<OrderLineId, OrderLine>,
    pub invoices: HashMap<InvoiceId, Invoice>,
    pub invoice_lines: HashMap<InvoiceLineId, InvoiceLine>,
    pub deposits: Vec<Deposit>,
    pub diagnosis: DiagnosisTable,
    pub ledger: Ledger,
    next_invoice_id: InvoiceId,
    next_invoice_line_id: InvoiceLineId,
}

impl BillingStore {
    pub fn new() -> Self {
        Self {
            next_invoice_id: 1,
            next_invoice_line_id: 1,
            ..Default::default()
        }
    }

    pub fn alloc_invoice_id(&mut self) -> InvoiceId {
        let id = self.next_invoice_id;
        self.next_invoice_id += 1;
        id
    }

    pub fn alloc_invoice_line_id(&mut self) -> InvoiceLineId {
        let id = self.next_invoice_line_id;
        self.next_invoice_line_id += 1;
        id
    }

    pub fn customer(&self, id: CustomerId) -> Result<&Customer, BillingError> {
        self.customers
            .get(&id)
            .ok_or(BillingError::unknown("customer", id))
    }

    pub fn policy(&self, id: PolicyId) -> Result<&CustomerInsurance, BillingError> {
        self.policies
            .get(&id)
            .ok_or(BillingError::unknown("customer insurance", id))
    }

    pub fn order(&self, id: OrderId) -> Result<&Order, BillingError> {
        self.orders.get(&id).ok_or(BillingError::unknown("order", id))
    }

    pub fn invoice(&self, id: InvoiceId) -> Result<&Invoice, BillingError> {
        self.invoices
            .get(&id)
            .ok_or(BillingError::unknown("invoice", id))
    }

    /// Order lines of an order, in id order.
    pub fn order_line_ids(&self, order_id: OrderId) -> Vec<OrderLineId> {
        let mut ids: Vec<OrderLineId> = self
            .order_lines
            .values()
            .filter(|l| l.order_id == order_id)
            .map(|l| l.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Invoice lines of an invoice, in id order.
    pub fn invoice_line_ids(&self, invoice_id: InvoiceId) -> Vec<InvoiceLineId> {
        let mut ids: Vec<InvoiceLineId> = self
            .invoice_lines
            .values()
            .filter(|l| l.invoice_id == invoice_id)
            .map(|l| l.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Deposits taken against an order line.
    pub fn deposits_for_line(&self, order_line_id: OrderLineId) -> Vec<Deposit> {
        self.deposits
            .iter()
            .filter(|d| d.order_line_id == order_line_id)
            .cloned()
            .collect()
    }

    /// Renumber a customer's policies: active ones densely 1..N in their
    /// existing rank order, inactive ones demoted to [`INACTIVE_RANK`].
    pub fn normalize_ranks(&mut self, customer_id: CustomerId, as_of: NaiveDate) {
        let mut active: Vec<(u32, PolicyId)> = Vec::new();
        for policy in self.policies.values_mut() {
            if policy.customer_id != customer_id {
                continue;
            }
            if policy.is_active(as_of) {
                active.push((policy.rank, policy.id));
            } else {
                policy.rank = INACTIVE_RANK;
            }
        }

        active.sort_unstable();
        for (new_rank, (_, policy_id)) in active.into_iter().enumerate() {
            if let Some(policy) = self.policies.get_mut(&policy_id) {
                policy.rank = new_rank as u32 + 1;
            }
        }
    }
}
