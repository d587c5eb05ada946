//! Order → invoice generation.
//!
//! One generation run covers one `(order, billing month, flag set)`
//! combination: it selects the due order lines, snapshots the order's
//! policies and diagnosis codes onto a new invoice, prices each line with
//! the schedule primitives, advances the order lines to their next cycle,
//! and converts any month-1 deposits into patient payments.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;

use crate::core::{
    BillingError, Invoice, InvoiceId, InvoiceLine, Order, OrderId, OrderLine, OrderLineState,
    PolicySlot, UserContext, cent, round2,
};
use crate::mir::{self, icd10_cutover};
use crate::posting::add_payment;
use crate::schedule::{
    amount_multiplier, billable_amount, allowable_amount, invoice_modifier,
    invoice_must_be_skipped, next_dos_from, next_dos_to, order_must_be_closed,
    order_must_be_skipped, quantity_multiplier,
};
use crate::settle::recalculate_invoice;
use crate::store::BillingStore;

/// Payer/flag selector of a generation run: a line qualifies only when its
/// own flag set matches exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillingFlags(u8);

impl BillingFlags {
    pub const INS1: u8 = 1;
    pub const INS2: u8 = 2;
    pub const INS3: u8 = 4;
    pub const INS4: u8 = 8;
    pub const ACCEPT_ASSIGNMENT: u8 = 16;
    pub const END_DATE_SET: u8 = 32;

    const MASK: u8 = 0b11_1111;

    pub fn from_bits(bits: u8) -> Self {
        Self(bits & Self::MASK)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    /// The flag set an order line presents.
    pub fn of_line(line: &OrderLine) -> Self {
        let mut bits = 0u8;
        for (i, enabled) in line.bill_ins.iter().enumerate() {
            if *enabled {
                bits |= 1 << i;
            }
        }
        if line.accept_assignment {
            bits |= Self::ACCEPT_ASSIGNMENT;
        }
        if line.end_date.is_some() {
            bits |= Self::END_DATE_SET;
        }
        Self(bits)
    }
}

/// Inventory/serial lifecycle hooks. The engine only signals the
/// transitions; counters and serial tracking live with the collaborator
/// that implements this.
pub trait AssetHooks {
    fn line_billed(&mut self, _line: &OrderLine, _billing_month: i32) {}
    fn line_closed(&mut self, _line: &OrderLine, _closed_on: NaiveDate) {}
}

/// Default hooks: no inventory tracking.
#[derive(Debug, Default)]
pub struct NoopHooks;

impl AssetHooks for NoopHooks {}

/// Generate the invoice for `(order, billing month, flags)`, if any line
/// is due. Returns the new invoice id, or `None` when nothing qualifies.
pub fn generate_invoice(
    store: &mut BillingStore,
    order_id: OrderId,
    billing_month: i32,
    flags: BillingFlags,
    invoice_date: NaiveDate,
    user: &UserContext,
) -> Result<Option<InvoiceId>, BillingError> {
    generate_invoice_with_hooks(
        store,
        order_id,
        billing_month,
        flags,
        invoice_date,
        user,
        &mut NoopHooks,
    )
}

/// [`generate_invoice`] with inventory/serial lifecycle hooks.
pub fn generate_invoice_with_hooks(
    store: &mut BillingStore,
    order_id: OrderId,
    billing_month: i32,
    flags: BillingFlags,
    invoice_date: NaiveDate,
    user: &UserContext,
    hooks: &mut dyn AssetHooks,
) -> Result<Option<InvoiceId>, BillingError> {
    let billing_month = billing_month.max(1);
    let order = store.order(order_id)?.clone();
    if !order.approved {
        return Ok(None);
    }
    let customer = store.customer(order.customer_id)?.clone();

    let line_ids = store.order_line_ids(order_id);
    let mut due: Vec<OrderLine> = Vec::new();
    let mut icd10_lines = 0usize;
    for line_id in line_ids {
        let line = &store.order_lines[&line_id];
        if !line_qualifies(store, &order, line, billing_month, flags, invoice_date) {
            continue;
        }
        if line.dos_from >= icd10_cutover() {
            icd10_lines += 1;
        }
        due.push(line.clone());
    }

    if due.is_empty() {
        return Ok(None);
    }

    // Diagnosis snapshot: suppress the era no qualifying line belongs to.
    let icd9 = if icd10_lines == due.len() {
        Vec::new()
    } else {
        order.icd9.clone()
    };
    let icd10 = if icd10_lines == 0 {
        Vec::new()
    } else {
        order.icd10.clone()
    };

    let mut policies: [Option<PolicySlot>; 4] = [None; 4];
    for (slot, policy_id) in order.policies.iter().enumerate() {
        if let Some(policy_id) = policy_id {
            if let Some(policy) = store.policies.get(policy_id) {
                policies[slot] = Some(PolicySlot {
                    policy_id: policy.id,
                    company_id: policy.insurance_company_id,
                });
            }
        }
    }

    let tax_percent = customer
        .tax_rate_id
        .and_then(|id| store.tax_rates.get(&id))
        .map(|t| t.percent)
        .unwrap_or(Decimal::ZERO);

    let invoice_id = store.alloc_invoice_id();
    store.invoices.insert(
        invoice_id,
        Invoice {
            id: invoice_id,
            customer_id: order.customer_id,
            order_id,
            invoice_date,
            policies,
            icd9,
            icd10,
            discount_percent: order.discount_percent,
            balance: Decimal::ZERO,
        },
    );

    let mut generated: Vec<(i64, i64)> = Vec::new(); // (invoice line, order line)
    for line in &due {
        let invoice_line_id = insert_invoice_line(store, invoice_id, &order, line, tax_percent, customer.hardship);
        generated.push((invoice_line_id, line.id));
        advance_order_line(store, line.id, invoice_date, hooks);
    }

    recalculate_invoice(store, invoice_id)?;

    // Month-1 deposits become patient payments on the fresh lines.
    if billing_month == 1 {
        for (invoice_line_id, order_line_id) in &generated {
            for deposit in store.deposits_for_line(*order_line_id) {
                let blob = json!({
                    "Paid": deposit.amount.to_string(),
                    "PaymentMethod": deposit.payment_method,
                });
                add_payment(
                    store,
                    *invoice_line_id,
                    None,
                    deposit.date,
                    &blob,
                    "Deposit",
                    "",
                    user,
                )?;
            }
        }
    }

    tracing::debug!(
        order = order_id,
        invoice = invoice_id,
        month = billing_month,
        lines = generated.len(),
        "invoice generated"
    );
    Ok(Some(invoice_id))
}

fn line_qualifies(
    store: &BillingStore,
    order: &Order,
    line: &OrderLine,
    billing_month: i32,
    flags: BillingFlags,
    invoice_date: NaiveDate,
) -> bool {
    if !line.is_active || line.state == OrderLineState::Closed {
        return false;
    }
    if line.normalized_billing_month() != billing_month {
        return false;
    }
    if line.dos_from > invoice_date {
        return false;
    }
    if line.end_date.is_some_and(|end| line.dos_from > end) {
        return false;
    }
    if BillingFlags::of_line(line) != flags {
        return false;
    }
    if order_must_be_skipped(
        order.delivery_date,
        line.dos_from,
        line.sale_rent_type,
        billing_month,
        &line.modifiers[2],
    ) || invoice_must_be_skipped(
        order.delivery_date,
        line.dos_from,
        line.sale_rent_type,
        billing_month,
    ) {
        return false;
    }

    let cmn = line.cmn_form_id.and_then(|id| store.cmn_forms.get(&id));
    if !mir::order_line_mir(line, order, cmn, &store.diagnosis).is_empty() {
        return false;
    }

    billable_amount(
        line.sale_rent_type,
        billing_month,
        line.billable_price,
        line.billed_quantity,
        line.sale_price,
        line.flat_rate,
    ) >= cent()
}

fn insert_invoice_line(
    store: &mut BillingStore,
    invoice_id: InvoiceId,
    order: &Order,
    line: &OrderLine,
    tax_percent: Decimal,
    hardship: bool,
) -> i64 {
    let m = line.normalized_billing_month();
    let discount = (dec!(100) - order.discount_percent.clamp(dec!(0), dec!(100))) / dec!(100);
    let multiplier = amount_multiplier(
        line.dos_from,
        line.dos_to,
        line.pickup_date,
        line.sale_rent_type,
        line.ordered_when,
        line.billed_when,
    );

    let allowable = allowable_amount(
        line.sale_rent_type,
        m,
        line.allowable_price,
        line.billed_quantity,
        line.sale_price,
        line.flat_rate,
    );
    let billable = billable_amount(
        line.sale_rent_type,
        m,
        line.billable_price,
        line.billed_quantity,
        line.sale_price,
        line.flat_rate,
    );

    let (base, taxes) = if line.taxable {
        let tax = tax_percent / dec!(100);
        (
            allowable * (Decimal::ONE + tax),
            round2(discount * multiplier * allowable * tax),
        )
    } else {
        (billable, Decimal::ZERO)
    };

    let billable_amount = round2(discount * multiplier * base);
    let allowable_amount = round2(discount * multiplier * allowable);
    let quantity = line.billed_quantity
        * quantity_multiplier(
            line.dos_from,
            line.dos_to,
            line.pickup_date,
            line.sale_rent_type,
            line.ordered_when,
            line.billed_when,
        );

    let mut modifiers: [String; 4] = Default::default();
    for (i, slot) in modifiers.iter_mut().enumerate() {
        *slot = invoice_modifier(
            order.delivery_date,
            line.sale_rent_type,
            m,
            i + 1,
            &line.modifiers,
        );
    }

    let id = store.alloc_invoice_line_id();
    store.invoice_lines.insert(
        id,
        InvoiceLine {
            id,
            invoice_id,
            customer_id: order.customer_id,
            order_id: order.id,
            order_line_id: line.id,
            inventory_item_id: line.inventory_item_id,
            sale_rent_type: line.sale_rent_type,
            billing_month: m,
            dos_from: line.dos_from,
            dos_to: line.dos_to,
            billable_amount,
            allowable_amount,
            taxes,
            quantity,
            modifiers,
            bill_ins: line.bill_ins,
            nopay_ins1: line.nopay_ins1,
            accept_assignment: line.accept_assignment,
            hardship,
            balance: billable_amount,
            payment_amount: Decimal::ZERO,
            writeoff_amount: Decimal::ZERO,
            deductible_amount: Decimal::ZERO,
            current_payer: None,
            current_customer_insurance_id: None,
            current_insurance_company_id: None,
            submitted: false,
            submitted_date: None,
            submit_dates: [None; 5],
            submits: Default::default(),
            pendings: Default::default(),
            payments: Default::default(),
        },
    );
    id
}

fn advance_order_line(
    store: &mut BillingStore,
    order_line_id: i64,
    invoice_date: NaiveDate,
    hooks: &mut dyn AssetHooks,
) {
    let Some(order) = store
        .order_lines
        .get(&order_line_id)
        .map(|l| l.order_id)
        .and_then(|oid| store.orders.get(&oid))
    else {
        return;
    };
    let delivery_date = order.delivery_date;

    let Some(line) = store.order_lines.get_mut(&order_line_id) else {
        return;
    };

    let m = line.normalized_billing_month();
    let old_from = line.dos_from;
    let old_to = line.dos_to;
    let old_mods = line.modifiers.clone();

    line.dos_to = next_dos_to(old_from, old_to, line.billed_when);
    line.dos_from = next_dos_from(old_from, old_to, line.billed_when);
    line.modifiers[0] =
        invoice_modifier(delivery_date, line.sale_rent_type, m + 1, 1, &old_mods);
    line.modifiers[1] =
        invoice_modifier(delivery_date, line.sale_rent_type, m + 1, 2, &old_mods);

    let ended = line.end_date.is_some_and(|end| line.dos_from > end);
    let must_close = order_must_be_closed(
        delivery_date,
        old_from,
        line.sale_rent_type,
        m,
        &old_mods[2],
    );
    if ended || must_close {
        line.state = OrderLineState::Closed;
        if line.end_date.is_none() {
            line.end_date = Some(invoice_date);
        }
    }
    line.billing_month = m + 1;

    let line = store.order_lines[&order_line_id].clone();
    hooks.line_billed(&line, m);
    if line.state == OrderLineState::Closed {
        hooks.line_closed(&line, invoice_date);
    }
}
