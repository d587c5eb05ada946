//! Shared fixtures for the integration suites.

#![allow(dead_code)]

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use dmebill::core::*;
use dmebill::settle::recalculate_invoice_line;
use dmebill::store::BillingStore;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn user() -> UserContext {
    UserContext::new(7, "jdoe")
}

pub fn customer(id: CustomerId) -> Customer {
    Customer {
        id,
        first_name: "Ada".into(),
        last_name: "Lovelace".into(),
        address1: "1 Main St".into(),
        city: "Springfield".into(),
        state: "IL".into(),
        postal_code: "62701".into(),
        date_of_birth: Some(date(1954, 5, 2)),
        gender: Some("F".into()),
        active: true,
        commercial_account: false,
        tax_rate_id: None,
        hardship: false,
    }
}

pub fn policy(id: PolicyId, customer_id: CustomerId, company_id: CompanyId, rank: u32) -> CustomerInsurance {
    CustomerInsurance {
        id,
        customer_id,
        insurance_company_id: company_id,
        rank,
        payment_percent: dec!(80),
        basis: PolicyBasis::Allowed,
        inactive_date: None,
        policy_number: format!("P-{id}"),
        group_number: None,
        relationship_code: Some(18),
        insured_first_name: None,
        insured_last_name: None,
        insured_address1: None,
        insured_city: None,
        insured_state: None,
        insured_postal_code: None,
        insured_gender: None,
        insured_date_of_birth: None,
    }
}

pub fn order_line(id: OrderLineId, order_id: OrderId, rent_type: SaleRentType) -> OrderLine {
    OrderLine {
        id,
        order_id,
        inventory_item_id: None,
        serial_number: None,
        sale_rent_type: rent_type,
        billing_month: 1,
        dos_from: date(2024, 1, 10),
        dos_to: date(2024, 2, 9),
        end_date: None,
        pickup_date: None,
        bill_ins: [true, false, false, false],
        nopay_ins1: false,
        accept_assignment: true,
        ordered_quantity: dec!(1),
        billed_quantity: dec!(1),
        delivery_quantity: dec!(1),
        ordered_when: Frequency::Monthly,
        billed_when: Frequency::Monthly,
        billable_price: dec!(100),
        allowable_price: dec!(80),
        sale_price: dec!(0),
        flat_rate: false,
        taxable: false,
        modifiers: Default::default(),
        auth_expires_on: None,
        cmn_form_id: None,
        state: OrderLineState::Open,
        is_active: true,
    }
}

pub fn order(id: OrderId, customer_id: CustomerId, policies: [Option<PolicyId>; 4]) -> Order {
    Order {
        id,
        customer_id,
        policies,
        icd9: vec!["250.00".into()],
        icd10: vec!["E11.9".into()],
        delivery_date: date(2024, 1, 10),
        approved: true,
        discount_percent: dec!(0),
        location_id: None,
        doctor_id: Some(1),
        facility_id: None,
    }
}

/// A store with one settled invoice line, ready for posting tests.
pub struct Fixture {
    pub store: BillingStore,
    pub invoice_id: InvoiceId,
    pub line_id: InvoiceLineId,
}

/// Build a store holding a single invoice line with the given billable
/// amount and enabled insurance slots. Slot `k` uses company `10 + k` and
/// policy `100 + k`; the line starts recalculated over an empty ledger.
pub fn settled_line(billable: Decimal, bill_ins: [bool; 4]) -> Fixture {
    let mut store = BillingStore::new();
    store.customers.insert(1, customer(1));

    let mut slots: [Option<PolicySlot>; 4] = [None; 4];
    let mut order_policies: [Option<PolicyId>; 4] = [None; 4];
    for (i, enabled) in bill_ins.iter().enumerate() {
        if !*enabled {
            continue;
        }
        let company_id = 10 + i as i64;
        let policy_id = 100 + i as i64;
        store.insurance_companies.insert(
            company_id,
            InsuranceCompany {
                id: company_id,
                name: format!("Carrier {company_id}"),
            },
        );
        store
            .policies
            .insert(policy_id, policy(policy_id, 1, company_id, i as u32 + 1));
        slots[i] = Some(PolicySlot {
            policy_id,
            company_id,
        });
        order_policies[i] = Some(policy_id);
    }

    store.orders.insert(1, order(1, 1, order_policies));

    let invoice_id = store.alloc_invoice_id();
    store.invoices.insert(
        invoice_id,
        Invoice {
            id: invoice_id,
            customer_id: 1,
            order_id: 1,
            invoice_date: date(2024, 2, 1),
            policies: slots,
            icd9: Vec::new(),
            icd10: vec!["E11.9".into()],
            discount_percent: dec!(0),
            balance: Decimal::ZERO,
        },
    );

    let line_id = store.alloc_invoice_line_id();
    store.invoice_lines.insert(
        line_id,
        InvoiceLine {
            id: line_id,
            invoice_id,
            customer_id: 1,
            order_id: 1,
            order_line_id: 1,
            inventory_item_id: None,
            sale_rent_type: SaleRentType::MonthlyRental,
            billing_month: 1,
            dos_from: date(2024, 1, 10),
            dos_to: date(2024, 2, 9),
            billable_amount: billable,
            allowable_amount: billable,
            taxes: Decimal::ZERO,
            quantity: dec!(1),
            modifiers: Default::default(),
            bill_ins,
            nopay_ins1: false,
            accept_assignment: true,
            hardship: false,
            balance: billable,
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

    recalculate_invoice_line(&mut store, line_id).unwrap();

    Fixture {
        store,
        invoice_id,
        line_id,
    }
}
