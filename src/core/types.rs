use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::payer::{Payer, PayerSet};

pub type CustomerId = i64;
pub type CompanyId = i64;
pub type PolicyId = i64;
pub type TaxRateId = i64;
pub type DoctorId = i64;
pub type FacilityId = i64;
pub type OrderId = i64;
pub type OrderLineId = i64;
pub type InvoiceId = i64;
pub type InvoiceLineId = i64;
pub type CmnFormId = i64;
pub type TxId = i64;

/// Rank assigned to a policy whose `inactive_date` has passed. Active
/// policies are renumbered densely from 1; demoted ones sort behind them.
pub const INACTIVE_RANK: u32 = 9999;

/// Reimbursement regime of an order line. The `code()` strings are the
/// wire names used on orders and claim files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SaleRentType {
    OneTimeSale,
    ReOccurringSale,
    OneTimeRental,
    MonthlyRental,
    MedicareOxygenRental,
    RentToPurchase,
    CappedRental,
    ParentalCappedRental,
}

impl SaleRentType {
    pub fn code(&self) -> &'static str {
        match self {
            Self::OneTimeSale => "One Time Sale",
            Self::ReOccurringSale => "Re-occurring Sale",
            Self::OneTimeRental => "One Time Rental",
            Self::MonthlyRental => "Monthly Rental",
            Self::MedicareOxygenRental => "Medicare Oxygen Rental",
            Self::RentToPurchase => "Rent to Purchase",
            Self::CappedRental => "Capped Rental",
            Self::ParentalCappedRental => "Parental Capped Rental",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "One Time Sale" => Some(Self::OneTimeSale),
            "Re-occurring Sale" => Some(Self::ReOccurringSale),
            "One Time Rental" => Some(Self::OneTimeRental),
            "Monthly Rental" => Some(Self::MonthlyRental),
            "Medicare Oxygen Rental" => Some(Self::MedicareOxygenRental),
            "Rent to Purchase" => Some(Self::RentToPurchase),
            "Capped Rental" => Some(Self::CappedRental),
            "Parental Capped Rental" => Some(Self::ParentalCappedRental),
            _ => None,
        }
    }

    /// True for the two sale regimes (billed once, in month 1).
    pub fn is_sale(&self) -> bool {
        matches!(self, Self::OneTimeSale | Self::ReOccurringSale)
    }

    /// True for the capped-rental regimes (13/15-month cap, maintenance
    /// cycle from month 22).
    pub fn is_capped(&self) -> bool {
        matches!(self, Self::CappedRental | Self::ParentalCappedRental)
    }
}

/// Billing frequency of an order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Frequency {
    OneTime,
    Daily,
    Weekly,
    Monthly,
    CalendarMonthly,
    Quarterly,
    SemiAnnually,
    Annually,
    Custom,
}

impl Frequency {
    pub fn code(&self) -> &'static str {
        match self {
            Self::OneTime => "One time",
            Self::Daily => "Daily",
            Self::Weekly => "Weekly",
            Self::Monthly => "Monthly",
            Self::CalendarMonthly => "Calendar Monthly",
            Self::Quarterly => "Quarterly",
            Self::SemiAnnually => "Semi-Annually",
            Self::Annually => "Annually",
            Self::Custom => "Custom",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "One time" => Some(Self::OneTime),
            "Daily" => Some(Self::Daily),
            "Weekly" => Some(Self::Weekly),
            "Monthly" => Some(Self::Monthly),
            "Calendar Monthly" => Some(Self::CalendarMonthly),
            "Quarterly" => Some(Self::Quarterly),
            "Semi-Annually" => Some(Self::SemiAnnually),
            "Annually" => Some(Self::Annually),
            "Custom" => Some(Self::Custom),
            _ => None,
        }
    }
}

/// How a policy reimburses: against the allowed amount or the billed amount.
/// The difference drives derived contractual writeoffs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolicyBasis {
    Allowed,
    Bill,
}

/// Lifecycle state of an order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderLineState {
    Open,
    Pickup,
    Closed,
}

/// Audit identity passed explicitly to every poster.
#[derive(Debug, Clone)]
pub struct UserContext {
    pub user_id: i64,
    pub login: String,
}

impl UserContext {
    pub fn new(user_id: i64, login: impl Into<String>) -> Self {
        Self {
            user_id,
            login: login.into(),
        }
    }
}

/// A patient / account holder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub first_name: String,
    pub last_name: String,
    pub address1: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub date_of_birth: Option<NaiveDate>,
    /// "M" / "F" on the claim file.
    pub gender: Option<String>,
    pub active: bool,
    /// Commercial accounts are institutional buyers; demographic MIR checks
    /// do not apply to them.
    pub commercial_account: bool,
    pub tax_rate_id: Option<TaxRateId>,
    /// Financial-hardship flag: remaining patient responsibility is written
    /// off after insurance settles.
    pub hardship: bool,
}

/// An insurance company (payer organization).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsuranceCompany {
    pub id: CompanyId,
    pub name: String,
}

/// A sales-tax rate referenced by a customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxRate {
    pub id: TaxRateId,
    pub percent: Decimal,
}

/// An ordering physician. The NPI must be ten digits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: DoctorId,
    pub first_name: String,
    pub last_name: String,
    pub npi: Option<String>,
}

/// A place of service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Facility {
    pub id: FacilityId,
    pub name: String,
    pub address1: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

/// A customer's insurance policy, bound to one company and ranked against
/// the customer's other policies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerInsurance {
    pub id: PolicyId,
    pub customer_id: CustomerId,
    pub insurance_company_id: CompanyId,
    /// 1 = primary. Active policies are kept dense 1..N per customer;
    /// inactive ones carry [`INACTIVE_RANK`].
    pub rank: u32,
    /// Share of the allowed/billed amount the policy covers.
    pub payment_percent: Decimal,
    pub basis: PolicyBasis,
    pub inactive_date: Option<NaiveDate>,
    pub policy_number: String,
    pub group_number: Option<String>,
    /// X12 relationship of the patient to the insured; 18 = self. When the
    /// patient is not the insured, the insured block below must be filled.
    pub relationship_code: Option<u8>,
    pub insured_first_name: Option<String>,
    pub insured_last_name: Option<String>,
    pub insured_address1: Option<String>,
    pub insured_city: Option<String>,
    pub insured_state: Option<String>,
    pub insured_postal_code: Option<String>,
    pub insured_gender: Option<String>,
    pub insured_date_of_birth: Option<NaiveDate>,
}

impl CustomerInsurance {
    /// True while the policy has no passed inactive date.
    pub fn is_active(&self, as_of: NaiveDate) -> bool {
        self.inactive_date.is_none_or(|d| as_of < d)
    }

    /// `payment_percent` clamped to the valid `[0, 100]` range.
    pub fn clamped_payment_percent(&self) -> Decimal {
        self.payment_percent
            .clamp(Decimal::ZERO, Decimal::from(100))
    }

    /// True when the patient is the insured (relationship code 18).
    pub fn insured_is_self(&self) -> bool {
        self.relationship_code == Some(18)
    }
}

/// A recurring service/rental order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: CustomerId,
    /// Up to four policy slots, in rank order.
    pub policies: [Option<PolicyId>; 4],
    /// ICD-9 diagnosis codes (up to 4), for spans before the ICD-10 cutover.
    pub icd9: Vec<String>,
    /// ICD-10 diagnosis codes (up to 12).
    pub icd10: Vec<String>,
    pub delivery_date: NaiveDate,
    pub approved: bool,
    pub discount_percent: Decimal,
    pub location_id: Option<i64>,
    pub doctor_id: Option<DoctorId>,
    pub facility_id: Option<FacilityId>,
}

/// One billable item on an order; the unit the billing cycle advances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: OrderLineId,
    pub order_id: OrderId,
    pub inventory_item_id: Option<i64>,
    pub serial_number: Option<String>,
    pub sale_rent_type: SaleRentType,
    /// 1-based billing cycle counter; advanced by the invoice generator.
    pub billing_month: i32,
    /// Inclusive service span of the current cycle.
    pub dos_from: NaiveDate,
    pub dos_to: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub pickup_date: Option<NaiveDate>,
    pub bill_ins: [bool; 4],
    /// Primary is carried on the claim but expects no payment.
    pub nopay_ins1: bool,
    pub accept_assignment: bool,
    pub ordered_quantity: Decimal,
    pub billed_quantity: Decimal,
    pub delivery_quantity: Decimal,
    pub ordered_when: Frequency,
    pub billed_when: Frequency,
    pub billable_price: Decimal,
    pub allowable_price: Decimal,
    /// Purchase price used by the Rent-to-Purchase month-10 payout.
    pub sale_price: Decimal,
    /// Flat-rate lines bill quantity 1 regardless of the ordered quantity.
    pub flat_rate: bool,
    pub taxable: bool,
    pub modifiers: [String; 4],
    pub auth_expires_on: Option<NaiveDate>,
    pub cmn_form_id: Option<CmnFormId>,
    pub state: OrderLineState,
    pub is_active: bool,
}

impl OrderLine {
    /// Billing month normalized to at least 1 for the schedule math.
    pub fn normalized_billing_month(&self) -> i32 {
        self.billing_month.max(1)
    }
}

/// Policy identifiers snapshotted onto an invoice slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicySlot {
    pub policy_id: PolicyId,
    pub company_id: CompanyId,
}

/// An invoice generated from an order for one billing month. Policies and
/// diagnosis codes are snapshotted so later order edits cannot rewrite a
/// billed claim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub customer_id: CustomerId,
    pub order_id: OrderId,
    pub invoice_date: NaiveDate,
    pub policies: [Option<PolicySlot>; 4],
    pub icd9: Vec<String>,
    pub icd10: Vec<String>,
    pub discount_percent: Decimal,
    /// Running balance: the sum of the line balances, refreshed on recalc.
    pub balance: Decimal,
}

impl Invoice {
    /// Slot index (0..=3) of the given insurance company, if it is a payer
    /// on this invoice.
    pub fn slot_of_company(&self, company_id: CompanyId) -> Option<usize> {
        self.policies
            .iter()
            .position(|slot| slot.is_some_and(|s| s.company_id == company_id))
    }

    /// Slot snapshot for an insurance payer.
    pub fn slot_for(&self, payer: Payer) -> Option<PolicySlot> {
        payer.insurance_slot().and_then(|i| self.policies[i])
    }
}

/// One generated order-line month; the unit the ledger settles against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub id: InvoiceLineId,
    pub invoice_id: InvoiceId,
    pub customer_id: CustomerId,
    pub order_id: OrderId,
    pub order_line_id: OrderLineId,
    pub inventory_item_id: Option<i64>,
    pub sale_rent_type: SaleRentType,
    pub billing_month: i32,
    pub dos_from: NaiveDate,
    pub dos_to: NaiveDate,
    pub billable_amount: Decimal,
    pub allowable_amount: Decimal,
    pub taxes: Decimal,
    pub quantity: Decimal,
    pub modifiers: [String; 4],
    pub bill_ins: [bool; 4],
    pub nopay_ins1: bool,
    pub accept_assignment: bool,
    pub hardship: bool,

    // Ledger-derived projection; owned by the recalculator.
    pub balance: Decimal,
    pub payment_amount: Decimal,
    pub writeoff_amount: Decimal,
    pub deductible_amount: Decimal,
    pub current_payer: Option<Payer>,
    pub current_customer_insurance_id: Option<PolicyId>,
    pub current_insurance_company_id: Option<CompanyId>,
    pub submitted: bool,
    pub submitted_date: Option<NaiveDate>,
    /// Last submit date per payer, indexed by [`Payer::index`].
    pub submit_dates: [Option<NaiveDate>; 5],
    pub submits: PayerSet,
    pub pendings: PayerSet,
    pub payments: PayerSet,
}

/// A Certificate of Medical Necessity on file for an order line. Only the
/// presence of the type-specific answers is validated here; form content
/// belongs to the forms subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CmnForm {
    pub id: CmnFormId,
    /// Form type, e.g. `"DMERC 484.2"` (oxygen) or `"DMERC 802"`.
    pub cmn_type: String,
    pub answers: std::collections::BTreeMap<String, String>,
}

/// A prepayment taken against an order line, converted into a patient
/// `Payment` transaction when the first invoice is generated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deposit {
    pub order_line_id: OrderLineId,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub payment_method: String,
}
