//! Missing/erroneous-information (MIR) derivation.
//!
//! MIR codes are not errors: they are structured defect codes attached to
//! an entity (`"FirstName,Doctor,ICD10.01.Unknown"`) that downstream claim
//! gating reads. Every function here is a pure derivation over the data
//! model; nothing is stored.
//!
//! Diagnosis requirements are keyed by the service date: spans on or after
//! the 2015-10-01 cutover must carry ICD-10 codes, earlier spans ICD-9.

use std::collections::HashSet;

use chrono::NaiveDate;

use crate::core::{CmnForm, Customer, CustomerInsurance, Doctor, Facility, Order, OrderLine};

/// Service dates on or after this day require ICD-10 diagnosis codes.
pub fn icd10_cutover() -> NaiveDate {
    NaiveDate::from_ymd_opt(2015, 10, 1).unwrap()
}

/// Join defect codes into the wire CSV.
pub fn join_codes(codes: &[String]) -> String {
    codes.join(",")
}

/// Known diagnosis codes, used for the `Unknown` checks. An empty table
/// means the reference data is not loaded, and code lookups pass.
#[derive(Debug, Clone, Default)]
pub struct DiagnosisTable {
    icd9: HashSet<String>,
    icd10: HashSet<String>,
}

impl DiagnosisTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_icd9(&mut self, code: impl Into<String>) {
        self.icd9.insert(code.into());
    }

    pub fn add_icd10(&mut self, code: impl Into<String>) {
        self.icd10.insert(code.into());
    }

    pub fn is_known_icd9(&self, code: &str) -> bool {
        self.icd9.is_empty() || self.icd9.contains(code)
    }

    pub fn is_known_icd10(&self, code: &str) -> bool {
        self.icd10.is_empty() || self.icd10.contains(code)
    }
}

/// Customer demographic checks. Commercial accounts are institutional
/// buyers and carry no patient demographics, so all checks are suppressed.
pub fn customer_mir(customer: &Customer) -> Vec<String> {
    let mut codes = Vec::new();
    if customer.commercial_account {
        return codes;
    }

    push_if_blank(&mut codes, &customer.first_name, "FirstName");
    push_if_blank(&mut codes, &customer.last_name, "LastName");
    push_if_blank(&mut codes, &customer.address1, "Address1");
    push_if_blank(&mut codes, &customer.city, "City");
    push_if_blank(&mut codes, &customer.state, "State");
    push_if_blank(&mut codes, &customer.postal_code, "PostalCode");
    if customer.date_of_birth.is_none() {
        codes.push("DateofBirth".into());
    }
    if customer.gender.as_deref().is_none_or(|g| g.trim().is_empty()) {
        codes.push("Gender".into());
    }
    codes
}

/// Policy checks. When the patient is not the insured (relationship code
/// other than 18), the insured-person block must be complete.
pub fn policy_mir(policy: &CustomerInsurance) -> Vec<String> {
    let mut codes = Vec::new();
    push_if_blank(&mut codes, &policy.policy_number, "PolicyNumber");

    if !policy.insured_is_self() {
        push_if_blank_opt(&mut codes, &policy.insured_first_name, "FirstName");
        push_if_blank_opt(&mut codes, &policy.insured_last_name, "LastName");
        push_if_blank_opt(&mut codes, &policy.insured_address1, "Address1");
        push_if_blank_opt(&mut codes, &policy.insured_city, "City");
        push_if_blank_opt(&mut codes, &policy.insured_state, "State");
        push_if_blank_opt(&mut codes, &policy.insured_postal_code, "PostalCode");
        push_if_blank_opt(&mut codes, &policy.insured_gender, "Gender");
        if policy.insured_date_of_birth.is_none() {
            codes.push("DateofBirth".into());
        }
    }
    codes
}

/// Ordering-physician checks. The NPI must be exactly ten digits
/// (trailing whitespace tolerated).
pub fn doctor_mir(doctor: &Doctor) -> Vec<String> {
    let mut codes = Vec::new();
    push_if_blank(&mut codes, &doctor.first_name, "FirstName");
    push_if_blank(&mut codes, &doctor.last_name, "LastName");
    if doctor.npi.as_deref().is_none_or(|npi| !is_valid_npi(npi)) {
        codes.push("NPI".into());
    }
    codes
}

/// Place-of-service checks.
pub fn facility_mir(facility: &Facility) -> Vec<String> {
    let mut codes = Vec::new();
    push_if_blank(&mut codes, &facility.name, "Name");
    push_if_blank(&mut codes, &facility.address1, "Address1");
    push_if_blank(&mut codes, &facility.city, "City");
    push_if_blank(&mut codes, &facility.state, "State");
    push_if_blank(&mut codes, &facility.postal_code, "PostalCode");
    codes
}

/// CMN-form answer presence by form type. Unknown types have no required
/// answers.
pub fn cmn_form_mir(form: &CmnForm) -> Vec<String> {
    let required: &[&str] = match form.cmn_type.as_str() {
        // Oxygen: test result, saturation, test date, prescribed flow.
        "DMERC 484.2" => &["1a", "1b", "1c", "5"],
        // Hospital beds.
        "DMERC 802" => &["1", "2", "3"],
        // Support surfaces.
        "DMERC 0403C" => &["1", "2"],
        _ => &[],
    };

    let missing = required.iter().any(|key| {
        form.answers
            .get(*key)
            .is_none_or(|answer| answer.trim().is_empty())
    });
    if missing {
        vec!["Answers".into()]
    } else {
        Vec::new()
    }
}

/// Order-level checks.
pub fn order_mir(order: &Order) -> Vec<String> {
    let mut codes = Vec::new();
    if order.doctor_id.is_none() {
        codes.push("Doctor".into());
    }
    if !order.approved {
        codes.push("Approved".into());
    }
    codes
}

/// Order-line checks: diagnosis codes for the line's service date era,
/// authorization expiry, and the line's CMN form.
pub fn order_line_mir(
    line: &OrderLine,
    order: &Order,
    cmn: Option<&CmnForm>,
    diagnosis: &DiagnosisTable,
) -> Vec<String> {
    let mut codes = Vec::new();

    if line.dos_from >= icd10_cutover() {
        if order.icd10.is_empty() {
            codes.push("ICD10.Required".into());
        } else {
            for (i, code) in order.icd10.iter().enumerate() {
                if !diagnosis.is_known_icd10(code) {
                    codes.push(format!("ICD10.{:02}.Unknown", i + 1));
                }
            }
        }
    } else if order.icd9.is_empty() {
        codes.push("ICD9.Required".into());
    } else {
        for (i, code) in order.icd9.iter().enumerate() {
            if !diagnosis.is_known_icd9(code) {
                codes.push(format!("ICD9.{}.Unknown", i + 1));
            }
        }
    }

    if let Some(expires) = line.auth_expires_on {
        if expires < line.dos_from {
            codes.push("AuthorizationExpired".into());
        }
    }

    if let Some(form) = cmn {
        for code in cmn_form_mir(form) {
            codes.push(format!("CMN.{code}"));
        }
    }

    codes
}

fn is_valid_npi(npi: &str) -> bool {
    let digits = npi.trim_end();
    digits.len() == 10 && digits.chars().all(|c| c.is_ascii_digit())
}

fn push_if_blank(codes: &mut Vec<String>, value: &str, code: &str) {
    if value.trim().is_empty() {
        codes.push(code.to_string());
    }
}

fn push_if_blank_opt(codes: &mut Vec<String>, value: &Option<String>, code: &str) {
    if value.as_deref().is_none_or(|v| v.trim().is_empty()) {
        codes.push(code.to_string());
    }
}
