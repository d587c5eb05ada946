//! The payment "extra" blob and the poster option set.
//!
//! The blob is an order-insensitive key-value document. Field names are
//! wire-stable (`Paid`, `Allowable`, `Deductible`, `Sequestration`,
//! `ContractualWriteoff`, `CheckNumber`, `PostingGuid`, `PaymentMethod`,
//! `CheckDate`); the canonical representation here is JSON. Numeric fields
//! must be plain signed decimals — anything else is treated as absent, not
//! as an error.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::{Map, Value};

/// Parsed payment extra blob.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentExtra {
    pub paid: Option<Decimal>,
    pub allowable: Option<Decimal>,
    pub deductible: Option<Decimal>,
    pub sequestration: Option<Decimal>,
    pub contractual_writeoff: Option<Decimal>,
    pub check_number: Option<String>,
    pub posting_guid: Option<String>,
    pub payment_method: Option<String>,
    pub check_date: Option<String>,
}

impl PaymentExtra {
    /// Read the recognized named values out of a blob. Unparseable numeric
    /// fields remain `None`.
    pub fn parse(blob: &Value) -> Self {
        Self {
            paid: amount_field(blob, "Paid"),
            allowable: amount_field(blob, "Allowable"),
            deductible: amount_field(blob, "Deductible"),
            sequestration: amount_field(blob, "Sequestration"),
            contractual_writeoff: amount_field(blob, "ContractualWriteoff"),
            check_number: string_field(blob, "CheckNumber"),
            posting_guid: string_field(blob, "PostingGuid"),
            payment_method: string_field(blob, "PaymentMethod"),
            check_date: string_field(blob, "CheckDate"),
        }
    }

    /// Canonical blob with the wire field names, amounts as strings.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        let mut amount = |name: &str, value: Option<Decimal>| {
            if let Some(v) = value {
                map.insert(name.to_string(), Value::String(v.to_string()));
            }
        };
        amount("Paid", self.paid);
        amount("Allowable", self.allowable);
        amount("Deductible", self.deductible);
        amount("Sequestration", self.sequestration);
        amount("ContractualWriteoff", self.contractual_writeoff);
        let mut string = |name: &str, value: &Option<String>| {
            if let Some(v) = value {
                map.insert(name.to_string(), Value::String(v.clone()));
            }
        };
        string("CheckNumber", &self.check_number);
        string("PostingGuid", &self.posting_guid);
        string("PaymentMethod", &self.payment_method);
        string("CheckDate", &self.check_date);
        Value::Object(map)
    }
}

fn string_field(blob: &Value, name: &str) -> Option<String> {
    match blob.get(name) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn amount_field(blob: &Value, name: &str) -> Option<Decimal> {
    match blob.get(name)? {
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        Value::String(s) => parse_strict_decimal(s),
        _ => None,
    }
}

/// Parse a plain signed decimal: optional sign, digits with at most one
/// point, at least one digit. Whitespace around the value is tolerated;
/// everything else is rejected.
pub fn parse_strict_decimal(input: &str) -> Option<Decimal> {
    let trimmed = input.trim();
    let unsigned = trimmed
        .strip_prefix(['+', '-'])
        .unwrap_or(trimmed);
    if unsigned.is_empty() {
        return None;
    }

    let mut digits = 0usize;
    let mut points = 0usize;
    for c in unsigned.chars() {
        match c {
            '0'..='9' => digits += 1,
            '.' => points += 1,
            _ => return None,
        }
    }
    if digits == 0 || points > 1 {
        return None;
    }

    // Normalize the shapes rust_decimal's parser does not accept.
    let negative = trimmed.starts_with('-');
    let body = unsigned.strip_suffix('.').unwrap_or(unsigned);
    let body = if body.starts_with('.') {
        format!("0{body}")
    } else {
        body.to_string()
    };
    let value = Decimal::from_str(&body).ok()?;
    Some(if negative { -value } else { value })
}

/// Comma-set of optional poster steps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaymentOptions {
    pub adjust_allowable: bool,
    pub post_denied: bool,
    pub writeoff_balance: bool,
}

impl PaymentOptions {
    /// Parse the comma-separated option set. Unknown options are ignored.
    pub fn parse(options: &str) -> Self {
        let mut parsed = Self::default();
        for option in options.split(',') {
            match option.trim() {
                "Adjust Allowable" => parsed.adjust_allowable = true,
                "Post Denied" => parsed.post_denied = true,
                "Writeoff Balance" => parsed.writeoff_balance = true,
                _ => {}
            }
        }
        parsed
    }
}
