use serde::{Deserialize, Serialize};

/// A party that can be responsible for (part of) an invoice-line balance:
/// one of the four insurance slots on the order, or the patient.
///
/// The numeric bits and the string tokens are wire-stable — projections are
/// persisted as integer bitfields and claim files carry the tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Payer {
    Ins1,
    Ins2,
    Ins3,
    Ins4,
    Patient,
}

impl Payer {
    /// All payers, in responsibility order: insurances first, patient last.
    pub const ALL: [Payer; 5] = [
        Payer::Ins1,
        Payer::Ins2,
        Payer::Ins3,
        Payer::Ins4,
        Payer::Patient,
    ];

    /// The four insurance payers, in slot order.
    pub const INSURANCES: [Payer; 4] = [Payer::Ins1, Payer::Ins2, Payer::Ins3, Payer::Ins4];

    /// Wire bit: Ins1=1, Ins2=2, Ins3=4, Ins4=8, Patient=16.
    pub fn bit(self) -> u8 {
        match self {
            Payer::Ins1 => 1,
            Payer::Ins2 => 2,
            Payer::Ins3 => 4,
            Payer::Ins4 => 8,
            Payer::Patient => 16,
        }
    }

    /// Dense index 0..=4, usable for per-payer accumulator arrays.
    pub fn index(self) -> usize {
        match self {
            Payer::Ins1 => 0,
            Payer::Ins2 => 1,
            Payer::Ins3 => 2,
            Payer::Ins4 => 3,
            Payer::Patient => 4,
        }
    }

    /// Insurance slot index 0..=3, or `None` for the patient.
    pub fn insurance_slot(self) -> Option<usize> {
        match self {
            Payer::Patient => None,
            other => Some(other.index()),
        }
    }

    /// Insurance payer for a policy slot index 0..=3.
    pub fn from_insurance_slot(slot: usize) -> Option<Payer> {
        Payer::INSURANCES.get(slot).copied()
    }

    /// Wire token (`"Ins1"` … `"Patient"`).
    pub fn token(self) -> &'static str {
        match self {
            Payer::Ins1 => "Ins1",
            Payer::Ins2 => "Ins2",
            Payer::Ins3 => "Ins3",
            Payer::Ins4 => "Ins4",
            Payer::Patient => "Patient",
        }
    }

    /// Parse a wire token.
    pub fn from_token(token: &str) -> Option<Payer> {
        match token {
            "Ins1" => Some(Payer::Ins1),
            "Ins2" => Some(Payer::Ins2),
            "Ins3" => Some(Payer::Ins3),
            "Ins4" => Some(Payer::Ins4),
            "Patient" => Some(Payer::Patient),
            _ => None,
        }
    }
}

/// Wire token for an optional current payer; an unset payer is `"None"`.
pub fn current_payer_token(payer: Option<Payer>) -> &'static str {
    payer.map_or("None", Payer::token)
}

/// A set of payers, backed by the wire bitfield.
///
/// The five-bit integer encoding (`Ins1=1 … Patient=16`) is what the
/// `Submits` / `Pendings` / `Payments` projection columns persist, so the
/// in-memory representation is the wire representation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PayerSet(u8);

impl PayerSet {
    pub const EMPTY: PayerSet = PayerSet(0);

    const MASK: u8 = 0b1_1111;

    /// Reconstruct a set from a persisted bitfield. Bits outside the five
    /// payer bits are dropped.
    pub fn from_bits(bits: u8) -> PayerSet {
        PayerSet(bits & Self::MASK)
    }

    /// The persisted bitfield.
    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, payer: Payer) -> bool {
        self.0 & payer.bit() != 0
    }

    pub fn insert(&mut self, payer: Payer) {
        self.0 |= payer.bit();
    }

    pub fn remove(&mut self, payer: Payer) {
        self.0 &= !payer.bit();
    }

    /// Members in payer order (insurances by slot, then patient).
    pub fn iter(self) -> impl Iterator<Item = Payer> {
        Payer::ALL.into_iter().filter(move |p| self.contains(*p))
    }
}

impl FromIterator<Payer> for PayerSet {
    fn from_iter<I: IntoIterator<Item = Payer>>(iter: I) -> Self {
        let mut set = PayerSet::EMPTY;
        for payer in iter {
            set.insert(payer);
        }
        set
    }
}
