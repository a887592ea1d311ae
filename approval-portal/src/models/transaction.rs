//! Transaction type labels and their hierarchy codes.

/// Label to code table used by the superior hierarchy.
pub const TRANSACTION_CODES: &[(&str, &str)] = &[
    ("NRM", "NRM"),
    ("Entertainment", "EN"),
    ("Golf Competition", "GC"),
    ("Medical", "ME"),
    ("Others", "OT"),
    ("Travelling", "TR"),
    ("Personal Loan", "LO"),
];

/// Code of the only transaction type that adds the Closed level.
pub const PERSONAL_LOAN_CODE: &str = "LO";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionCode {
    Mapped(&'static str),
    /// The label was not in the table; the fallback code was used.
    Fallback(String),
}

impl TransactionCode {
    pub fn as_str(&self) -> &str {
        match self {
            TransactionCode::Mapped(code) => code,
            TransactionCode::Fallback(code) => code,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, TransactionCode::Fallback(_))
    }
}

/// Map a free-text transaction type to its code. Matching trims and ignores
/// case; a label that already is a known code maps to itself. Never fails.
pub fn transaction_code(label: &str, fallback: &str) -> TransactionCode {
    let label = label.trim();
    TRANSACTION_CODES
        .iter()
        .find(|(name, code)| name.eq_ignore_ascii_case(label) || code.eq_ignore_ascii_case(label))
        .map(|(_, code)| TransactionCode::Mapped(*code))
        .unwrap_or_else(|| TransactionCode::Fallback(fallback.to_string()))
}
