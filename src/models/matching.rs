use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Normalized (document number, operation number) join key.
/// Both components are non-empty; build it with `service::normalizer::match_key`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MatchKey {
    pub doc: String,
    pub operation: String,
}

/// One invoice joined to its settling payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub doc_number: String,
    pub operation_number: String,
    pub cession_date: Option<NaiveDate>,
    pub issue_date: NaiveDate,
    pub payment_date: NaiveDate,
    /// payment_date - issue_date, in days
    pub term_days: i64,
    pub amount: Option<BigDecimal>,
}

/// Result of joining a debtor's invoices against its paid payments
#[derive(Debug, Clone, Default)]
pub struct MatchOutput {
    pub records: Vec<PaymentRecord>,
    /// Keys of every paid payment, whether or not an invoice joined it
    pub paid_keys: std::collections::HashSet<MatchKey>,
    /// Payments whose key was already taken by another payment
    pub key_collisions: usize,
    /// Invoices that joined a payment but had an unusable date pair
    pub malformed: usize,
}

impl MatchOutput {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn terms(&self) -> Vec<i64> {
        self.records.iter().map(|r| r.term_days).collect()
    }
}
