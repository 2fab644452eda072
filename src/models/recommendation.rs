use super::matching::PaymentRecord;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Population summary statistics over elapsed-day terms
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TermStats {
    pub mean: f64,
    pub std_dev: f64,
    pub count: usize,
}

/// Institutional category of a debtor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityCategory {
    GovernmentEntity,
    Municipality,
    MunicipalCorp,
    Unclassified,
}

impl EntityCategory {
    pub fn is_classified(&self) -> bool {
        !matches!(self, Self::Unclassified)
    }
}

/// Open delinquent invoice with its computed ages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelinquentInvoice {
    pub doc_number: Option<String>,
    pub operation_number: Option<String>,
    pub amount: Option<BigDecimal>,
    pub balance: Option<BigDecimal>,
    pub cession_date: Option<NaiveDate>,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub days_since_issue: Option<i64>,
    pub days_past_due: Option<i64>,
}

/// Peer group used when the debtor has no payment history of its own
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerSummary {
    pub sector: String,
    pub bracket: String,
    pub bracket_description: String,
    pub peer_companies: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub sample_size: usize,
}

/// Per-debtor credit term recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub debtor_id: String,
    pub debtor_name: String,
    pub entity_category: Option<EntityCategory>,
    pub recommended_term: Option<i64>,
    pub term_factor: f64,
    pub requires_manual_review: bool,
    /// Up to five most recent clean records, newest first
    pub recent_payments: Vec<PaymentRecord>,
    pub recent_mean: Option<f64>,
    /// Mean and count of the clean records; `std_dev` spans every matched
    /// record, outliers included
    pub stats: Option<TermStats>,
    pub slowest_payment: Option<PaymentRecord>,
    pub delinquent_invoices: Vec<DelinquentInvoice>,
    pub risk_detected: bool,
    pub message: String,
    pub peers: Option<PeerSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsufficiencyReason {
    /// No payment history and no company record
    NotFound,
    /// Every matched record was rejected as an outlier
    AllOutliers,
    /// Company record lacks sector or bracket
    IncompleteCompany,
    /// Peer group has no matched payments
    NoPeerData,
    /// Peer group payments were all outliers
    NoReliablePeerData,
}

/// Terminal negative result; never a crash
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsufficientData {
    pub debtor_id: String,
    pub reason: InsufficiencyReason,
    pub message: String,
    pub fallback_term: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecommendationOutcome {
    Recommendation(Recommendation),
    InsufficientData(InsufficientData),
}

impl RecommendationOutcome {
    pub fn recommended_term(&self) -> Option<i64> {
        match self {
            Self::Recommendation(r) => r.recommended_term,
            Self::InsufficientData(d) => d.fallback_term,
        }
    }
}
