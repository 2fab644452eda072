use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Invoice status as recorded in the "list docs" batches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceStatus {
    Delinquent,
    Other(String),
}

impl InvoiceStatus {
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("MOROSO") {
            Self::Delinquent
        } else {
            Self::Other(trimmed.to_string())
        }
    }

    pub fn is_delinquent(&self) -> bool {
        matches!(self, Self::Delinquent)
    }
}

/// Payment status as recorded in the cartola ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Paid,
    Other(String),
}

impl PaymentStatus {
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("PAGADO") || trimmed.eq_ignore_ascii_case("PAID") {
            Self::Paid
        } else {
            Self::Other(trimmed.to_string())
        }
    }

    pub fn is_paid(&self) -> bool {
        matches!(self, Self::Paid)
    }
}

/// Invoice ("doc"): a debt obligation of a debtor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub debtor_id: String,
    pub debtor_name: Option<String>,
    pub doc_number: Option<String>,
    pub operation_number: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub cession_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub amount: Option<BigDecimal>,
    pub balance: Option<BigDecimal>,
    pub status: InvoiceStatus,
}

/// Payment: a settlement event from the cartola
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub debtor_id: String,
    pub doc_number: Option<String>,
    pub operation_number: Option<String>,
    pub payment_date: Option<NaiveDate>,
    pub amount_paid: Option<BigDecimal>,
    pub status: PaymentStatus,
}
