use crate::models::{DelinquentInvoice, Invoice, MatchKey};
use crate::service::normalizer::match_key;
use bigdecimal::{BigDecimal, Zero};
use chrono::NaiveDate;
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DelinquencyReport {
    pub invoices: Vec<DelinquentInvoice>,
    pub risk_detected: bool,
}

/// Unresolved delinquent invoices with their ages as of `today`.
///
/// An invoice is skipped when its key appears among paid payments or its
/// outstanding balance is zero or negative. Risk is flagged when any
/// remaining invoice is older (since issue) than the recommended term.
pub fn evaluate(
    invoices: &[Invoice],
    paid_keys: &HashSet<MatchKey>,
    recommended_term: Option<i64>,
    today: NaiveDate,
) -> DelinquencyReport {
    let open: Vec<DelinquentInvoice> = invoices
        .iter()
        .filter(|inv| inv.status.is_delinquent())
        .filter(|inv| {
            match_key(inv.doc_number.as_deref(), inv.operation_number.as_deref())
                .map_or(true, |key| !paid_keys.contains(&key))
        })
        .filter(|inv| inv.balance.as_ref().map_or(true, |b| *b > BigDecimal::zero()))
        .map(|inv| DelinquentInvoice {
            doc_number: inv.doc_number.clone(),
            operation_number: inv.operation_number.clone(),
            amount: inv.amount.clone(),
            balance: inv.balance.clone(),
            cession_date: inv.cession_date,
            issue_date: inv.issue_date,
            due_date: inv.due_date,
            days_since_issue: inv.issue_date.map(|d| (today - d).num_days()),
            days_past_due: inv.due_date.map(|d| (today - d).num_days()),
        })
        .collect();

    let risk_detected = recommended_term.map_or(false, |term| {
        open.iter()
            .any(|inv| inv.days_since_issue.map_or(false, |days| days > term))
    });

    DelinquencyReport {
        invoices: open,
        risk_detected,
    }
}
