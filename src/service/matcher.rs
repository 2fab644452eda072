use crate::models::{Invoice, MatchKey, MatchOutput, Payment, PaymentRecord};
use crate::service::normalizer::match_key;
use indexmap::IndexMap;
use std::collections::HashSet;

/// Paid payments indexed by normalized key (insertion order preserved)
pub struct PaymentIndex<'a> {
    by_key: IndexMap<MatchKey, &'a Payment>,
    collisions: usize,
}

impl<'a> PaymentIndex<'a> {
    /// Index paid payments. When two payments share a key the one with the
    /// later payment date is kept; if either date is missing or both are
    /// equal, the later-encountered payment is kept.
    pub fn build(payments: &'a [Payment]) -> Self {
        let mut by_key: IndexMap<MatchKey, &'a Payment> = IndexMap::with_capacity(payments.len());
        let mut collisions = 0;

        for payment in payments.iter().filter(|p| p.status.is_paid()) {
            let Some(key) = match_key(payment.doc_number.as_deref(), payment.operation_number.as_deref())
            else {
                continue;
            };

            match by_key.get_mut(&key) {
                Some(existing) => {
                    collisions += 1;
                    let keep_existing = matches!(
                        (existing.payment_date, payment.payment_date),
                        (Some(old), Some(new)) if old > new
                    );
                    tracing::debug!(
                        "Payment key collision on {}/{} (keeping {})",
                        key.doc,
                        key.operation,
                        if keep_existing { "earlier entry" } else { "later entry" }
                    );
                    if !keep_existing {
                        *existing = payment;
                    }
                }
                None => {
                    by_key.insert(key, payment);
                }
            }
        }

        Self { by_key, collisions }
    }

    pub fn get(&self, key: &MatchKey) -> Option<&'a Payment> {
        self.by_key.get(key).copied()
    }

    pub fn collisions(&self) -> usize {
        self.collisions
    }

    pub fn keys(&self) -> impl Iterator<Item = &MatchKey> {
        self.by_key.keys()
    }
}

/// Join invoices to paid payments by normalized key.
///
/// Invoices without a key, without a payment, or with an unparsable or
/// inverted issue/payment date pair are left out. Each key yields at most
/// one record (first invoice wins).
pub fn match_records(payments: &[Payment], invoices: &[Invoice]) -> MatchOutput {
    let index = PaymentIndex::build(payments);
    let mut output = MatchOutput {
        paid_keys: index.keys().cloned().collect(),
        key_collisions: index.collisions(),
        ..MatchOutput::default()
    };

    let mut joined: HashSet<MatchKey> = HashSet::new();
    for invoice in invoices {
        let Some(key) = match_key(invoice.doc_number.as_deref(), invoice.operation_number.as_deref())
        else {
            continue;
        };
        let Some(payment) = index.get(&key) else {
            continue;
        };
        if joined.contains(&key) {
            continue;
        }

        let (Some(issue_date), Some(payment_date)) = (invoice.issue_date, payment.payment_date) else {
            output.malformed += 1;
            continue;
        };
        let term_days = (payment_date - issue_date).num_days();
        if term_days < 0 {
            output.malformed += 1;
            continue;
        }

        joined.insert(key.clone());
        output.records.push(PaymentRecord {
            doc_number: key.doc,
            operation_number: key.operation,
            cession_date: invoice.cession_date,
            issue_date,
            payment_date,
            term_days,
            amount: invoice.amount.clone(),
        });
    }

    if output.malformed > 0 || output.key_collisions > 0 {
        tracing::debug!(
            "Matched {} records ({} malformed, {} key collisions)",
            output.records.len(),
            output.malformed,
            output.key_collisions
        );
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InvoiceStatus, PaymentStatus};
    use bigdecimal::BigDecimal;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn invoice(doc: &str, op: &str, issued: Option<NaiveDate>) -> Invoice {
        Invoice {
            debtor_id: "76107905-0".to_string(),
            debtor_name: Some("ACME LTDA".to_string()),
            doc_number: Some(doc.to_string()),
            operation_number: Some(op.to_string()),
            issue_date: issued,
            cession_date: None,
            due_date: None,
            amount: Some(BigDecimal::from_str("1000").unwrap()),
            balance: None,
            status: InvoiceStatus::Other("VIGENTE".to_string()),
        }
    }

    fn payment(doc: &str, op: &str, paid: Option<NaiveDate>, status: &str) -> Payment {
        Payment {
            debtor_id: "76.107.905-0".to_string(),
            doc_number: Some(doc.to_string()),
            operation_number: Some(op.to_string()),
            payment_date: paid,
            amount_paid: None,
            status: PaymentStatus::from_raw(status),
        }
    }

    #[test]
    fn tolerates_leading_zero_and_case() {
        let invoices = vec![invoice("001", "A", Some(date(2024, 1, 10)))];
        let payments = vec![payment("1", "a", Some(date(2024, 2, 9)), "PAID")];

        let output = match_records(&payments, &invoices);
        assert_eq!(output.records.len(), 1);
        assert_eq!(output.records[0].term_days, 30);
        assert_eq!(output.records[0].doc_number, "1");
        assert_eq!(output.records[0].operation_number, "A");
    }

    #[test]
    fn unpaid_payments_do_not_join() {
        let invoices = vec![invoice("10", "X", Some(date(2024, 1, 1)))];
        let payments = vec![payment("10", "X", Some(date(2024, 1, 20)), "PENDIENTE")];

        let output = match_records(&payments, &invoices);
        assert!(output.is_empty());
        assert!(output.paid_keys.is_empty());
    }

    #[test]
    fn malformed_dates_are_skipped_not_fatal() {
        let invoices = vec![
            invoice("1", "A", None),
            invoice("2", "A", Some(date(2024, 3, 1))),
            invoice("3", "A", Some(date(2024, 3, 1))),
        ];
        let payments = vec![
            payment("1", "A", Some(date(2024, 3, 5)), "PAGADO"),
            payment("2", "A", None, "PAGADO"),
            payment("3", "A", Some(date(2024, 3, 31)), "PAGADO"),
        ];

        let output = match_records(&payments, &invoices);
        assert_eq!(output.malformed, 2);
        assert_eq!(output.terms(), vec![30]);
        assert_eq!(output.paid_keys.len(), 3);
    }

    #[test]
    fn negative_terms_are_treated_as_anomalies() {
        let invoices = vec![invoice("5", "B", Some(date(2024, 5, 10)))];
        let payments = vec![payment("5", "B", Some(date(2024, 5, 1)), "PAGADO")];

        let output = match_records(&payments, &invoices);
        assert!(output.is_empty());
        assert_eq!(output.malformed, 1);
    }

    #[test]
    fn key_collision_keeps_latest_payment_date() {
        let payments = vec![
            payment("7", "C", Some(date(2024, 4, 20)), "PAGADO"),
            payment("07", "c", Some(date(2024, 4, 10)), "PAGADO"),
        ];
        let index = PaymentIndex::build(&payments);
        assert_eq!(index.keys().count(), 1);
        assert_eq!(index.collisions(), 1);
        let key = match_key(Some("7"), Some("C")).unwrap();
        assert_eq!(index.get(&key).unwrap().payment_date, Some(date(2024, 4, 20)));
    }

    #[test]
    fn key_collision_with_equal_dates_keeps_later_entry() {
        let mut first = payment("8", "D", Some(date(2024, 4, 10)), "PAGADO");
        first.amount_paid = Some(BigDecimal::from(1));
        let mut second = payment("8", "D", Some(date(2024, 4, 10)), "PAGADO");
        second.amount_paid = Some(BigDecimal::from(2));
        let mut undated = payment("8", "D", None, "PAGADO");
        undated.amount_paid = Some(BigDecimal::from(3));

        let pair = vec![first.clone(), second];
        let key = match_key(Some("8"), Some("D")).unwrap();
        let index = PaymentIndex::build(&pair);
        assert_eq!(index.get(&key).unwrap().amount_paid, Some(BigDecimal::from(2)));

        let with_undated = vec![first, undated];
        let index = PaymentIndex::build(&with_undated);
        assert_eq!(index.get(&key).unwrap().amount_paid, Some(BigDecimal::from(3)));
    }

    #[test]
    fn duplicate_invoices_join_once() {
        let invoices = vec![
            invoice("9", "E", Some(date(2024, 1, 1))),
            invoice("009", "e", Some(date(2024, 1, 5))),
        ];
        let payments = vec![payment("9", "E", Some(date(2024, 1, 31)), "PAGADO")];

        let output = match_records(&payments, &invoices);
        assert_eq!(output.terms(), vec![30]);
    }
}
