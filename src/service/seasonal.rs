use crate::models::{EntityCategory, PaymentRecord, TermStats};
use chrono::{Datelike, NaiveDate};

/// Nov, Dec, Jan, Feb: end-of-year payment slowdown
pub const SEASONAL_MONTHS: [u32; 4] = [11, 12, 1, 2];

pub const DEFAULT_TERM_FACTOR: f64 = 15.0;
pub const INSTITUTIONAL_TERM_FACTOR: f64 = 7.5;
pub const GOVERNMENT_TERM: i64 = 60;

/// (upper bound of the base mean, recommended term), checked in order.
/// A base above the last bound needs manual evaluation.
const MUNICIPAL_TERM_TABLE: [(f64, i64); 3] = [(45.0, 45), (70.0, 90), (90.0, 105)];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeasonalOutcome {
    pub recommended_term: Option<i64>,
    pub term_factor: f64,
    pub requires_manual_review: bool,
}

impl SeasonalOutcome {
    fn general() -> Self {
        Self {
            recommended_term: None,
            term_factor: DEFAULT_TERM_FACTOR,
            requires_manual_review: false,
        }
    }

    fn institutional(term: Option<i64>) -> Self {
        Self {
            recommended_term: term,
            term_factor: INSTITUTIONAL_TERM_FACTOR,
            requires_manual_review: term.is_none(),
        }
    }
}

pub fn in_season(date: NaiveDate) -> bool {
    SEASONAL_MONTHS.contains(&date.month())
}

/// Mean term of the clean records paid inside the seasonal months.
pub fn seasonal_mean(clean: &[PaymentRecord]) -> Option<f64> {
    let seasonal: Vec<i64> = clean
        .iter()
        .filter(|r| in_season(r.payment_date))
        .map(|r| r.term_days)
        .collect();
    if seasonal.is_empty() {
        None
    } else {
        Some(seasonal.iter().sum::<i64>() as f64 / seasonal.len() as f64)
    }
}

/// Seasonal overrides for classified institutions.
///
/// Outside the seasonal months, and for unclassified debtors, the result is
/// the general rule (no term, factor 15); the caller then computes the
/// statistical term.
pub fn apply_rules(
    category: EntityCategory,
    seasonal_mean: Option<f64>,
    history: &TermStats,
    today: NaiveDate,
) -> SeasonalOutcome {
    if !in_season(today) {
        return SeasonalOutcome::general();
    }

    match category {
        EntityCategory::Unclassified => SeasonalOutcome::general(),
        EntityCategory::GovernmentEntity => SeasonalOutcome::institutional(Some(GOVERNMENT_TERM)),
        EntityCategory::Municipality | EntityCategory::MunicipalCorp => {
            let base = seasonal_mean.unwrap_or(history.mean);
            let term = MUNICIPAL_TERM_TABLE
                .iter()
                .find(|(bound, _)| base <= *bound)
                .map(|(_, term)| *term);
            if term.is_none() {
                tracing::info!("Seasonal base {:.1} days exceeds municipal table, manual evaluation", base);
            }
            SeasonalOutcome::institutional(term)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn history(mean: f64) -> TermStats {
        TermStats { mean, std_dev: 12.0, count: 8 }
    }

    fn record(paid: NaiveDate, term_days: i64) -> PaymentRecord {
        PaymentRecord {
            doc_number: "1".to_string(),
            operation_number: "A".to_string(),
            cession_date: None,
            issue_date: paid - chrono::Duration::days(term_days),
            payment_date: paid,
            term_days,
            amount: None,
        }
    }

    #[test]
    fn outside_season_is_always_general() {
        for category in [
            EntityCategory::GovernmentEntity,
            EntityCategory::Municipality,
            EntityCategory::MunicipalCorp,
            EntityCategory::Unclassified,
        ] {
            let outcome = apply_rules(category, Some(30.0), &history(30.0), date(2024, 6, 15));
            assert_eq!(outcome.recommended_term, None);
            assert_eq!(outcome.term_factor, DEFAULT_TERM_FACTOR);
            assert!(!outcome.requires_manual_review);
        }
    }

    #[test]
    fn government_entity_in_december_is_fixed() {
        for mean in [5.0, 60.0, 400.0] {
            let outcome = apply_rules(
                EntityCategory::GovernmentEntity,
                Some(mean),
                &history(mean),
                date(2024, 12, 3),
            );
            assert_eq!(outcome.recommended_term, Some(60));
            assert_eq!(outcome.term_factor, 7.5);
        }
    }

    #[test]
    fn municipality_in_january_with_mean_fifty() {
        let outcome = apply_rules(EntityCategory::Municipality, Some(50.0), &history(20.0), date(2025, 1, 20));
        assert_eq!(outcome.recommended_term, Some(90));
        assert_eq!(outcome.term_factor, 7.5);
    }

    #[test]
    fn municipal_table_boundaries() {
        let cases = [
            (45.0, Some(45)),
            (45.01, Some(90)),
            (70.0, Some(90)),
            (70.5, Some(105)),
            (90.0, Some(105)),
            (90.01, None),
        ];
        for (base, expected) in cases {
            let outcome = apply_rules(EntityCategory::MunicipalCorp, Some(base), &history(0.0), date(2024, 11, 1));
            assert_eq!(outcome.recommended_term, expected, "base {base}");
            assert_eq!(outcome.term_factor, 7.5);
            assert_eq!(outcome.requires_manual_review, expected.is_none());
        }
    }

    #[test]
    fn municipal_base_falls_back_to_history_mean() {
        let outcome = apply_rules(EntityCategory::Municipality, None, &history(80.0), date(2024, 2, 29));
        assert_eq!(outcome.recommended_term, Some(105));
    }

    #[test]
    fn unclassified_in_season_is_general() {
        let outcome = apply_rules(EntityCategory::Unclassified, Some(50.0), &history(50.0), date(2024, 12, 24));
        assert_eq!(outcome, SeasonalOutcome::general());
    }

    #[test]
    fn seasonal_mean_uses_payment_month() {
        let records = vec![
            record(date(2023, 11, 30), 40),
            record(date(2024, 2, 10), 60),
            record(date(2024, 3, 1), 10),
        ];
        assert_eq!(seasonal_mean(&records), Some(50.0));
        assert_eq!(seasonal_mean(&records[2..]), None);
    }
}
