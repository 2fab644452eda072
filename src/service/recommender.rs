use crate::db::RecordStore;
use crate::error::{AppError, AppResult};
use crate::models::{
    EntityCategory, InsufficiencyReason, InsufficientData, Invoice, MatchOutput, PaymentRecord,
    Recommendation, RecommendationOutcome, TermStats,
};
use crate::service::classifier::EntityClassifier;
use crate::service::delinquency;
use crate::service::matcher::match_records;
use crate::service::peers::{self, PeerEstimate};
use crate::service::seasonal::{self, DEFAULT_TERM_FACTOR};
use crate::service::stats::{clean_indices, padded_term, summarize, MIN_TERM_DAYS};
use chrono::{Local, NaiveDate};
use std::sync::Arc;

/// Records used for the recent-behaviour mean
pub const RECENT_WINDOW: usize = 5;

const UNKNOWN_DEBTOR: &str = "Unknown";

/// Recommendation service: sequences matching, statistics, seasonal rules,
/// peer fallback and delinquency evaluation for one debtor.
pub struct Recommender {
    store: Arc<dyn RecordStore>,
    classifier: EntityClassifier,
}

impl Recommender {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self::with_classifier(store, EntityClassifier::default())
    }

    pub fn with_classifier(store: Arc<dyn RecordStore>, classifier: EntityClassifier) -> Self {
        Self { store, classifier }
    }

    /// Recommendation as of the local system date
    pub async fn recommend(&self, rut: &str) -> AppResult<RecommendationOutcome> {
        self.recommend_on(rut, Local::now().date_naive()).await
    }

    pub async fn recommend_on(&self, rut: &str, today: NaiveDate) -> AppResult<RecommendationOutcome> {
        let rut = rut.trim();
        if rut.is_empty() {
            return Err(AppError::InvalidRequest("rut must not be empty".to_string()));
        }

        let (invoices, matched) = self.load_history(rut).await?;
        tracing::info!(
            "RUT {}: {} invoices, {} matched payments",
            rut,
            invoices.len(),
            matched.records.len()
        );

        let outcome = if matched.is_empty() {
            self.from_peers(rut).await?
        } else {
            self.from_history(rut, &invoices, matched, today).await?
        };

        match &outcome {
            RecommendationOutcome::Recommendation(r) => tracing::info!(
                "RUT {}: recommended {:?} days (factor {}, risk {})",
                rut,
                r.recommended_term,
                r.term_factor,
                r.risk_detected
            ),
            RecommendationOutcome::InsufficientData(d) => {
                tracing::info!("RUT {}: insufficient data ({:?}): {}", rut, d.reason, d.message)
            }
        }
        Ok(outcome)
    }

    /// Every matched record of the debtor, newest payment first
    pub async fn matched_history(&self, rut: &str) -> AppResult<Vec<PaymentRecord>> {
        let (_, matched) = self.load_history(rut.trim()).await?;
        let mut records = matched.records;
        sort_newest_first(&mut records);
        Ok(records)
    }

    async fn load_history(&self, rut: &str) -> AppResult<(Vec<Invoice>, MatchOutput)> {
        let (invoices, payments) = futures::try_join!(
            self.store.invoices_for(rut),
            self.store.payments_for(rut, true),
        )?;
        let matched = match_records(&payments, &invoices);
        Ok((invoices, matched))
    }

    async fn from_history(
        &self,
        rut: &str,
        invoices: &[Invoice],
        matched: MatchOutput,
        today: NaiveDate,
    ) -> AppResult<RecommendationOutcome> {
        let terms = matched.terms();
        // deviation over every matched record, outliers included
        let spread = summarize(&terms).map_or(0.0, |all| all.std_dev);
        let mut clean: Vec<PaymentRecord> = clean_indices(&terms)
            .into_iter()
            .map(|i| matched.records[i].clone())
            .collect();

        let Some(clean_stats) = summarize(&clean.iter().map(|r| r.term_days).collect::<Vec<_>>()) else {
            return Ok(RecommendationOutcome::InsufficientData(InsufficientData {
                debtor_id: rut.to_string(),
                reason: InsufficiencyReason::AllOutliers,
                message: "All matched records were considered outliers".to_string(),
                fallback_term: None,
            }));
        };
        let stats = TermStats {
            std_dev: spread,
            ..clean_stats
        };

        sort_newest_first(&mut clean);
        let recent: Vec<PaymentRecord> = clean.iter().take(RECENT_WINDOW).cloned().collect();
        let recent_mean = recent.iter().map(|r| r.term_days as f64).sum::<f64>() / recent.len() as f64;
        let slowest = clean.iter().max_by_key(|r| r.term_days).cloned();

        let category = self.classify(rut, invoices).await?;
        let rules = seasonal::apply_rules(category, seasonal::seasonal_mean(&clean), &stats, today);
        let general_term = padded_term(recent_mean, stats.std_dev, MIN_TERM_DAYS);
        let recommended_term = rules.recommended_term.unwrap_or(general_term);

        let report = delinquency::evaluate(invoices, &matched.paid_keys, Some(recommended_term), today);
        let message = if report.risk_detected {
            "Delinquent documents exceed the recommended term, review term and advance with risk".to_string()
        } else if rules.requires_manual_review {
            format!(
                "Seasonal payment behaviour requires manual evaluation; statistical term is {} days",
                recommended_term
            )
        } else {
            cover_message(recommended_term)
        };

        Ok(RecommendationOutcome::Recommendation(Recommendation {
            debtor_id: rut.to_string(),
            debtor_name: debtor_name(invoices),
            entity_category: category.is_classified().then_some(category),
            recommended_term: Some(recommended_term),
            term_factor: rules.term_factor,
            requires_manual_review: rules.requires_manual_review,
            recent_payments: recent,
            recent_mean: Some(recent_mean),
            stats: Some(stats),
            slowest_payment: slowest,
            delinquent_invoices: report.invoices,
            risk_detected: report.risk_detected,
            message,
            peers: None,
        }))
    }

    async fn from_peers(&self, rut: &str) -> AppResult<RecommendationOutcome> {
        let outcome = match peers::estimate(self.store.as_ref(), rut).await? {
            PeerEstimate::Estimated {
                company,
                summary,
                recommended_term,
            } => RecommendationOutcome::Recommendation(Recommendation {
                debtor_id: rut.to_string(),
                debtor_name: company.name.unwrap_or_else(|| UNKNOWN_DEBTOR.to_string()),
                entity_category: None,
                recommended_term: Some(recommended_term),
                term_factor: DEFAULT_TERM_FACTOR,
                requires_manual_review: false,
                recent_payments: Vec::new(),
                recent_mean: None,
                stats: None,
                slowest_payment: None,
                delinquent_invoices: Vec::new(),
                risk_detected: false,
                message: cover_message(recommended_term),
                peers: Some(summary),
            }),
            PeerEstimate::Unavailable { reason, message, .. } => {
                RecommendationOutcome::InsufficientData(InsufficientData {
                    debtor_id: rut.to_string(),
                    reason,
                    message,
                    fallback_term: Some(MIN_TERM_DAYS),
                })
            }
        };
        Ok(outcome)
    }

    /// Allowlist and invoice names first; the reference table is read only
    /// when those leave the debtor unclassified.
    async fn classify(&self, rut: &str, invoices: &[Invoice]) -> AppResult<EntityCategory> {
        let mut names: Vec<&str> = Vec::new();
        for name in invoices.iter().filter_map(|i| i.debtor_name.as_deref()) {
            if !names.contains(&name) {
                names.push(name);
            }
        }

        let category = self.classifier.classify(rut, &names);
        if category.is_classified() {
            return Ok(category);
        }

        match self.store.reference_category(rut).await? {
            Some(reference) => {
                let mut candidates = names.clone();
                candidates.push(reference.as_str());
                Ok(self.classifier.classify(rut, &candidates))
            }
            None => Ok(category),
        }
    }
}

fn sort_newest_first(records: &mut [PaymentRecord]) {
    records.sort_by(|a, b| b.payment_date.cmp(&a.payment_date));
}

fn debtor_name(invoices: &[Invoice]) -> String {
    invoices
        .iter()
        .find_map(|i| i.debtor_name.clone())
        .unwrap_or_else(|| UNKNOWN_DEBTOR.to_string())
}

fn cover_message(term: i64) -> String {
    format!("Recommended to cover {} days between term and advance", term)
}
