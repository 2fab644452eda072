use crate::db::RecordStore;
use crate::error::AppResult;
use crate::models::{bracket_description, Company, InsufficiencyReason, Invoice, Payment, PeerSummary};
use crate::service::matcher::match_records;
use crate::service::normalizer::rut_key;
use crate::service::stats::{filter_outliers, padded_term, summarize, MIN_TERM_DAYS};
use rayon::prelude::*;
use std::collections::HashMap;

/// Outcome of the peer-similarity fallback
#[derive(Debug, Clone, PartialEq)]
pub enum PeerEstimate {
    Estimated {
        company: Company,
        summary: PeerSummary,
        recommended_term: i64,
    },
    /// Data-availability condition; the caller reports `MIN_TERM_DAYS`.
    Unavailable {
        company: Option<Company>,
        reason: InsufficiencyReason,
        message: String,
    },
}

/// Match every peer's invoices against its own paid payments, in parallel,
/// and pool the elapsed terms (sorted, for stable statistics).
pub fn pool_peer_terms(invoices: Vec<Invoice>, payments: Vec<Payment>) -> Vec<i64> {
    let mut invoices_by_peer: HashMap<String, Vec<Invoice>> = HashMap::new();
    for invoice in invoices {
        invoices_by_peer
            .entry(rut_key(&invoice.debtor_id))
            .or_default()
            .push(invoice);
    }
    let mut payments_by_peer: HashMap<String, Vec<Payment>> = HashMap::new();
    for payment in payments {
        payments_by_peer
            .entry(rut_key(&payment.debtor_id))
            .or_default()
            .push(payment);
    }

    let mut terms: Vec<i64> = invoices_by_peer
        .par_iter()
        .flat_map_iter(|(peer, peer_invoices)| {
            let peer_payments = payments_by_peer.get(peer).map(Vec::as_slice).unwrap_or(&[]);
            match_records(peer_payments, peer_invoices).terms()
        })
        .collect();
    terms.sort_unstable();
    terms
}

/// `pool_peer_terms` on the blocking pool, keeping the rayon pass off the
/// async worker threads.
pub async fn pool_peer_terms_blocking(invoices: Vec<Invoice>, payments: Vec<Payment>) -> AppResult<Vec<i64>> {
    Ok(tokio::task::spawn_blocking(move || pool_peer_terms(invoices, payments)).await?)
}

/// Estimate from pooled peer terms: `max(30, round(mean + 0.5 * std_dev))`
/// over the outlier-free pool.
pub fn estimate_from_terms(
    company: Company,
    peer_companies: usize,
    terms: &[i64],
) -> PeerEstimate {
    let Some((sector, bracket)) = company.segment().map(|(s, b)| (s.to_string(), b.to_string())) else {
        return PeerEstimate::Unavailable {
            company: Some(company),
            reason: InsufficiencyReason::IncompleteCompany,
            message: "Company record has no sector or revenue bracket".to_string(),
        };
    };

    if terms.is_empty() {
        return PeerEstimate::Unavailable {
            company: Some(company),
            reason: InsufficiencyReason::NoPeerData,
            message: "No payment data for similar companies".to_string(),
        };
    }

    let clean = filter_outliers(terms);
    let Some(stats) = summarize(&clean) else {
        return PeerEstimate::Unavailable {
            company: Some(company),
            reason: InsufficiencyReason::NoReliablePeerData,
            message: "No reliable (outlier-free) data for similar companies".to_string(),
        };
    };

    let recommended_term = padded_term(stats.mean, stats.std_dev, MIN_TERM_DAYS);
    PeerEstimate::Estimated {
        summary: PeerSummary {
            bracket_description: bracket_description(&bracket),
            sector,
            bracket,
            peer_companies,
            mean: stats.mean,
            std_dev: stats.std_dev,
            sample_size: stats.count,
        },
        company,
        recommended_term,
    }
}

/// Peer-similarity estimate for a debtor with no payment history.
pub async fn estimate(store: &dyn RecordStore, rut: &str) -> AppResult<PeerEstimate> {
    let Some(company) = store.company(rut).await? else {
        return Ok(PeerEstimate::Unavailable {
            company: None,
            reason: InsufficiencyReason::NotFound,
            message: "RUT has no payment history and is not in the company registry".to_string(),
        });
    };

    let Some((sector, bracket)) = company.segment() else {
        return Ok(estimate_from_terms(company, 0, &[]));
    };

    let peers = store.companies_in_segment(sector, bracket).await?;
    let peer_ruts: Vec<String> = peers.iter().map(|p| p.rut.clone()).collect();
    tracing::info!(
        "Peer group for {}: sector {}, bracket {}, {} companies",
        rut,
        sector,
        bracket,
        peer_ruts.len()
    );
    if peer_ruts.is_empty() {
        return Ok(estimate_from_terms(company, 0, &[]));
    }

    let (invoices, payments) = futures::try_join!(
        store.invoices_for_many(&peer_ruts),
        store.payments_for_many(&peer_ruts, true),
    )?;
    tracing::info!(
        "Peer group for {}: {} invoices, {} paid payments",
        rut,
        invoices.len(),
        payments.len()
    );

    let terms = pool_peer_terms_blocking(invoices, payments).await?;
    Ok(estimate_from_terms(company, peers.len(), &terms))
}
