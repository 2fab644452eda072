use crate::models::EntityCategory;
use crate::service::normalizer::{fold_text, rut_key};
use std::collections::HashSet;

/// Ministerio de Obras Públicas
pub const MOP_RUT: &str = "61.202.000-0";

const MUNICIPALITY_TOKENS: &[&str] = &["MUNICIPALIDAD", "MUNICIPALIDADES"];
const CORPORATION_TOKENS: &[&str] = &["CORPORACION", "CORP"];
const MUNICIPAL_TOKENS: &[&str] = &["MUNICIPAL", "MUNICIPALES"];

/// Resolves the institutional category of a debtor.
///
/// Order: government allowlist by RUT, then a municipality marker in any
/// known name, then corporation + municipal markers in the same name.
#[derive(Debug, Clone)]
pub struct EntityClassifier {
    government_ruts: HashSet<String>,
}

impl Default for EntityClassifier {
    fn default() -> Self {
        Self::new([MOP_RUT])
    }
}

impl EntityClassifier {
    pub fn new<I, S>(government_ruts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            government_ruts: government_ruts
                .into_iter()
                .map(|r| rut_key(r.as_ref()))
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    /// `names` holds every display name known for the debtor: the names on
    /// its invoices, plus the reference table label when those names alone
    /// leave it unclassified.
    pub fn classify(&self, rut: &str, names: &[&str]) -> EntityCategory {
        if self.government_ruts.contains(&rut_key(rut)) {
            return EntityCategory::GovernmentEntity;
        }

        let folded: Vec<Vec<String>> = names
            .iter()
            .map(|n| fold_text(n).split(' ').map(str::to_string).collect())
            .collect();

        if folded.iter().any(|tokens| has_any(tokens, MUNICIPALITY_TOKENS)) {
            return EntityCategory::Municipality;
        }
        if folded
            .iter()
            .any(|tokens| has_any(tokens, CORPORATION_TOKENS) && has_any(tokens, MUNICIPAL_TOKENS))
        {
            return EntityCategory::MunicipalCorp;
        }

        EntityCategory::Unclassified
    }
}

fn has_any(tokens: &[String], markers: &[&str]) -> bool {
    tokens.iter().any(|t| markers.contains(&t.as_str()))
}
