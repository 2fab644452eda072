use serde::{Deserialize, Serialize};

/// Company reference record (peer-similarity fallback only)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub rut: String,
    pub name: Option<String>,
    pub sector: Option<String>,
    pub revenue_bracket: Option<String>,
}

impl Company {
    /// Sector and bracket, when both are present and non-blank.
    pub fn segment(&self) -> Option<(&str, &str)> {
        let sector = self.sector.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        let bracket = self
            .revenue_bracket
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())?;
        Some((sector, bracket))
    }
}

/// Annual sales brackets (UF) published with the company registry
const REVENUE_BRACKETS: [(&str, &str); 13] = [
    ("1", "No information: sales amount cannot be estimated"),
    ("2", "Micro company, tier 1: 0.01 to 200.00 UF per year"),
    ("3", "Micro company, tier 2: 200.01 to 600.00 UF per year"),
    ("4", "Micro company, tier 3: 600.01 to 2,400.00 UF per year"),
    ("5", "Small company, tier 1: 2,400.01 to 5,000.00 UF per year"),
    ("6", "Small company, tier 2: 5,000.01 to 10,000.00 UF per year"),
    ("7", "Small company, tier 3: 10,000.01 to 25,000.00 UF per year"),
    ("8", "Medium company, tier 1: 25,000.01 to 50,000.00 UF per year"),
    ("9", "Medium company, tier 2: 50,000.01 to 100,000.00 UF per year"),
    ("10", "Large company, tier 1: 100,000.01 to 200,000.00 UF per year"),
    ("11", "Large company, tier 2: 200,000.01 to 600,000.00 UF per year"),
    ("12", "Large company, tier 3: 600,000.01 to 1,000,000.00 UF per year"),
    ("13", "Large company, tier 4: more than 1,000,000.01 UF per year"),
];

/// Human-readable description of a revenue bracket code
pub fn bracket_description(code: &str) -> String {
    let code = code.trim();
    REVENUE_BRACKETS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, desc)| (*desc).to_string())
        .unwrap_or_else(|| format!("unknown bracket ({code})"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bracket_lookup_falls_back_to_unknown() {
        assert!(bracket_description(" 3 ").starts_with("Micro company, tier 2"));
        assert_eq!(bracket_description("99"), "unknown bracket (99)");
    }

    #[test]
    fn segment_requires_both_codes() {
        let mut company = Company {
            rut: "76107905-0".to_string(),
            name: None,
            sector: Some("RETAIL".to_string()),
            revenue_bracket: Some("  ".to_string()),
        };
        assert_eq!(company.segment(), None);
        company.revenue_bracket = Some("3".to_string());
        assert_eq!(company.segment(), Some(("RETAIL", "3")));
    }
}
