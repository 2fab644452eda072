pub mod company;
pub mod matching;
pub mod recommendation;
pub mod record;

pub use company::{bracket_description, Company};
pub use matching::{MatchKey, MatchOutput, PaymentRecord};
pub use recommendation::{
    DelinquentInvoice, EntityCategory, InsufficiencyReason, InsufficientData, PeerSummary,
    Recommendation, RecommendationOutcome, TermStats,
};
pub use record::{Invoice, InvoiceStatus, Payment, PaymentStatus};
