pub mod classifier;
pub mod delinquency;
pub mod export;
pub mod matcher;
pub mod normalizer;
pub mod peers;
pub mod recommender;
pub mod seasonal;
pub mod stats;

pub use classifier::EntityClassifier;
pub use recommender::Recommender;
