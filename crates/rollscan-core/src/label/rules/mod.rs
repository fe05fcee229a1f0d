//! Rule-based field extractors for shipping labels.

pub mod customer;
pub mod patterns;
pub mod roll;

pub use customer::{clean_customer_text, classify_token, find_customer_below, NameStop, TokenVerdict};
pub use roll::{find_roll, find_roll_candidate, normalize_roll, RollExtractor};

/// Characters allowed on roll-oriented recognition passes.
pub const ROLL_WHITELIST: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Lines after the roll line searched for a customer in plain text.
pub const FALLBACK_WINDOW: usize = 5;

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;
}
