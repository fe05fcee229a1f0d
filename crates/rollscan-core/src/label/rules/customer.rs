//! Customer name extraction.
//!
//! A label's customer line usually carries trailing noise: ship dates,
//! purchase order references, numeric codes. Tokens are read left to right
//! and the name ends at the first token that looks like one of those.

use tracing::trace;

use super::patterns::{DATE_FRAGMENT, HAS_LETTER, NAME_NOISE, NUMERIC_CODE, ORDER_NUMBER_SUFFIX};
use crate::ocr::TextLine;

/// Reason a name stopped before a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameStop {
    /// The raw token contains a date such as `3/14`.
    Date,
    /// The cleaned token starts with `PO`.
    PurchaseOrder,
    /// The cleaned token is a bare number of three or more digits.
    NumericCode,
}

/// Outcome of one token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenVerdict {
    /// Append the cleaned token and continue.
    Keep(String),
    /// Append the cleaned token and end the name (`#12` order numbers).
    Last(String),
    /// End the name without this token.
    Stop(NameStop),
    /// Nothing left after cleaning.
    Skip,
}

/// Reduce a token to letters, digits and `#`.
pub fn clean_token(token: &str) -> String {
    NAME_NOISE.replace_all(token, "").into_owned()
}

/// Apply the name rules to one raw token, in order.
pub fn classify_token(raw: &str) -> TokenVerdict {
    if DATE_FRAGMENT.is_match(raw) {
        return TokenVerdict::Stop(NameStop::Date);
    }

    let cleaned = clean_token(raw);
    if cleaned.to_ascii_uppercase().starts_with("PO") {
        return TokenVerdict::Stop(NameStop::PurchaseOrder);
    }
    if NUMERIC_CODE.is_match(&cleaned) {
        return TokenVerdict::Stop(NameStop::NumericCode);
    }
    if cleaned.is_empty() {
        return TokenVerdict::Skip;
    }
    if ORDER_NUMBER_SUFFIX.is_match(&cleaned) {
        return TokenVerdict::Last(cleaned);
    }
    TokenVerdict::Keep(cleaned)
}

/// Clean a raw OCR line into a customer name. May return an empty string.
pub fn clean_customer_text(text: &str) -> String {
    let text = text.replace('_', " ");
    let mut kept: Vec<String> = Vec::new();

    for token in text.split_whitespace() {
        match classify_token(token) {
            TokenVerdict::Keep(cleaned) => kept.push(cleaned),
            TokenVerdict::Last(cleaned) => {
                kept.push(cleaned);
                break;
            }
            TokenVerdict::Stop(reason) => {
                trace!("Name stopped at {:?}: {:?}", token, reason);
                break;
            }
            TokenVerdict::Skip => {}
        }
    }

    kept.join(" ").trim().trim_end_matches('.').to_string()
}

/// First usable customer name below the roll line.
///
/// Lines are taken in top-to-bottom order starting strictly below the roll
/// line's top edge. Lines without any letter are ignored, as are lines that
/// clean down to nothing.
pub fn find_customer_below(lines: &[TextLine], roll_line: &TextLine) -> Option<String> {
    let mut below: Vec<&TextLine> = lines
        .iter()
        .filter(|line| line.top() > roll_line.top())
        .collect();
    below.sort_by_key(|line| line.top());

    below
        .into_iter()
        .filter(|line| HAS_LETTER.is_match(&line.text))
        .map(|line| clean_customer_text(&line.text))
        .find(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::BoundingBox;

    fn line(text: &str, top: u32) -> TextLine {
        TextLine {
            text: text.to_string(),
            bbox: BoundingBox::new(10, top, 300, 30),
            confidence: 90.0,
        }
    }

    #[test]
    fn test_purchase_order_stops_name() {
        assert_eq!(clean_customer_text("JOHN SMITH PO#12345"), "JOHN SMITH");
        assert_eq!(clean_customer_text("ACME po 7781"), "ACME");
    }

    #[test]
    fn test_date_stops_name() {
        assert_eq!(clean_customer_text("ACME CORP 3/14/2024 SHIP"), "ACME CORP");
        assert_eq!(clean_customer_text("BOB'S-12-01 FABRIC"), "");
    }

    #[test]
    fn test_numeric_code_stops_name() {
        assert_eq!(clean_customer_text("KLEIN TEXTILES 004512 NJ"), "KLEIN TEXTILES");
        assert_eq!(clean_customer_text("STORE 12 EAST"), "STORE 12 EAST");
    }

    #[test]
    fn test_order_number_ends_name() {
        assert_eq!(clean_customer_text("MAIN ST FABRICS #12 SUITE B"), "MAIN ST FABRICS #12");
        assert_eq!(clean_customer_text("DEPOT#4 EXTRA"), "DEPOT#4");
    }

    #[test]
    fn test_underscores_and_punctuation() {
        assert_eq!(clean_customer_text("JANE_DOE, INC."), "JANE DOE INC");
        assert_eq!(clean_customer_text("O'NEIL & SONS"), "ONEIL SONS");
        assert_eq!(clean_customer_text("  "), "");
    }

    #[test]
    fn test_classify_token_rules() {
        assert_eq!(classify_token("10/2"), TokenVerdict::Stop(NameStop::Date));
        assert_eq!(classify_token("P.O."), TokenVerdict::Stop(NameStop::PurchaseOrder));
        assert_eq!(classify_token("Portland"), TokenVerdict::Stop(NameStop::PurchaseOrder));
        assert_eq!(classify_token("(555)"), TokenVerdict::Stop(NameStop::NumericCode));
        assert_eq!(classify_token("Suite#9"), TokenVerdict::Last("Suite#9".to_string()));
        assert_eq!(classify_token("--"), TokenVerdict::Skip);
        assert_eq!(classify_token("Co."), TokenVerdict::Keep("Co".to_string()));
    }

    #[test]
    fn test_cleaning_is_idempotent() {
        for raw in ["JOHN SMITH", "ACME CORP 3/14", "JANE_DOE, INC.", "KLEIN TEXTILES 004512"] {
            let once = clean_customer_text(raw);
            assert_eq!(clean_customer_text(&once), once, "{}", raw);
        }
    }

    #[test]
    fn test_find_customer_below_skips_numeric_and_empty_lines() {
        let lines = vec![
            line("SHIP TO", 50),
            line("F609890101", 100),
            line("2024 0017", 150),
            line("PO 5521", 200),
            line("JOHN SMITH PO#12345", 250),
            line("ANOTHER NAME", 300),
        ];

        let customer = find_customer_below(&lines, &lines[1]);
        assert_eq!(customer, Some("JOHN SMITH".to_string()));
    }

    #[test]
    fn test_find_customer_below_ignores_lines_above() {
        let lines = vec![line("ABOVE NAME", 50), line("12345678", 100)];
        assert_eq!(find_customer_below(&lines, &lines[1]), None);
    }
}
