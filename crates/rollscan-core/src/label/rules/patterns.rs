//! Regex patterns for shipping label fields.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Roll number: up to two letters followed by 6-10 digits, as a whole word
    pub static ref ROLL_PATTERN: Regex = Regex::new(
        r"\b([A-Za-z]{0,2}[0-9]{6,10})\b"
    ).unwrap();

    // Same shape anywhere in the text; used on constrained re-reads where
    // the engine may glue the roll to neighbouring characters
    pub static ref ROLL_CANDIDATE: Regex = Regex::new(
        r"([A-Za-z]{0,2}[0-9]{6,10})"
    ).unwrap();

    pub static ref ROLL_DIGITS: Regex = Regex::new(
        r"[0-9]{6,10}"
    ).unwrap();

    // Dates like 3/14 or 12-01 end a customer name
    pub static ref DATE_FRAGMENT: Regex = Regex::new(
        r"[0-9]{1,2}[/-][0-9]{1,2}"
    ).unwrap();

    pub static ref NAME_NOISE: Regex = Regex::new(
        r"[^A-Za-z0-9#]+"
    ).unwrap();

    pub static ref NUMERIC_CODE: Regex = Regex::new(
        r"^[0-9]{3,}$"
    ).unwrap();

    // Order or suite number such as "#12" closes the name
    pub static ref ORDER_NUMBER_SUFFIX: Regex = Regex::new(
        r"#[0-9]+$"
    ).unwrap();

    pub static ref HAS_LETTER: Regex = Regex::new(
        r"[A-Za-z]"
    ).unwrap();
}
