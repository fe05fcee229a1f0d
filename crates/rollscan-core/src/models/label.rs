//! Per-page extraction results.

use serde::{Deserialize, Serialize};

use crate::error::PdfError;

/// Which strategy produced a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldSource {
    /// Read from a grouped text line.
    Line,
    /// Read from the cropped re-scan of the roll line.
    Refined,
    /// Read from a whitelisted whole-page scan.
    PageScan,
    /// Read from the unrestricted whole-page text fallback.
    TextFallback,
}

/// Roll and customer extracted from one label page.
///
/// `None` means the field could not be read; it is distinct from an empty
/// string, which is never produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResult {
    /// 1-based page number in the source document (0 until assigned).
    pub page: u32,
    /// Roll number.
    pub roll: Option<String>,
    /// Customer name.
    pub customer: Option<String>,
    /// Strategy that produced `roll`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roll_source: Option<FieldSource>,
    /// Strategy that produced `customer`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_source: Option<FieldSource>,
}

impl PageResult {
    /// The `(roll, customer)` pair.
    pub fn pair(&self) -> (Option<&str>, Option<&str>) {
        (self.roll.as_deref(), self.customer.as_deref())
    }

    /// Whether both fields were found.
    pub fn is_complete(&self) -> bool {
        self.roll.is_some() && self.customer.is_some()
    }

    pub(crate) fn set_roll(&mut self, roll: String, source: FieldSource) {
        self.roll = Some(roll);
        self.roll_source = Some(source);
    }

    pub(crate) fn set_customer(&mut self, customer: String, source: FieldSource) {
        self.customer = Some(customer);
        self.customer_source = Some(source);
    }
}

/// Inclusive, 1-based range of pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub first: u32,
    pub last: u32,
}

impl PageRange {
    /// Create a range, rejecting page 0 and reversed bounds.
    pub fn new(first: u32, last: u32) -> Result<Self, PdfError> {
        if first == 0 || last < first {
            return Err(PdfError::InvalidRange { first, last });
        }
        Ok(Self { first, last })
    }

    /// A single page.
    pub fn single(page: u32) -> Result<Self, PdfError> {
        Self::new(page, page)
    }

    /// Number of pages covered.
    pub fn len(&self) -> usize {
        (self.last - self.first + 1) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Page numbers in order.
    pub fn pages(&self) -> impl Iterator<Item = u32> {
        self.first..=self.last
    }
}

impl std::str::FromStr for PageRange {
    type Err = PdfError;

    /// Parse `"N"` or `"FIRST-LAST"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |part: &str| {
            part.trim()
                .parse::<u32>()
                .map_err(|_| PdfError::Parse(format!("invalid page number: {:?}", part)))
        };
        match s.split_once('-') {
            Some((first, last)) => Self::new(parse(first)?, parse(last)?),
            None => Self::single(parse(s)?),
        }
    }
}
