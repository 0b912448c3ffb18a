//! Range expansion: turns a numeric start/end pair into padded ring drafts.
//!
//! The width of every code is the longer of the two inputs, so `"007"` to
//! `"010"` yields `007, 008, 009, 010` and `"7"` to `"10"` yields `07 .. 10`.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use thiserror::Error;

use crate::domain::{BatchId, RingAttributes, RingCode, RingId, RingItem};

static NUMBER_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new("^[0-9]+$").ok());

/// Errors from range expansion. Both are correctable by the breeder.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RangeError {
    #[error("invalid ring range '{start}'..'{end}': {reason}")]
    InvalidRange {
        start: String,
        end: String,
        reason: String,
    },

    #[error("range of {requested} rings exceeds the limit of {ceiling}")]
    RangeTooLarge { requested: u64, ceiling: u64 },
}

impl RangeError {
    fn invalid(start: &str, end: &str, reason: impl Into<String>) -> Self {
        Self::InvalidRange {
            start: start.to_string(),
            end: end.to_string(),
            reason: reason.into(),
        }
    }

    /// Message to show the breeder next to the range fields.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidRange { reason, .. } => format!("Check the ring numbers: {reason}."),
            Self::RangeTooLarge { requested, ceiling } => format!(
                "A batch can hold at most {ceiling} rings but this range has {requested}. \
                 Split it into smaller batches."
            ),
        }
    }
}

/// A ring that is ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingDraft {
    pub code: RingCode,
    pub batch_id: Option<BatchId>,
    pub attributes: RingAttributes,
}

impl RingDraft {
    /// A draft for a ring added by hand, outside any batch.
    #[must_use]
    pub const fn new(code: RingCode, attributes: RingAttributes) -> Self {
        Self {
            code,
            batch_id: None,
            attributes,
        }
    }

    /// The stored ring, in `estoque`.
    #[must_use]
    pub fn into_item(self, id: RingId, created_at: DateTime<Utc>) -> RingItem {
        RingItem::new(id, self.code, self.batch_id, self.attributes, created_at)
    }
}

fn is_number(s: &str) -> bool {
    NUMBER_PATTERN.as_ref().map_or_else(
        || !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()),
        |re| re.is_match(s),
    )
}

/// Expand `start..=end` into ring drafts sharing `template`.
///
/// Nothing is produced unless the whole range is valid and fits under
/// `ceiling`.
///
/// # Errors
///
/// Returns `RangeError::InvalidRange` if a bound is not a decimal number
/// (surrounding whitespace included),
/// overflows `u64`, is wider than a ring code, or `end < start`.
/// Returns `RangeError::RangeTooLarge` if the range holds more than
/// `ceiling` rings.
pub fn expand_range(
    start: &str,
    end: &str,
    template: &RingAttributes,
    batch_id: Option<&BatchId>,
    ceiling: u64,
) -> Result<Vec<RingDraft>, RangeError> {
    if !is_number(start) || !is_number(end) {
        return Err(RangeError::invalid(
            start,
            end,
            "start and end must contain digits only",
        ));
    }

    let width = start.len().max(end.len());
    if width > RingCode::MAX_LENGTH {
        return Err(RangeError::invalid(
            start,
            end,
            format!("ring numbers cannot be longer than {} digits", RingCode::MAX_LENGTH),
        ));
    }

    let parse = |digits: &str| {
        digits
            .parse::<u64>()
            .map_err(|_| RangeError::invalid(start, end, "number is too large"))
    };
    let (first, last) = (parse(start)?, parse(end)?);

    if last < first {
        return Err(RangeError::invalid(
            start,
            end,
            "the end number must not be smaller than the start number",
        ));
    }

    let requested = (last - first).checked_add(1).unwrap_or(u64::MAX);
    if requested > ceiling {
        return Err(RangeError::RangeTooLarge { requested, ceiling });
    }

    (first..=last)
        .map(|n| {
            RingCode::parse(format!("{n:0width$}"))
                .map(|code| RingDraft {
                    code,
                    batch_id: batch_id.cloned(),
                    attributes: template.clone(),
                })
                .map_err(|e| RangeError::invalid(start, end, e.to_string()))
        })
        .collect()
}
