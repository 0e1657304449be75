//! Points-to-credits conversion policy.

use serde::Serialize;

use crate::account::Currency;
use crate::error::{LedgerError, Result};
use crate::transaction::{metadata_keys, Posting, TransactionType};

/// Points consumed per credit granted.
pub const DEFAULT_CONVERSION_RATE: i64 = 50;

/// Smallest block of points that may be converted at once.
pub const DEFAULT_MINIMUM_CONVERSION_POINTS: i64 = 5000;

/// Fixed-rate conversion settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionPolicy {
    rate: i64,
    minimum_points: i64,
}

impl Default for ConversionPolicy {
    fn default() -> Self {
        Self {
            rate: DEFAULT_CONVERSION_RATE,
            minimum_points: DEFAULT_MINIMUM_CONVERSION_POINTS,
        }
    }
}

/// The outcome of converting a block of points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionQuote {
    /// Points removed from the balance.
    pub points: i64,
    /// Credits added.
    pub credits: i64,
    /// Points spent without producing a credit.
    pub remainder: i64,
}

impl ConversionPolicy {
    /// Create a policy.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the rate is not positive or the minimum block
    /// is smaller than one credit's worth of points.
    pub fn new(rate: i64, minimum_points: i64) -> Result<Self> {
        if rate <= 0 {
            return Err(LedgerError::Configuration(format!(
                "conversion rate must be positive, got {rate}"
            )));
        }
        if minimum_points < rate {
            return Err(LedgerError::Configuration(format!(
                "minimum conversion ({minimum_points}) is below one credit ({rate} points)"
            )));
        }
        Ok(Self {
            rate,
            minimum_points,
        })
    }

    /// Points per credit.
    #[must_use]
    pub const fn rate(&self) -> i64 {
        self.rate
    }

    /// Minimum points per conversion.
    #[must_use]
    pub const fn minimum_points(&self) -> i64 {
        self.minimum_points
    }

    /// Price a conversion. Remainders below one credit are consumed, not refunded.
    ///
    /// # Errors
    ///
    /// Returns `BelowMinimumThreshold` if `points` is under the minimum block.
    pub fn quote(&self, points: i64) -> Result<ConversionQuote> {
        if points < self.minimum_points {
            return Err(LedgerError::BelowMinimumThreshold {
                minimum: self.minimum_points,
                requested: points,
            });
        }
        Ok(ConversionQuote {
            points,
            credits: points / self.rate,
            remainder: points % self.rate,
        })
    }
}

impl ConversionQuote {
    /// The two legs of the conversion: points out, credits in.
    #[must_use]
    pub fn postings(&self) -> [Posting; 2] {
        let mut fields = serde_json::Map::new();
        fields.insert(metadata_keys::CONVERSION.into(), true.into());
        fields.insert(metadata_keys::CREDITS_RECEIVED.into(), self.credits.into());
        fields.insert(metadata_keys::POINTS_CONVERTED.into(), self.points.into());
        let metadata = serde_json::Value::Object(fields);

        [
            // A quote always covers at least one positive block.
            Posting {
                currency: Currency::Points,
                amount: -self.points,
                transaction_type: TransactionType::Deduction,
                reason: format!("Converted {} points to {} credits", self.points, self.credits),
                metadata: metadata.clone(),
            },
            Posting {
                currency: Currency::Credits,
                amount: self.credits,
                transaction_type: TransactionType::Credit,
                reason: format!("Received {} credits from points conversion", self.credits),
                metadata,
            },
        ]
    }
}
