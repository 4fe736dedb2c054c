use std::fmt;
use std::str::FromStr;

use crate::core::utils::format_naira;

/// Listing plan a provider pays for at registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlanTier {
    #[default]
    Basic,
    Verified,
    Premium,
}

impl PlanTier {
    pub const ALL: [PlanTier; 3] = [PlanTier::Basic, PlanTier::Verified, PlanTier::Premium];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Basic => "BASIC",
            PlanTier::Verified => "VERIFIED",
            PlanTier::Premium => "PREMIUM",
        }
    }

    /// Listing fee in kobo
    pub fn price_minor(&self) -> i64 {
        match self {
            PlanTier::Basic => 150_000,
            PlanTier::Verified => 300_000,
            PlanTier::Premium => 500_000,
        }
    }

    pub fn display_price(&self) -> String {
        format_naira(self.price_minor())
    }

    /// Only the top tier collects a hall of residence
    pub fn is_top_tier(&self) -> bool {
        matches!(self, PlanTier::Premium)
    }

    /// Search ordering weight, higher ranks first
    pub fn rank(&self) -> u8 {
        match self {
            PlanTier::Basic => 1,
            PlanTier::Verified => 2,
            PlanTier::Premium => 3,
        }
    }

    pub fn badge(&self) -> Option<&'static str> {
        match self {
            PlanTier::Basic => None,
            PlanTier::Verified => Some("✅"),
            PlanTier::Premium => Some("⭐"),
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PlanTier::Basic => "Basic",
            PlanTier::Verified => "Verified",
            PlanTier::Premium => "Premium",
        }
    }
}

impl fmt::Display for PlanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BASIC" => Ok(PlanTier::Basic),
            "VERIFIED" => Ok(PlanTier::Verified),
            "PREMIUM" => Ok(PlanTier::Premium),
            _ => Err(format!("Unknown plan: {}", s)),
        }
    }
}

// rusqlite FromSql: read plan from DB text column
impl rusqlite::types::FromSql for PlanTier {
    fn column_result(value: rusqlite::types::ValueRef<'_>) -> rusqlite::types::FromSqlResult<Self> {
        let s = value.as_str()?;
        PlanTier::from_str(s).map_err(|e| rusqlite::types::FromSqlError::Other(Box::new(std::io::Error::other(e))))
    }
}

// rusqlite ToSql: write plan as text to DB
impl rusqlite::types::ToSql for PlanTier {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        Ok(rusqlite::types::ToSqlOutput::Borrowed(rusqlite::types::ValueRef::Text(
            self.as_str().as_bytes(),
        )))
    }
}

/// Local status of a payment record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PaymentStatus {
    #[default]
    Pending,
    Success,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Success => "SUCCESS",
            PaymentStatus::Failed => "FAILED",
        }
    }

    /// SUCCESS is terminal: nothing moves a payment out of it
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Success)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(PaymentStatus::Pending),
            "SUCCESS" => Ok(PaymentStatus::Success),
            "FAILED" => Ok(PaymentStatus::Failed),
            _ => Err(format!("Unknown payment status: {}", s)),
        }
    }
}

impl rusqlite::types::FromSql for PaymentStatus {
    fn column_result(value: rusqlite::types::ValueRef<'_>) -> rusqlite::types::FromSqlResult<Self> {
        let s = value.as_str()?;
        PaymentStatus::from_str(s)
            .map_err(|e| rusqlite::types::FromSqlError::Other(Box::new(std::io::Error::other(e))))
    }
}

impl rusqlite::types::ToSql for PaymentStatus {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        Ok(rusqlite::types::ToSqlOutput::Borrowed(rusqlite::types::ValueRef::Text(
            self.as_str().as_bytes(),
        )))
    }
}
