//! Investment domain entity
//!
//! A holding of some security. Prices are minor units per unit held;
//! quantities may be fractional.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserId;

/// Unique identifier for an investment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InvestmentId(pub Uuid);

impl InvestmentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for InvestmentId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for InvestmentId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for InvestmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Asset class of a holding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestmentKind {
    Stock,
    Bond,
    Etf,
    MutualFund,
    Crypto,
    Other,
}

impl std::fmt::Display for InvestmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvestmentKind::Stock => write!(f, "stock"),
            InvestmentKind::Bond => write!(f, "bond"),
            InvestmentKind::Etf => write!(f, "etf"),
            InvestmentKind::MutualFund => write!(f, "mutual_fund"),
            InvestmentKind::Crypto => write!(f, "crypto"),
            InvestmentKind::Other => write!(f, "other"),
        }
    }
}

impl std::str::FromStr for InvestmentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "stock" => Ok(InvestmentKind::Stock),
            "bond" => Ok(InvestmentKind::Bond),
            "etf" => Ok(InvestmentKind::Etf),
            "mutual_fund" => Ok(InvestmentKind::MutualFund),
            "crypto" => Ok(InvestmentKind::Crypto),
            "other" => Ok(InvestmentKind::Other),
            _ => Err(format!("Unknown investment kind: {}", s)),
        }
    }
}

/// A position held by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Investment {
    pub id: InvestmentId,
    pub user_id: UserId,
    pub symbol: String,
    pub name: String,
    pub kind: InvestmentKind,
    pub quantity: f64,
    /// Total amount paid for the position
    pub cost_basis: i64,
    /// Latest known price of one unit
    pub current_price: i64,
    pub currency: String,
    pub purchased_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Investment {
    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        self.user_id == *user_id
    }

    pub fn market_value(&self) -> i64 {
        (self.quantity * self.current_price as f64).round() as i64
    }

    pub fn gain(&self) -> i64 {
        self.market_value().saturating_sub(self.cost_basis)
    }

    /// Percentage return on cost basis, 0 when nothing was paid
    pub fn gain_pct(&self) -> f64 {
        percent_of(self.gain(), self.cost_basis)
    }
}

pub(crate) fn percent_of(part: i64, whole: i64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    let pct = part as f64 / whole as f64 * 100.0;
    (pct * 100.0).round() / 100.0
}

/// Data needed to record a new investment
#[derive(Debug, Clone)]
pub struct NewInvestment {
    pub user_id: UserId,
    pub symbol: String,
    pub name: String,
    pub kind: InvestmentKind,
    pub quantity: f64,
    pub cost_basis: i64,
    pub current_price: i64,
    pub currency: String,
    pub purchased_at: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Fields that may change on an existing investment
#[derive(Debug, Clone, Default)]
pub struct InvestmentUpdate {
    pub name: Option<String>,
    pub kind: Option<InvestmentKind>,
    pub quantity: Option<f64>,
    pub cost_basis: Option<i64>,
    pub current_price: Option<i64>,
    pub purchased_at: Option<DateTime<Utc>>,
    pub notes: Option<Option<String>>,
}

impl InvestmentUpdate {
    pub fn apply_to(&self, current: &Investment) -> Investment {
        Investment {
            name: self.name.clone().unwrap_or_else(|| current.name.clone()),
            kind: self.kind.unwrap_or(current.kind),
            quantity: self.quantity.unwrap_or(current.quantity),
            cost_basis: self.cost_basis.unwrap_or(current.cost_basis),
            current_price: self.current_price.unwrap_or(current.current_price),
            purchased_at: self.purchased_at.unwrap_or(current.purchased_at),
            notes: match &self.notes {
                Some(n) => n.clone(),
                None => current.notes.clone(),
            },
            updated_at: Utc::now(),
            ..current.clone()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.kind.is_none()
            && self.quantity.is_none()
            && self.cost_basis.is_none()
            && self.current_price.is_none()
            && self.purchased_at.is_none()
            && self.notes.is_none()
    }
}
