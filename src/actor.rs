use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identification number of a market participant.
///
/// Actor numbers are opaque to the delivery core: they are compared, routed
/// on, and echoed back, never parsed.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorNumber(String);

impl ActorNumber {
    pub fn new(number: impl Into<String>) -> Self {
        ActorNumber(number.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role an actor plays in the market.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketRole {
    EnergySupplier,
    GridOperator,
    BalanceResponsible,
    MeteredDataResponsible,
    MarketOperator,
}

impl fmt::Display for MarketRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MarketRole::EnergySupplier => "EnergySupplier",
            MarketRole::GridOperator => "GridOperator",
            MarketRole::BalanceResponsible => "BalanceResponsible",
            MarketRole::MeteredDataResponsible => "MeteredDataResponsible",
            MarketRole::MarketOperator => "MarketOperator",
        };
        write!(f, "{}", name)
    }
}

/// Correlation identifier threaded explicitly through every operation that
/// needs one; there is no ambient request context.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationId(String);

impl CorrelationId {
    pub fn new(id: impl Into<String>) -> Self {
        CorrelationId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
