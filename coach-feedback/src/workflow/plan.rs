//! Subscription plan tiers
//!
//! The plan only selects how many suggestions the learner sees per turn.

use super::capper::CapPolicy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Basic,
    #[default]
    Premium,
}

impl Plan {
    /// Suggestion caps for this tier
    pub fn cap_policy(&self) -> CapPolicy {
        match self {
            Plan::Basic => CapPolicy::new(2, 3),
            Plan::Premium => CapPolicy::new(3, 5),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Basic => "basic",
            Plan::Premium => "premium",
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown plan: {0} (expected basic or premium)")]
pub struct UnknownPlan(pub String);

impl FromStr for Plan {
    type Err = UnknownPlan;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "basic" => Ok(Plan::Basic),
            "premium" => Ok(Plan::Premium),
            _ => Err(UnknownPlan(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_caps() {
        assert_eq!(Plan::Basic.cap_policy(), CapPolicy::new(2, 3));
        assert_eq!(Plan::Premium.cap_policy(), CapPolicy::new(3, 5));
    }

    #[test]
    fn test_plan_parse() {
        assert_eq!("Basic".parse::<Plan>().unwrap(), Plan::Basic);
        assert_eq!(" premium ".parse::<Plan>().unwrap(), Plan::Premium);
        assert!("enterprise".parse::<Plan>().is_err());
    }

    #[test]
    fn test_plan_serde() {
        let plan: Plan = serde_json::from_str("\"basic\"").unwrap();
        assert_eq!(plan, Plan::Basic);
        assert_eq!(Plan::default(), Plan::Premium);
    }
}
