//! Budget roll-up parsing and the budget-ceiling rule.

use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ceiling used when the budget string carries no usable number.
pub const DEFAULT_BUDGET_CEILING: f64 = 6000.0;
pub const DEFAULT_CURRENCY: &str = "Rupees";

/// A number with an optional thousands suffix: "6,000", "5k", "2.5 K".
const AMOUNT: &str = r"(\d[\d,]*(?:\.\d+)?)(?:\s*([kK])\b)?";

fn leading_amount() -> &'static Regex {
    static LEADING: OnceLock<Regex> = OnceLock::new();
    LEADING.get_or_init(|| {
        Regex::new(&format!(r"^\D*?{AMOUNT}")).expect("leading amount pattern is valid")
    })
}

fn any_amount() -> &'static Regex {
    static ANY: OnceLock<Regex> = OnceLock::new();
    ANY.get_or_init(|| Regex::new(AMOUNT).expect("amount pattern is valid"))
}

fn to_number(caps: &Captures) -> Option<f64> {
    let value = caps.get(1)?.as_str().replace(',', "").parse::<f64>().ok()?;
    Some(match caps.get(2) {
        Some(_) => value * 1000.0,
        None => value,
    })
}

/// Reads the leading amount of a budget like "6000 Rupees", "₹6,000" or "5k".
pub fn parse_budget_ceiling(budget: &str) -> f64 {
    leading_amount()
        .captures(budget.trim())
        .and_then(|c| to_number(&c))
        .filter(|amount| *amount > 0.0)
        .unwrap_or(DEFAULT_BUDGET_CEILING)
}

/// The words around the amount: "6000 Rupees" → "Rupees", "₹6000" → "₹".
pub fn budget_currency(budget: &str) -> String {
    let budget = budget.trim();
    let Some(found) = any_amount().find(budget) else {
        return DEFAULT_CURRENCY.to_string();
    };
    let suffix = budget[found.end()..].trim();
    let prefix = budget[..found.start()].trim();
    if !suffix.is_empty() {
        suffix.to_string()
    } else if !prefix.is_empty() {
        prefix.to_string()
    } else {
        DEFAULT_CURRENCY.to_string()
    }
}

/// Reads a model-supplied cost: a number, or the first number inside a string like "₹200-₹300".
pub fn parse_amount(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => any_amount().captures(s).and_then(|c| to_number(&c)),
        _ => None,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BudgetBreakdown {
    pub transport: f64,
    pub hotel: f64,
    pub food: f64,
    pub activities: f64,
}

impl BudgetBreakdown {
    pub fn sum(&self) -> f64 {
        self.transport + self.hotel + self.food + self.activities
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetSummary {
    pub currency: String,
    pub total: f64,
    pub breakdown: BudgetBreakdown,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl BudgetSummary {
    /// Reads the budget stage output leniently. A missing total is the breakdown sum.
    pub fn from_model(value: &Value, default_currency: &str) -> Self {
        let breakdown = value.get("breakdown").unwrap_or(&Value::Null);
        let line = |keys: &[&str]| {
            keys.iter()
                .filter_map(|k| breakdown.get(*k))
                .find_map(parse_amount)
                .unwrap_or(0.0)
        };
        let breakdown = BudgetBreakdown {
            transport: line(&["transport", "transportation"]),
            hotel: line(&["hotel", "accommodation"]),
            food: line(&["food"]),
            activities: line(&["activities", "activitiesEntryFees"]),
        };
        let total = value
            .get("total")
            .and_then(parse_amount)
            .unwrap_or_else(|| breakdown.sum());

        Self {
            currency: value
                .get("currency")
                .and_then(Value::as_str)
                .filter(|c| !c.trim().is_empty())
                .unwrap_or(default_currency)
                .to_string(),
            total,
            breakdown,
            notes: value
                .get("notes")
                .and_then(Value::as_str)
                .map(str::to_string),
            warning: None,
        }
    }

    /// Caps the total at `ceiling`, shrinking the activities line to absorb the cut.
    /// Returns whether the cap was applied.
    pub fn enforce_ceiling(&mut self, ceiling: f64) -> bool {
        if self.total <= ceiling {
            return false;
        }
        let original = self.total;
        let fixed = self.breakdown.transport + self.breakdown.hotel + self.breakdown.food;
        self.total = ceiling;
        self.breakdown.activities = (ceiling - fixed).max(0.0);
        self.warning = Some(format!(
            "Estimated costs of {original:.0} {currency} exceeded your budget; the total was \
             capped at {ceiling:.0} {currency} and the activities allowance reduced to {activities:.0}.",
            currency = self.currency,
            activities = self.breakdown.activities,
        ));
        true
    }
}
