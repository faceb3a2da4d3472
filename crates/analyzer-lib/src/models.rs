//! Data models shared by the anomaly and SLO engines
//!
//! These types cross the library boundary: health-check producers hand in
//! `Metric` batches, and the API layer receives `Prediction` values and
//! `SloStatus` snapshots. The serialized field names are the wire contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// A single numeric health observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    /// Metric name, e.g. `request_total` or `cpu_usage_percent`
    pub name: String,
    /// Observed value
    pub value: f64,
    /// Unit of measurement, e.g. `ms` or `percent`
    pub unit: String,
    /// Dimension labels (omitted from the wire when empty)
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub labels: HashMap<String, String>,
    /// When the observation was taken
    pub timestamp: DateTime<Utc>,
}

impl Metric {
    /// Create an unlabeled metric observed now
    pub fn new(name: impl Into<String>, value: f64, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value,
            unit: unit.into(),
            labels: HashMap::new(),
            timestamp: Utc::now(),
        }
    }
}

/// Service state carried by a [`Prediction`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionStatus {
    Healthy,
    Degraded,
    Critical,
}

impl fmt::Display for PredictionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PredictionStatus::Healthy => "healthy",
            PredictionStatus::Degraded => "degraded",
            PredictionStatus::Critical => "critical",
        };
        write!(f, "{s}")
    }
}

/// An anomaly forecast produced by the detection engine
///
/// The timestamp is the forecast horizon (one hour ahead of detection),
/// not the detection time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Forecast horizon
    pub timestamp: DateTime<Utc>,
    /// Predicted service state
    pub status: PredictionStatus,
    /// Saturating severity score in `[0, 1]`
    pub probability: f64,
    /// Human-readable explanation
    pub reason: String,
}

/// Service level indicator an SLO is evaluated against
///
/// Unrecognized indicator names deserialize to [`SliKind::Generic`], which
/// averages whatever samples arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SliKind {
    Availability,
    Latency,
    ErrorRate,
    Generic,
}

impl SliKind {
    /// Map an indicator name to its kind; anything unrecognized is generic
    pub fn from_name(name: &str) -> Self {
        match name {
            "availability" => SliKind::Availability,
            "latency" => SliKind::Latency,
            "error_rate" => SliKind::ErrorRate,
            _ => SliKind::Generic,
        }
    }

    /// Wire name of this indicator
    pub fn as_str(&self) -> &'static str {
        match self {
            SliKind::Availability => "availability",
            SliKind::Latency => "latency",
            SliKind::ErrorRate => "error_rate",
            SliKind::Generic => "generic",
        }
    }
}

impl fmt::Display for SliKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl<'de> Deserialize<'de> for SliKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        Ok(SliKind::from_name(&name))
    }
}

/// Escalation action attached to a budget threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetAction {
    Notify,
    Alert,
    Page,
}

impl fmt::Display for BudgetAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BudgetAction::Notify => "notify",
            BudgetAction::Alert => "alert",
            BudgetAction::Page => "page",
        };
        write!(f, "{s}")
    }
}

/// One step of an SLO's escalation policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetThreshold {
    /// Error-budget percentage below which the action fires
    pub threshold: f64,
    /// Action taken when the budget falls below the threshold
    pub action: BudgetAction,
}

/// A declared service level objective
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slo {
    /// Unique key for the objective
    pub name: String,
    /// Operator-facing description
    pub description: String,
    /// Indicator the objective is evaluated against
    pub sli: SliKind,
    /// Target percentage the indicator must meet
    pub target: f64,
    /// Evaluation window the target applies to
    pub window: Duration,
    /// Escalation thresholds evaluated against the error budget
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub budget_policy: Vec<BudgetThreshold>,
}

/// Computed compliance state for one SLO
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SloStatus {
    /// The objective this status was computed for
    pub slo: Slo,
    /// Most recent indicator value
    pub current_value: f64,
    /// Remaining error budget percentage (0 to 100)
    pub error_budget: f64,
    /// Heuristic budget consumption rate over recent samples
    pub burn_rate: f64,
    /// Whether the indicator currently misses its target
    pub is_violated: bool,
    /// Forecast until budget exhaustion, set only when under a week out
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_to_exhaust: Option<String>,
}

impl SloStatus {
    /// Neutral state a freshly registered SLO starts from
    pub fn neutral(slo: Slo) -> Self {
        Self {
            slo,
            current_value: 100.0,
            error_budget: 100.0,
            burn_rate: 0.0,
            is_violated: false,
            time_to_exhaust: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_slo() -> Slo {
        Slo {
            name: "api-availability".to_string(),
            description: "API requests succeed".to_string(),
            sli: SliKind::Availability,
            target: 99.0,
            window: Duration::from_secs(30 * 24 * 3600),
            budget_policy: vec![
                BudgetThreshold {
                    threshold: 50.0,
                    action: BudgetAction::Notify,
                },
                BudgetThreshold {
                    threshold: 10.0,
                    action: BudgetAction::Page,
                },
            ],
        }
    }

    #[test]
    fn test_metric_round_trip() {
        let mut metric = Metric::new("request_duration", 125.5, "ms");
        metric
            .labels
            .insert("endpoint".to_string(), "/api/v1/pods".to_string());

        let json = serde_json::to_string(&metric).unwrap();
        let parsed: Metric = serde_json::from_str(&json).unwrap();

        assert_eq!(metric, parsed);
    }

    #[test]
    fn test_metric_omits_empty_labels() {
        let metric = Metric::new("cpu_usage_percent", 42.0, "percent");

        let value = serde_json::to_value(&metric).unwrap();
        assert!(value.get("labels").is_none());

        // Absent labels parse back to an empty map
        let parsed: Metric = serde_json::from_value(value).unwrap();
        assert_eq!(metric, parsed);
    }

    #[test]
    fn test_prediction_wire_format() {
        let prediction = Prediction {
            timestamp: Utc::now(),
            status: PredictionStatus::Degraded,
            probability: 0.3,
            reason: "Statistical anomaly detected".to_string(),
        };

        let value = serde_json::to_value(&prediction).unwrap();
        assert_eq!(value["status"], "degraded");
        assert_eq!(value["probability"], 0.3);
        assert_eq!(value["reason"], "Statistical anomaly detected");

        let parsed: Prediction = serde_json::from_value(value).unwrap();
        assert_eq!(prediction, parsed);
    }

    #[test]
    fn test_sli_kind_names() {
        assert_eq!(SliKind::from_name("availability"), SliKind::Availability);
        assert_eq!(SliKind::from_name("latency"), SliKind::Latency);
        assert_eq!(SliKind::from_name("error_rate"), SliKind::ErrorRate);
        // Anything unrecognized falls back to the generic average
        assert_eq!(SliKind::from_name("throughput"), SliKind::Generic);
        assert_eq!(SliKind::from_name(""), SliKind::Generic);
    }

    #[test]
    fn test_sli_kind_deserialize_fallback() {
        let parsed: SliKind = serde_json::from_str("\"error_rate\"").unwrap();
        assert_eq!(parsed, SliKind::ErrorRate);

        let parsed: SliKind = serde_json::from_str("\"saturation\"").unwrap();
        assert_eq!(parsed, SliKind::Generic);
    }

    #[test]
    fn test_slo_wire_field_names() {
        let slo = create_test_slo();

        let value = serde_json::to_value(&slo).unwrap();
        assert_eq!(value["name"], "api-availability");
        assert_eq!(value["sli"], "availability");
        assert_eq!(value["target"], 99.0);
        assert_eq!(value["budgetPolicy"][0]["threshold"], 50.0);
        assert_eq!(value["budgetPolicy"][0]["action"], "notify");
        assert_eq!(value["budgetPolicy"][1]["action"], "page");

        let parsed: Slo = serde_json::from_value(value).unwrap();
        assert_eq!(slo, parsed);
    }

    #[test]
    fn test_slo_status_wire_field_names() {
        let status = SloStatus {
            slo: create_test_slo(),
            current_value: 97.5,
            error_budget: 85.0,
            burn_rate: 1.25,
            is_violated: true,
            time_to_exhaust: Some("68.0h".to_string()),
        };

        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value["currentValue"], 97.5);
        assert_eq!(value["errorBudget"], 85.0);
        assert_eq!(value["burnRate"], 1.25);
        assert_eq!(value["isViolated"], true);
        assert_eq!(value["timeToExhaust"], "68.0h");

        let parsed: SloStatus = serde_json::from_value(value).unwrap();
        assert_eq!(status, parsed);
    }

    #[test]
    fn test_slo_status_omits_unset_exhaustion() {
        let status = SloStatus::neutral(create_test_slo());

        let value = serde_json::to_value(&status).unwrap();
        assert!(value.get("timeToExhaust").is_none());
        assert_eq!(value["currentValue"], 100.0);
        assert_eq!(value["errorBudget"], 100.0);
        assert_eq!(value["burnRate"], 0.0);
        assert_eq!(value["isViolated"], false);

        let parsed: SloStatus = serde_json::from_value(value).unwrap();
        assert_eq!(status, parsed);
    }
}
