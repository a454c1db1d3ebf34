use std::fmt;

use serde::Serialize;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertPriority {
    High,
    Medium,
    Low,
}

impl AlertPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertPriority::High => "high",
            AlertPriority::Medium => "medium",
            AlertPriority::Low => "low",
        }
    }
}

impl fmt::Display for AlertPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a breakdown reason to its alert priority. Unrecognized reasons are low priority.
pub fn priority(reason: &str) -> AlertPriority {
    match reason {
        "Mechanical Problem" | "Flat Tire" | "Won't Start" | "Accident" => AlertPriority::High,
        "Heavy Traffic" | "Weather Conditions" => AlertPriority::Medium,
        "Delayed by School" | "Other" | "Problem Run" => AlertPriority::Low,
        _ => AlertPriority::Low,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_priority_accident() {
        assert_eq!(priority("Accident"), AlertPriority::High);
    }

    #[test]
    fn test_priority_high_reasons() {
        for reason in ["Mechanical Problem", "Flat Tire", "Won't Start", "Accident"] {
            assert_eq!(priority(reason), AlertPriority::High, "{reason}");
        }
    }

    #[test]
    fn test_priority_heavy_traffic() {
        assert_eq!(priority("Heavy Traffic"), AlertPriority::Medium);
    }

    #[test]
    fn test_priority_weather() {
        assert_eq!(priority("Weather Conditions"), AlertPriority::Medium);
    }

    #[test]
    fn test_priority_low_reasons() {
        for reason in ["Delayed by School", "Other", "Problem Run"] {
            assert_eq!(priority(reason), AlertPriority::Low, "{reason}");
        }
    }

    #[test]
    fn test_priority_unknown_reason() {
        assert_eq!(priority("Unknown Reason"), AlertPriority::Low);
    }

    #[test]
    fn test_priority_is_case_sensitive() {
        assert_eq!(priority("accident"), AlertPriority::Low);
    }

    #[test]
    fn test_priority_as_str() {
        assert_eq!(AlertPriority::High.as_str(), "high");
        assert_eq!(AlertPriority::Medium.to_string(), "medium");
        assert_eq!(
            serde_json::to_value(AlertPriority::Low).unwrap(),
            serde_json::json!("low")
        );
    }
}
