use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const DEFAULT_RECOMMENDATIONS: &str =
    "Please consult with healthcare professionals for personalized advice regarding product safety.";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }

    /// Keyword scan over the reply; the first matching tier wins, highest first.
    pub fn detect(reply: &str) -> Self {
        let lower = reply.to_lowercase();
        let mentions = |level: &str| {
            lower.contains(&format!("risk level: **{level}**"))
                || lower.contains(&format!("risk level: {level}"))
                || lower.contains(&format!("{level} risk"))
        };
        if mentions("high") {
            RiskLevel::High
        } else if mentions("medium") {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown risk level: {0}")]
pub struct UnknownRiskLevel(String);

impl FromStr for RiskLevel {
    type Err = UnknownRiskLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            other => Err(UnknownRiskLevel(other.to_string())),
        }
    }
}

/// What we keep from an LLM reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafetyReport {
    pub full_analysis: String,
    pub risk_level: RiskLevel,
    pub recommendations: String,
    pub translated_text: Option<String>,
}

lazy_static! {
    static ref RECOMMENDATIONS_RE: Regex =
        Regex::new(r"(?is)## Usage Recommendations(.*?)(?:##|\z)").unwrap();
    static ref TRANSLATION_RE: Regex = Regex::new(r"(?s)Translation:(.*?)(?:##|\z)").unwrap();
}

impl SafetyReport {
    pub fn from_reply(reply: String) -> Self {
        let risk_level = RiskLevel::detect(&reply);
        let recommendations = section_after(&RECOMMENDATIONS_RE, &reply)
            .unwrap_or_else(|| DEFAULT_RECOMMENDATIONS.to_string());
        let translated_text = section_after(&TRANSLATION_RE, &reply)
            // "**Translation:** foo" leaves the closing bold marker behind
            .map(|t| t.trim_start_matches('*').trim_start().to_string())
            .filter(|t| !t.is_empty());
        Self {
            full_analysis: reply,
            risk_level,
            recommendations,
            translated_text,
        }
    }
}

fn section_after(re: &Regex, text: &str) -> Option<String> {
    let body = re.captures(text)?.get(1)?.as_str().trim();
    (!body.is_empty()).then(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPLY: &str = "\
## Language Detection & Translation
The list is in German.
**Translation:** Water, sugar, citric acid, aspartame.

## Ingredient Safety Analysis
Aspartame is a sweetener...

## Risk Assessment
Risk Level: **MEDIUM**

## Usage Recommendations
- Fine in moderation.
- Avoid if you have phenylketonuria.
";

    #[test]
    fn detects_each_tier() {
        assert_eq!(RiskLevel::detect("Risk Level: HIGH"), RiskLevel::High);
        assert_eq!(RiskLevel::detect("risk level: **high**"), RiskLevel::High);
        assert_eq!(RiskLevel::detect("This is a high risk product"), RiskLevel::High);
        assert_eq!(RiskLevel::detect("Risk Level: Medium"), RiskLevel::Medium);
        assert_eq!(RiskLevel::detect("a medium risk overall"), RiskLevel::Medium);
        assert_eq!(RiskLevel::detect("Risk Level: LOW"), RiskLevel::Low);
        assert_eq!(RiskLevel::detect("nothing to see"), RiskLevel::Low);
    }

    #[test]
    fn high_wins_when_both_mentioned() {
        let reply = "Mostly medium risk, but one ingredient is high risk.";
        assert_eq!(RiskLevel::detect(reply), RiskLevel::High);
    }

    #[test]
    fn parses_full_reply() {
        let report = SafetyReport::from_reply(REPLY.to_string());
        assert_eq!(report.risk_level, RiskLevel::Medium);
        assert_eq!(
            report.recommendations,
            "- Fine in moderation.\n- Avoid if you have phenylketonuria."
        );
        assert_eq!(
            report.translated_text.as_deref(),
            Some("Water, sugar, citric acid, aspartame.")
        );
        assert_eq!(report.full_analysis, REPLY);
    }

    #[test]
    fn recommendations_stop_at_next_header() {
        let reply = "## usage recommendations\nUse sparingly.\n## Sources\nFDA";
        let report = SafetyReport::from_reply(reply.to_string());
        assert_eq!(report.recommendations, "Use sparingly.");
    }

    #[test]
    fn missing_sections_fall_back() {
        let report = SafetyReport::from_reply("Looks fine.".to_string());
        assert_eq!(report.recommendations, DEFAULT_RECOMMENDATIONS);
        assert_eq!(report.translated_text, None);
        assert_eq!(report.risk_level, RiskLevel::Low);
    }

    #[test]
    fn risk_level_string_forms_agree() {
        for level in [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High] {
            assert_eq!(level.as_str().parse::<RiskLevel>().unwrap(), level);
            assert_eq!(
                serde_json::to_string(&level).unwrap(),
                format!("\"{}\"", level)
            );
        }
        assert!("severe".parse::<RiskLevel>().is_err());
    }
}
