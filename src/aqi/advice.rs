//! Health recommendations per classification

use serde::{Deserialize, Serialize};

use super::Classification;

/// Advice attached to an air quality result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthRecommendation {
    pub general: String,
    pub sensitive_groups: String,
    pub activities: String,
    pub indoor: String,
}

impl HealthRecommendation {
    fn from_static(text: &[&str; 4]) -> Self {
        Self {
            general: text[0].to_string(),
            sensitive_groups: text[1].to_string(),
            activities: text[2].to_string(),
            indoor: text[3].to_string(),
        }
    }
}

const GOOD: [&str; 4] = [
    "Air quality is satisfactory and poses little or no risk.",
    "No special precautions are needed.",
    "Ideal conditions for outdoor activities.",
    "Ventilate freely.",
];

const FAIR: [&str; 4] = [
    "Air quality is acceptable for most people.",
    "Unusually sensitive people should watch for symptoms.",
    "Outdoor activities are fine.",
    "Ventilation is fine.",
];

const MODERATE: [&str; 4] = [
    "Air quality is acceptable, though some pollutants may be a concern for a few people.",
    "People with respiratory or heart conditions should limit prolonged outdoor exertion.",
    "Most people can stay active outdoors; take breaks during intense exercise.",
    "Ventilate during cleaner hours of the day.",
];

const SENSITIVE: [&str; 4] = [
    "The general public is not likely to be affected.",
    "Children, older adults and people with lung or heart disease should reduce outdoor exertion.",
    "Shorten or move intense outdoor activities indoors.",
    "Keep windows closed during peak traffic hours.",
];

const POOR: [&str; 4] = [
    "Everyone may begin to experience health effects.",
    "Sensitive groups should avoid prolonged outdoor exertion.",
    "Reduce outdoor activities, especially strenuous ones.",
    "Keep windows closed; use an air purifier if available.",
];

const VERY_POOR: [&str; 4] = [
    "Health alert: everyone may experience more serious health effects.",
    "Sensitive groups should stay indoors.",
    "Avoid outdoor physical activity.",
    "Keep windows closed and run air filtration.",
];

const EXTREME: [&str; 4] = [
    "Health emergency: the entire population is likely to be affected.",
    "Sensitive groups must remain indoors and follow medical advice.",
    "Avoid all outdoor activity.",
    "Seal windows and doors; wear a respirator mask if you must go outside.",
];

/// Recommendation text for a classification.
///
/// `Unknown` falls back to the good-air message set.
pub fn recommendation(classification: Classification) -> HealthRecommendation {
    let text = match classification {
        Classification::Good | Classification::Unknown => &GOOD,
        Classification::Fair => &FAIR,
        Classification::Moderate => &MODERATE,
        Classification::UnhealthyForSensitive => &SENSITIVE,
        Classification::Poor | Classification::Unhealthy => &POOR,
        Classification::VeryPoor | Classification::VeryUnhealthy => &VERY_POOR,
        Classification::ExtremelyPoor | Classification::Hazardous => &EXTREME,
    };
    HealthRecommendation::from_static(text)
}
