//! Tour request model: what the user asked for

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Display;
use std::str::FromStr;

use crate::FoodieTourError;

/// Dietary tags offered on the form. Deserializes from any casing of the label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum DietaryPreference {
    Vegetarian,
    Vegan,
    #[serde(rename = "Gluten-Free")]
    GlutenFree,
    Keto,
    Paleo,
    Pescatarian,
    Halal,
    Kosher,
    None,
}

impl DietaryPreference {
    pub const ALL: [DietaryPreference; 9] = [
        DietaryPreference::Vegetarian,
        DietaryPreference::Vegan,
        DietaryPreference::GlutenFree,
        DietaryPreference::Keto,
        DietaryPreference::Paleo,
        DietaryPreference::Pescatarian,
        DietaryPreference::Halal,
        DietaryPreference::Kosher,
        DietaryPreference::None,
    ];

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            DietaryPreference::Vegetarian => "Vegetarian",
            DietaryPreference::Vegan => "Vegan",
            DietaryPreference::GlutenFree => "Gluten-Free",
            DietaryPreference::Keto => "Keto",
            DietaryPreference::Paleo => "Paleo",
            DietaryPreference::Pescatarian => "Pescatarian",
            DietaryPreference::Halal => "Halal",
            DietaryPreference::Kosher => "Kosher",
            DietaryPreference::None => "None",
        }
    }
}

impl Display for DietaryPreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DietaryPreference {
    type Err = FoodieTourError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|pref| pref.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                FoodieTourError::validation(format!("Unknown dietary preference: {wanted}"))
            })
    }
}

impl TryFrom<String> for DietaryPreference {
    type Error = FoodieTourError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

fn default_prefs() -> Vec<DietaryPreference> {
    vec![DietaryPreference::None]
}

/// An empty selection means no restriction
fn or_default_prefs(prefs: Vec<DietaryPreference>) -> Vec<DietaryPreference> {
    if prefs.is_empty() { default_prefs() } else { prefs }
}

fn deserialize_prefs<'de, D>(deserializer: D) -> Result<Vec<DietaryPreference>, D::Error>
where
    D: Deserializer<'de>,
{
    Vec::<DietaryPreference>::deserialize(deserializer).map(or_default_prefs)
}

fn default_surprise() -> bool {
    true
}

/// One "Generate" action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TourRequest {
    /// Comma-separated city names as typed by the user
    pub cities: String,
    #[serde(default = "default_prefs", deserialize_with = "deserialize_prefs")]
    pub prefs: Vec<DietaryPreference>,
    #[serde(default = "default_surprise")]
    pub surprise: bool,
    /// Cosmetic only
    #[serde(default)]
    pub festival: bool,
}

impl Default for TourRequest {
    fn default() -> Self {
        Self {
            cities: "Paris, Tokyo".to_string(),
            prefs: default_prefs(),
            surprise: true,
            festival: false,
        }
    }
}

impl TourRequest {
    /// City names in input order, trimmed, blanks dropped
    #[must_use]
    pub fn city_list(&self) -> Vec<String> {
        parse_cities(&self.cities)
    }

    /// Builds a request from submitted form fields. Checkboxes are only sent when ticked.
    pub fn from_form_fields(fields: &[(String, String)]) -> Result<Self, FoodieTourError> {
        let mut cities = String::new();
        let mut prefs = Vec::new();
        let mut surprise = false;
        let mut festival = false;

        for (name, value) in fields {
            match name.as_str() {
                "cities" => cities = value.clone(),
                "prefs" => prefs.push(value.parse()?),
                "surprise" => surprise = true,
                "festival" => festival = true,
                _ => {}
            }
        }

        Ok(Self {
            cities,
            prefs: or_default_prefs(prefs),
            surprise,
            festival,
        })
    }
}

/// Splits a comma-separated city list
#[must_use]
pub fn parse_cities(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Paris, Tokyo", vec!["Paris", "Tokyo"])]
    #[case("  Lisbon ,, ,Porto  ", vec!["Lisbon", "Porto"])]
    #[case("", vec![])]
    #[case(" , ", vec![])]
    #[case("New York", vec!["New York"])]
    fn test_parse_cities(#[case] input: &str, #[case] expected: Vec<&str>) {
        assert_eq!(parse_cities(input), expected);
    }

    #[rstest]
    #[case("vegan", DietaryPreference::Vegan)]
    #[case("Gluten-Free", DietaryPreference::GlutenFree)]
    #[case(" KOSHER ", DietaryPreference::Kosher)]
    fn test_preference_from_str(#[case] input: &str, #[case] expected: DietaryPreference) {
        assert_eq!(input.parse::<DietaryPreference>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_preference_is_rejected() {
        let err = "Carnivore".parse::<DietaryPreference>().unwrap_err();
        assert!(matches!(err, FoodieTourError::Validation { .. }));
    }

    #[test]
    fn test_from_form_fields() {
        let fields = vec![
            ("cities".to_string(), "Rome, Naples".to_string()),
            ("prefs".to_string(), "Vegan".to_string()),
            ("prefs".to_string(), "Halal".to_string()),
            ("festival".to_string(), "on".to_string()),
        ];
        let request = TourRequest::from_form_fields(&fields).unwrap();
        assert_eq!(request.city_list(), vec!["Rome", "Naples"]);
        assert_eq!(
            request.prefs,
            vec![DietaryPreference::Vegan, DietaryPreference::Halal]
        );
        assert!(!request.surprise);
        assert!(request.festival);
    }

    #[test]
    fn test_from_form_fields_defaults_prefs_to_none() {
        let fields = vec![("cities".to_string(), "Oslo".to_string())];
        let request = TourRequest::from_form_fields(&fields).unwrap();
        assert_eq!(request.prefs, vec![DietaryPreference::None]);
    }

    #[test]
    fn test_json_defaults() {
        let request: TourRequest = serde_json::from_str(r#"{"cities":"Paris"}"#).unwrap();
        assert!(request.surprise);
        assert!(!request.festival);
        assert_eq!(request.prefs, vec![DietaryPreference::None]);
    }

    #[test]
    fn test_json_empty_prefs_mean_none() {
        let request: TourRequest =
            serde_json::from_str(r#"{"cities":"Paris","prefs":[]}"#).unwrap();
        assert_eq!(request.prefs, vec![DietaryPreference::None]);
    }

    #[test]
    fn test_json_prefs_ignore_case() {
        let request: TourRequest =
            serde_json::from_str(r#"{"cities":"Paris","prefs":["vegan","GLUTEN-FREE"]}"#).unwrap();
        assert_eq!(
            request.prefs,
            vec![DietaryPreference::Vegan, DietaryPreference::GlutenFree]
        );

        let err = serde_json::from_str::<TourRequest>(r#"{"cities":"Paris","prefs":["Carnivore"]}"#)
            .unwrap_err();
        assert!(err.to_string().contains("Unknown dietary preference: Carnivore"));
    }

    #[test]
    fn test_preference_serializes_as_label() {
        let json = serde_json::to_string(&DietaryPreference::GlutenFree).unwrap();
        assert_eq!(json, r#""Gluten-Free""#);
    }
}
