//! The JSON analytics payload consumed by a render.
//!
//! Section keys use the `*_data` snake_case names; the bare camelCase names are accepted as
//! aliases. Every section is either its data object or `{"error": "..."}`. Numeric fields accept
//! numbers, numeric strings (`"1,234.5"`, `"45%"`) and `null`, so upstream formatting quirks do
//! not fail a render.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::charts::sankey::Flow;
use crate::error::Result;
use crate::format::display_date;

/// Default document title.
pub const DEFAULT_TITLE: &str = "Waste Management Report";

mod lenient {
    use super::*;

    pub fn number<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<Value>::deserialize(deserializer)?
            .as_ref()
            .and_then(super::number_from_value)
            .unwrap_or(0.0))
    }

    pub fn string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            Some(Value::String(text)) => text,
            Some(Value::Number(number)) => number.to_string(),
            Some(Value::Bool(flag)) => flag.to_string(),
            _ => String::new(),
        })
    }
}

/// Reads a JSON number or numeric string.
pub fn number_from_value(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text
            .trim()
            .trim_end_matches('%')
            .replace(',', "")
            .trim()
            .parse()
            .ok(),
        _ => None,
    };
    number.filter(|number| number.is_finite())
}

/// A section that either carries data or reports an upstream error.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Section<T> {
    Failed { error: String },
    Ready(T),
}

impl<T> Section<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Section::Ready(data) => Some(data),
            Section::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Section::Failed { error } => Some(error),
            Section::Ready(_) => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub fn as_slice(&self) -> &[T] {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => std::slice::from_ref(item),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Users {
    One(String),
    Many(Vec<String>),
}

impl Users {
    pub fn display(&self) -> String {
        match self {
            Users::One(user) => user.trim().to_owned(),
            Users::Many(users) => users
                .iter()
                .map(|user| user.trim())
                .filter(|user| !user.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct NamedValue {
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub value: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct MonthlyValue {
    #[serde(default, deserialize_with = "lenient::string")]
    pub month: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub value: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct BranchTrend {
    #[serde(default, deserialize_with = "lenient::string")]
    pub branch: String,
    #[serde(default)]
    pub monthly: Vec<MonthlyValue>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Overview {
    #[serde(deserialize_with = "lenient::number")]
    pub total_weight_kg: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub recycled_weight_kg: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub landfill_weight_kg: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub diversion_rate: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub target_rate: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub total_collections: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub co2_saved_kg: f64,
    pub top_materials: Vec<NamedValue>,
    pub branch_trends: Vec<BranchTrend>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BranchPerformance {
    #[serde(deserialize_with = "lenient::string")]
    pub branch: String,
    #[serde(deserialize_with = "lenient::number")]
    pub total_weight_kg: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub recycled_weight_kg: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub landfill_weight_kg: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub diversion_rate: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub target_rate: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub collections: f64,
    #[serde(deserialize_with = "lenient::string")]
    pub status: String,
    pub materials: Vec<NamedValue>,
    pub monthly: Vec<MonthlyValue>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CategoryComparison {
    #[serde(deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(deserialize_with = "lenient::number")]
    pub current: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub previous: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrendSeries {
    #[serde(deserialize_with = "lenient::string")]
    pub key: String,
    pub values: Vec<MonthlyValue>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Trend {
    #[serde(deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(deserialize_with = "lenient::string")]
    pub unit: String,
    /// Months to draw, in order; all months present in the series when absent.
    pub months: Option<Vec<String>>,
    pub series: Vec<TrendSeries>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Comparison {
    pub narrative: Vec<String>,
    pub current_label: Option<String>,
    pub previous_label: Option<String>,
    pub categories: Vec<CategoryComparison>,
    pub trends: Vec<Trend>,
}

impl Comparison {
    pub fn current_label(&self) -> &str {
        self.current_label.as_deref().unwrap_or("Current period")
    }

    pub fn previous_label(&self) -> &str {
        self.previous_label.as_deref().unwrap_or("Previous period")
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MaterialRecord {
    #[serde(deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(deserialize_with = "lenient::number")]
    pub weight_kg: f64,
    /// Percentage of the total.
    #[serde(deserialize_with = "lenient::number")]
    pub share: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub collections: f64,
    pub destinations: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MainMaterials {
    #[serde(deserialize_with = "lenient::number")]
    pub total_weight_kg: f64,
    pub materials: Vec<MaterialRecord>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MaterialGroup {
    #[serde(deserialize_with = "lenient::string")]
    pub main_material: String,
    pub items: Vec<MaterialRecord>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SubMaterials {
    pub groups: Vec<MaterialGroup>,
}

/// One row of the flow list, either keyed or tabular (`[source, target, weight]`).
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FlowRow {
    Tabular(Vec<Value>),
    Record {
        #[serde(default, deserialize_with = "lenient::string")]
        source: String,
        #[serde(default, deserialize_with = "lenient::string")]
        target: String,
        #[serde(default, deserialize_with = "lenient::number")]
        weight: f64,
    },
}

impl FlowRow {
    /// The flow carried by this row; tabular rows without a numeric weight (headers) yield none.
    pub fn to_flow(&self) -> Option<Flow> {
        match self {
            FlowRow::Record {
                source,
                target,
                weight,
            } => Some(Flow::new(source.clone(), target.clone(), *weight)),
            FlowRow::Tabular(cells) => {
                let [source, target, weight, ..] = cells.as_slice() else {
                    return None;
                };
                let weight = number_from_value(weight)?;
                let label = |value: &Value| match value {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                };
                Some(Flow::new(label(source), label(target), weight))
            }
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct WasteDiversion {
    pub flows: Vec<FlowRow>,
    pub destinations: Vec<MaterialRecord>,
}

impl WasteDiversion {
    pub fn flows(&self) -> Vec<Flow> {
        self.flows.iter().filter_map(FlowRow::to_flow).collect()
    }
}

/// The single, read-only input of a render.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ReportPayload {
    pub users: Users,
    #[serde(deserialize_with = "lenient::string")]
    pub location: String,
    #[serde(deserialize_with = "lenient::string")]
    pub date_from: String,
    #[serde(deserialize_with = "lenient::string")]
    pub date_to: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, alias = "overview")]
    pub overview_data: Option<Section<Overview>>,
    #[serde(default, alias = "performance")]
    pub performance_data: Option<Section<OneOrMany<BranchPerformance>>>,
    #[serde(default, alias = "comparison")]
    pub comparison_data: Option<Section<Comparison>>,
    #[serde(default, alias = "mainMaterials")]
    pub main_materials_data: Option<Section<MainMaterials>>,
    #[serde(default, alias = "subMaterials")]
    pub sub_materials_data: Option<Section<SubMaterials>>,
    #[serde(default, alias = "wasteDiversion")]
    pub waste_diversion_data: Option<Section<WasteDiversion>>,
}

impl ReportPayload {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn title(&self) -> &str {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|title| !title.is_empty())
            .unwrap_or(DEFAULT_TITLE)
    }

    /// `01 Jan 2024 - 31 Mar 2024`.
    pub fn period(&self) -> String {
        format!("{} - {}", display_date(&self.date_from), display_date(&self.date_to))
    }

    /// Performance records, empty when the section is missing or failed.
    pub fn branches(&self) -> &[BranchPerformance] {
        self.performance_data
            .as_ref()
            .and_then(Section::ready)
            .map(OneOrMany::as_slice)
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base() -> Value {
        json!({
            "users": ["Ops Team", " "],
            "location": "North Depot",
            "date_from": "2024-01-01",
            "date_to": "2024-03-31",
        })
    }

    #[test]
    fn minimal_payload_parses() {
        let payload = ReportPayload::from_value(base()).unwrap();
        assert_eq!(payload.users.display(), "Ops Team");
        assert_eq!(payload.title(), DEFAULT_TITLE);
        assert_eq!(payload.period(), "01 Jan 2024 - 31 Mar 2024");
        assert!(payload.overview_data.is_none());
        assert!(payload.branches().is_empty());
    }

    #[test]
    fn missing_identity_is_an_error() {
        let err = ReportPayload::from_value(json!({ "location": "x" })).unwrap_err();
        assert!(matches!(err, crate::error::ReportError::Payload(_)));
    }

    #[test]
    fn sections_report_errors() {
        let mut value = base();
        value["comparison_data"] = json!({ "error": "no previous period" });
        value["wasteDiversion"] = json!({ "flows": [] });
        let payload = ReportPayload::from_value(value).unwrap();
        let comparison = payload.comparison_data.as_ref().unwrap();
        assert_eq!(comparison.error(), Some("no previous period"));
        assert!(comparison.ready().is_none());
        assert!(payload.waste_diversion_data.as_ref().unwrap().ready().is_some());
    }

    #[test]
    fn performance_accepts_one_or_many() {
        let mut value = base();
        value["performance_data"] = json!({ "branch": "North", "diversion_rate": "61.5%" });
        let payload = ReportPayload::from_value(value.clone()).unwrap();
        assert_eq!(payload.branches().len(), 1);
        assert_eq!(payload.branches()[0].diversion_rate, 61.5);

        value["performance_data"] = json!([{ "branch": "North" }, { "branch": "South" }]);
        let payload = ReportPayload::from_value(value).unwrap();
        assert_eq!(payload.branches().len(), 2);
    }

    #[test]
    fn lenient_numbers_and_keys() {
        let mut value = base();
        value["main_materials_data"] = json!({
            "total_weight_kg": "1,250.5",
            "materials": [{ "name": "Glass", "weight_kg": null, "collections": 4 }]
        });
        value["comparison_data"] = json!({
            "trends": [{ "title": "Monthly", "series": [{ "key": 2024, "values": [] }] }]
        });
        let payload = ReportPayload::from_value(value).unwrap();
        let materials = payload.main_materials_data.unwrap();
        let materials = materials.ready().unwrap();
        assert_eq!(materials.total_weight_kg, 1250.5);
        assert_eq!(materials.materials[0].weight_kg, 0.0);
        let comparison = payload.comparison_data.unwrap();
        assert_eq!(comparison.ready().unwrap().trends[0].series[0].key, "2024");
    }

    #[test]
    fn tabular_flows_skip_the_header() {
        let diversion: WasteDiversion = serde_json::from_value(json!({
            "flows": [
                ["Source", "Destination", "Weight"],
                ["Cardboard", "Recycling", 120],
                { "source": "Food", "target": "Composting", "weight": "40" }
            ]
        }))
        .unwrap();
        assert_eq!(diversion.flows.len(), 3);
        assert_eq!(
            diversion.flows(),
            vec![
                Flow::new("Cardboard", "Recycling", 120.0),
                Flow::new("Food", "Composting", 40.0)
            ]
        );
    }
}
