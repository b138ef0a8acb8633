//! Wire representation of Moira triggers.
//!
//! Field names follow the Moira HTTP API exactly. Every field of [`Trigger`]
//! has a default so partially populated records returned by older API
//! versions still deserialize.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::IntoDeserializer;
use serde::de::value::StringDeserializer;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// How warn/error thresholds are evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerType {
    Rising,
    Falling,
    Expression,
}

/// State a trigger falls into when no data arrives for `ttl` seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TtlState {
    #[default]
    Nodata,
    Del,
    Error,
    Warn,
    Ok,
}

/// Where the trigger's metrics come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerSource {
    #[default]
    GraphiteLocal,
    GraphiteRemote,
    PrometheusRemote,
}

impl TriggerSource {
    /// Source implied by the legacy `is_remote` flag.
    #[must_use]
    pub fn from_is_remote(is_remote: bool) -> Self {
        if is_remote {
            Self::GraphiteRemote
        } else {
            Self::GraphiteLocal
        }
    }
}

/// Day of week as Moira names it in schedules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Weekday {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl Weekday {
    /// All days in calendar order, Monday first.
    pub const ALL: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mon => "Mon",
            Self::Tue => "Tue",
            Self::Wed => "Wed",
            Self::Thu => "Thu",
            Self::Fri => "Fri",
            Self::Sat => "Sat",
            Self::Sun => "Sun",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a trigger schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Day {
    pub name: Weekday,
    pub enabled: bool,
}

/// Time window in which a trigger may send notifications.
///
/// Offsets are minutes from midnight; `tz_offset` is the timezone offset in minutes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub days: Vec<Day>,
    pub start_offset: i64,
    pub end_offset: i64,
    pub tz_offset: i64,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            days: Weekday::ALL
                .iter()
                .map(|&name| Day {
                    name,
                    enabled: true,
                })
                .collect(),
            start_offset: 0,
            end_offset: 23 * 60 + 59,
            tz_offset: 0,
        }
    }
}

/// A trigger record as stored by Moira.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Trigger {
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub desc: String,
    #[serde(deserialize_with = "null_as_default")]
    pub targets: Vec<String>,
    pub warn_value: Option<f64>,
    pub error_value: Option<f64>,
    #[serde(
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub trigger_type: Option<TriggerType>,
    #[serde(deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    pub ttl_state: TtlState,
    pub ttl: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub expression: String,
    pub is_remote: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger_source: Option<TriggerSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<String>,
    pub mute_new_metrics: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alone_metrics: Option<BTreeMap<String, bool>>,
    #[serde(deserialize_with = "null_as_default")]
    pub sched: Schedule,
}

impl Default for Trigger {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            desc: String::new(),
            targets: Vec::new(),
            warn_value: None,
            error_value: None,
            trigger_type: None,
            tags: Vec::new(),
            ttl_state: TtlState::default(),
            ttl: 600,
            expression: String::new(),
            is_remote: false,
            trigger_source: None,
            cluster_id: None,
            mute_new_metrics: false,
            alone_metrics: None,
            sched: Schedule::default(),
        }
    }
}

/// Body returned by Moira on trigger create and update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WriteResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, rename = "checkResult")]
    pub check_result: Option<Value>,
}

impl WriteResponse {
    /// Check-result warnings attached to the write, if any.
    ///
    /// Null, empty strings, empty objects and empty arrays carry no warning.
    #[must_use]
    pub fn warnings(&self) -> Vec<Value> {
        match &self.check_result {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::String(s)) if s.is_empty() => Vec::new(),
            Some(Value::Object(map)) if map.is_empty() => Vec::new(),
            Some(Value::Array(items)) => items.clone(),
            Some(other) => vec![other.clone()],
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<TriggerType>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) if raw.is_empty() => Ok(None),
        Some(raw) => {
            let de: StringDeserializer<D::Error> = raw.into_deserializer();
            TriggerType::deserialize(de).map(Some)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_partial_record_takes_defaults() {
        let trigger: Trigger = serde_json::from_value(json!({
            "id": "trigger_1",
            "name": "Trigger 1",
            "targets": ["prefix.target1.postfix"],
            "tags": ["Project"],
            "desc": null,
            "trigger_type": ""
        }))
        .unwrap();

        assert_eq!(trigger.id, "trigger_1");
        assert_eq!(trigger.desc, "");
        assert_eq!(trigger.trigger_type, None);
        assert_eq!(trigger.ttl, 600);
        assert_eq!(trigger.ttl_state, TtlState::Nodata);
        assert_eq!(trigger.sched, Schedule::default());
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let trigger: Trigger = serde_json::from_value(json!({
            "id": "t",
            "throttling": 0,
            "patterns": ["a.*"],
            "trigger_type": "falling",
            "ttl_state": "DEL",
            "trigger_source": "prometheus_remote"
        }))
        .unwrap();

        assert_eq!(trigger.trigger_type, Some(TriggerType::Falling));
        assert_eq!(trigger.ttl_state, TtlState::Del);
        assert_eq!(trigger.trigger_source, Some(TriggerSource::PrometheusRemote));
    }

    #[test]
    fn test_unknown_trigger_type_is_rejected() {
        let err = serde_json::from_value::<Trigger>(json!({"trigger_type": "sideways"}));
        assert!(err.is_err());
    }

    #[test]
    fn test_schedule_wire_names() {
        let value = serde_json::to_value(Schedule::default()).unwrap();
        assert_eq!(value["startOffset"], 0);
        assert_eq!(value["endOffset"], 1439);
        assert_eq!(value["tzOffset"], 0);
        assert_eq!(value["days"][0], json!({"name": "Mon", "enabled": true}));
        assert_eq!(value["days"][6]["name"], "Sun");
    }

    #[test]
    fn test_optional_fields_are_omitted() {
        let value = serde_json::to_value(Trigger::default()).unwrap();
        let obj = value.as_object().unwrap();
        assert!(!obj.contains_key("alone_metrics"));
        assert!(!obj.contains_key("cluster_id"));
        assert!(!obj.contains_key("trigger_type"));
        assert_eq!(obj["warn_value"], Value::Null);
    }

    #[test]
    fn test_warnings_from_check_result() {
        let empty = WriteResponse {
            id: Some("t".into()),
            check_result: Some(json!("")),
        };
        assert!(empty.warnings().is_empty());

        let empty_obj = WriteResponse {
            id: None,
            check_result: Some(json!({})),
        };
        assert!(empty_obj.warnings().is_empty());

        let single = WriteResponse {
            id: None,
            check_result: Some(json!({"targets": ["bad target"]})),
        };
        assert_eq!(single.warnings(), vec![json!({"targets": ["bad target"]})]);

        let list = WriteResponse {
            id: None,
            check_result: Some(json!(["a", "b"])),
        };
        assert_eq!(list.warnings().len(), 2);
    }

    #[test]
    fn test_source_from_legacy_flag() {
        assert_eq!(TriggerSource::from_is_remote(true), TriggerSource::GraphiteRemote);
        assert_eq!(TriggerSource::from_is_remote(false), TriggerSource::GraphiteLocal);
    }
}
