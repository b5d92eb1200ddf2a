//! Sensor readings

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use validator::Validate;

use core_kernel::{Entity, EntityRef, SearchField, TemperatureId, ValuesId};

use crate::codec::show;

/// A reading, linked to the temperature sensors it was taken from
///
/// This side owns the many-to-many association; linked sensors are kept as
/// an ordered set of references so the same sensor is never linked twice.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct Values {
    pub id: Option<ValuesId>,
    pub value: Option<f64>,
    pub timestamp: Option<DateTime<Utc>>,
    pub temperatures: BTreeSet<EntityRef<TemperatureId>>,
}

impl Values {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: ValuesId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_timestamp(mut self, at: DateTime<Utc>) -> Self {
        self.timestamp = Some(at);
        self
    }

    pub fn with_temperature(mut self, temperature: TemperatureId) -> Self {
        self.add_temperature(temperature);
        self
    }

    /// Links a sensor; returns false if it was already linked
    pub fn add_temperature(&mut self, temperature: TemperatureId) -> bool {
        self.temperatures.insert(EntityRef::new(temperature))
    }

    /// Unlinks a sensor; returns false if it was not linked
    pub fn remove_temperature(&mut self, temperature: TemperatureId) -> bool {
        self.temperatures.remove(&EntityRef::new(temperature))
    }

    pub fn temperature_ids(&self) -> impl Iterator<Item = TemperatureId> + '_ {
        self.temperatures.iter().map(|r| r.id)
    }
}

impl Entity for Values {
    type Id = ValuesId;
    const ENTITY_NAME: &'static str = "Values";
    const INDEX_NAME: &'static str = "values";

    fn id(&self) -> Option<ValuesId> {
        self.id
    }

    fn set_id(&mut self, id: ValuesId) {
        self.id = Some(id);
    }

    fn search_fields(&self) -> Vec<SearchField> {
        let mut fields: Vec<SearchField> = [
            SearchField::optional("value", self.value.as_ref()),
            self.timestamp.map(|t| SearchField::new("timestamp", t.to_rfc3339())),
        ]
        .into_iter()
        .flatten()
        .collect();
        fields.extend(self.temperature_ids().map(|id| SearchField::new("temperatures.id", id)));
        fields
    }
}

impl PartialEq for Values {
    fn eq(&self, other: &Self) -> bool {
        self.same_identity(other)
    }
}

impl fmt::Display for Values {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Values{{id={}, value='{}', timestamp='{}'}}",
            show(&self.id),
            show(&self.value),
            show(&self.timestamp),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_and_unlink_sensors() {
        let mut values = Values::new();
        assert!(values.add_temperature(TemperatureId::new(1)));
        assert!(!values.add_temperature(TemperatureId::new(1)));
        assert!(values.add_temperature(TemperatureId::new(2)));
        assert_eq!(values.temperatures.len(), 2);

        assert!(values.remove_temperature(TemperatureId::new(1)));
        assert!(!values.remove_temperature(TemperatureId::new(1)));
        assert_eq!(values.temperature_ids().collect::<Vec<_>>(), vec![TemperatureId::new(2)]);
    }

    #[test]
    fn test_temperatures_serialize_as_refs() {
        let values = Values::new()
            .with_value(21.5)
            .with_temperature(TemperatureId::new(4));
        let json = serde_json::to_value(&values).unwrap();
        assert_eq!(json["value"], 21.5);
        assert_eq!(json["temperatures"], serde_json::json!([{ "id": 4 }]));
    }

    #[test]
    fn test_missing_temperatures_default_to_empty() {
        let values: Values = serde_json::from_str(r#"{"value": 3.0}"#).unwrap();
        assert!(values.temperatures.is_empty());
    }
}
