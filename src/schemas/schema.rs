use schemars::schema::RootSchema;
use serde_json::Value;
use std::sync::{Arc, OnceLock};

use crate::types::DayPlan;

/// Cached JSON schema for one of the plan types
#[derive(Clone, Debug)]
pub struct SchemaHandle {
    schema_name: &'static str,
    schema_json: Arc<Value>,
}

impl SchemaHandle {
    pub fn from_root_schema(schema_name: &'static str, root: RootSchema) -> Self {
        // A `true` schema accepts every document, which keeps parsing lenient
        // if the generated schema ever fails to serialize.
        let schema_json = serde_json::to_value(root).unwrap_or(Value::Bool(true));

        Self {
            schema_name,
            schema_json: Arc::new(schema_json),
        }
    }

    pub fn schema_name(&self) -> &'static str {
        self.schema_name
    }

    pub fn schema_json(&self) -> &Value {
        self.schema_json.as_ref()
    }
}

/// Schema every model-returned itinerary day is checked against
pub fn day_plan_schema() -> &'static SchemaHandle {
    static HANDLE: OnceLock<SchemaHandle> = OnceLock::new();
    HANDLE.get_or_init(|| SchemaHandle::from_root_schema("DayPlan", schemars::schema_for!(DayPlan)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_plan_schema_describes_fields() {
        let schema = day_plan_schema();
        assert_eq!(schema.schema_name(), "DayPlan");

        let properties = &schema.schema_json()["properties"];
        assert!(properties.get("day").is_some());
        assert!(properties.get("activities").is_some());
        assert!(properties.get("tips").is_some());
    }
}
