pub mod schema;
pub mod validation;

pub use schema::{day_plan_schema, SchemaHandle};
pub use validation::validate_payload;
