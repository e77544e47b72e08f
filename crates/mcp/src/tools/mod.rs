pub mod evidence;
mod registry;

pub use evidence::SearchClinicalEvidenceTool;
pub use registry::{
    json_schema_boolean, json_schema_object, json_schema_string, Tool, ToolRegistry,
};
