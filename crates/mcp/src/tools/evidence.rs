// The search_clinical_evidence tool: queries the CIViC API and renders an
// evidence report.

use crate::protocol::{CallToolResult, ToolSchema};
use crate::tools::{json_schema_boolean, json_schema_object, json_schema_string, Tool};
use anyhow::{Context, Result};
use nexonco_core::{CivicClient, EvidenceFilter, ReportBuilder};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

pub const SEARCH_TOOL_NAME: &str = "search_clinical_evidence";

const SEARCH_TOOL_DESCRIPTION: &str = "Perform a flexible search for clinical evidence using combinations of filters such as disease, therapy, \
molecular profile, phenotype, evidence type, and direction. This flexible search system allows you to tailor \
your query based on the data needed for research or clinical decision-making. It returns a detailed report that \
includes summary statistics, a top 10 evidence listing, citation sources, and a disclaimer.";

/// Tool to search CIViC clinical evidence records.
pub struct SearchClinicalEvidenceTool {
    client: Arc<CivicClient>,
}

impl SearchClinicalEvidenceTool {
    pub fn new(client: Arc<CivicClient>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SearchArgs {
    #[serde(default)]
    disease_name: Option<String>,
    #[serde(default)]
    therapy_name: Option<String>,
    #[serde(default)]
    molecular_profile_name: Option<String>,
    #[serde(default)]
    phenotype_name: Option<String>,
    #[serde(default)]
    evidence_type: Option<String>,
    #[serde(default)]
    evidence_direction: Option<String>,
    #[serde(default)]
    filter_strong_evidence: bool,
}

impl SearchArgs {
    /// Convert raw string arguments into a typed filter. Empty strings mean
    /// "not provided"; bad enum values are reported to the caller.
    fn into_filter(self) -> Result<EvidenceFilter, String> {
        let evidence_type = match self.evidence_type.as_deref() {
            None | Some("") => None,
            Some(raw) => Some(raw.parse()?),
        };
        let evidence_direction = match self.evidence_direction.as_deref() {
            None | Some("") => None,
            Some(raw) => Some(raw.parse()?),
        };

        Ok(EvidenceFilter {
            disease_name: self.disease_name,
            therapy_name: self.therapy_name,
            molecular_profile_name: self.molecular_profile_name,
            phenotype_name: self.phenotype_name,
            evidence_type,
            evidence_direction,
            strong_only: self.filter_strong_evidence,
        }
        .normalized())
    }
}

#[async_trait::async_trait]
impl Tool for SearchClinicalEvidenceTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: SEARCH_TOOL_NAME.to_string(),
            description: SEARCH_TOOL_DESCRIPTION.to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "disease_name": json_schema_string(
                        "Name of the disease to filter evidence by (e.g., 'Von Hippel-Lindau Disease', \
                         'Lung Non-small Cell Carcinoma', 'Colorectal Cancer', 'Chronic Myeloid Leukemia', \
                         'Glioblastoma'..). Case-insensitive and optional."
                    ),
                    "therapy_name": json_schema_string(
                        "Therapy or drug name involved in the evidence (e.g., 'Cetuximab', 'Imatinib', \
                         'trastuzumab', 'Lapatinib'..). Optional."
                    ),
                    "molecular_profile_name": json_schema_string(
                        "Molecular profile or gene name or variant name (e.g., 'EGFR L858R', 'BRAF V600E', \
                         'KRAS', 'PIK3CA'..). Optional."
                    ),
                    "phenotype_name": json_schema_string(
                        "Name of the phenotype or histological subtype (e.g., 'Hemangioblastoma', \
                         'Renal cell carcinoma', 'Retinal capillary hemangioma', 'Pancreatic cysts', \
                         'Childhood onset'..). Optional."
                    ),
                    "evidence_type": json_schema_string(
                        "Evidence classification: 'PREDICTIVE', 'DIAGNOSTIC', 'PROGNOSTIC', \
                         'PREDISPOSING', or 'FUNCTIONAL'. Optional."
                    ),
                    "evidence_direction": json_schema_string(
                        "Direction of the evidence: 'SUPPORTS' or 'DOES_NOT_SUPPORT'. Indicates if the \
                         evidence favors the association."
                    ),
                    "filter_strong_evidence": json_schema_boolean(
                        "If set to true, only evidence with a rating above 3 will be included, indicating \
                         high-confidence evidence. However, the number of returned evidence items may be \
                         quite low."
                    ),
                }),
                vec![],
            ),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        // A null/absent arguments object means "no filters".
        let args: SearchArgs = if arguments.is_null() {
            SearchArgs::default()
        } else {
            serde_json::from_value(arguments)
                .context("Invalid arguments for search_clinical_evidence")?
        };

        let filter = match args.into_filter() {
            Ok(filter) => filter,
            Err(message) => return Ok(CallToolResult::error(message)),
        };

        let items = match self.client.search_evidence(&filter).await {
            Ok(items) => items,
            Err(e) => {
                return Ok(CallToolResult::error(format!(
                    "Evidence search failed: {e}"
                )))
            }
        };

        info!(matches = items.len(), "evidence search completed");

        let builder = ReportBuilder::new(&items);
        let sources = if items.is_empty() {
            Vec::new()
        } else {
            // Citations only cover the entries the report actually lists.
            match self.client.get_sources(&builder.top_ids()).await {
                Ok(sources) => sources,
                Err(e) => {
                    return Ok(CallToolResult::error(format!(
                        "Source lookup failed: {e}"
                    )))
                }
            }
        };

        Ok(CallToolResult::text(
            builder.with_sources(sources).render(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexonco_core::{EvidenceDirection, EvidenceType};

    #[test]
    fn test_args_empty_strings_become_none() {
        let args: SearchArgs = serde_json::from_value(serde_json::json!({
            "disease_name": "",
            "therapy_name": "Imatinib",
            "evidence_type": "",
        }))
        .unwrap();
        let filter = args.into_filter().unwrap();

        assert!(filter.disease_name.is_none());
        assert_eq!(filter.therapy_name.as_deref(), Some("Imatinib"));
        assert!(filter.evidence_type.is_none());
        assert!(!filter.strong_only);
    }

    #[test]
    fn test_args_parse_enums_case_insensitively() {
        let args: SearchArgs = serde_json::from_value(serde_json::json!({
            "evidence_type": "predictive",
            "evidence_direction": "SUPPORTS",
            "filter_strong_evidence": true,
        }))
        .unwrap();
        let filter = args.into_filter().unwrap();

        assert_eq!(filter.evidence_type, Some(EvidenceType::Predictive));
        assert_eq!(filter.evidence_direction, Some(EvidenceDirection::Supports));
        assert!(filter.strong_only);
    }

    #[test]
    fn test_args_reject_unknown_evidence_type() {
        let args: SearchArgs = serde_json::from_value(serde_json::json!({
            "evidence_type": "ANECDOTAL",
        }))
        .unwrap();
        let err = args.into_filter().unwrap_err();
        assert!(err.contains("ANECDOTAL"));
    }

    #[test]
    fn test_schema_has_no_required_fields() {
        let client = Arc::new(CivicClient::new().unwrap());
        let tool = SearchClinicalEvidenceTool::new(client);
        let schema = tool.schema();

        assert_eq!(schema.name, SEARCH_TOOL_NAME);
        assert!(schema.input_schema["required"].as_array().unwrap().is_empty());
        assert_eq!(
            schema.input_schema["properties"]["filter_strong_evidence"]["type"],
            "boolean"
        );
    }
}
