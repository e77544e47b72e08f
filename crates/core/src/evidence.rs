// Evidence data model for the CIViC clinical evidence database.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// CIViC evidence classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvidenceType {
    Predictive,
    Diagnostic,
    Prognostic,
    Predisposing,
    Functional,
}

impl FromStr for EvidenceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PREDICTIVE" => Ok(Self::Predictive),
            "DIAGNOSTIC" => Ok(Self::Diagnostic),
            "PROGNOSTIC" => Ok(Self::Prognostic),
            "PREDISPOSING" => Ok(Self::Predisposing),
            "FUNCTIONAL" => Ok(Self::Functional),
            other => Err(format!(
                "unknown evidence type '{}' (expected PREDICTIVE, DIAGNOSTIC, PROGNOSTIC, PREDISPOSING or FUNCTIONAL)",
                other
            )),
        }
    }
}

impl fmt::Display for EvidenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Predictive => "PREDICTIVE",
            Self::Diagnostic => "DIAGNOSTIC",
            Self::Prognostic => "PROGNOSTIC",
            Self::Predisposing => "PREDISPOSING",
            Self::Functional => "FUNCTIONAL",
        };
        f.write_str(s)
    }
}

/// Whether the evidence supports or refutes the association.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvidenceDirection {
    Supports,
    DoesNotSupport,
}

impl FromStr for EvidenceDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SUPPORTS" => Ok(Self::Supports),
            "DOES_NOT_SUPPORT" => Ok(Self::DoesNotSupport),
            other => Err(format!(
                "unknown evidence direction '{}' (expected SUPPORTS or DOES_NOT_SUPPORT)",
                other
            )),
        }
    }
}

impl fmt::Display for EvidenceDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Supports => "SUPPORTS",
            Self::DoesNotSupport => "DOES_NOT_SUPPORT",
        };
        f.write_str(s)
    }
}

/// A single evidence record, flattened from the CIViC GraphQL shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub id: i64,
    pub evidence_type: Option<EvidenceType>,
    pub evidence_direction: Option<EvidenceDirection>,
    /// Star rating 1..=5 assigned by CIViC curators. Absent for unrated items.
    pub evidence_rating: Option<u8>,
    pub description: Option<String>,
    pub disease_name: Option<String>,
    pub phenotype_name: Option<String>,
    pub gene_name: Option<String>,
    pub variant_name: Option<String>,
    /// Comma-joined therapy names as CIViC reports them per item.
    pub therapy_names: Option<String>,
}

/// Literature source backing one or more evidence items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub citation: Option<String>,
    #[serde(rename = "sourceUrl")]
    pub source_url: Option<String>,
}

/// Conjunctive search filter over evidence records. Every field is optional;
/// an absent field matches everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvidenceFilter {
    pub disease_name: Option<String>,
    pub therapy_name: Option<String>,
    pub molecular_profile_name: Option<String>,
    pub phenotype_name: Option<String>,
    pub evidence_type: Option<EvidenceType>,
    pub evidence_direction: Option<EvidenceDirection>,
    /// Keep only evidence rated above 3 stars.
    pub strong_only: bool,
}

impl EvidenceFilter {
    /// Normalize empty strings to None. MCP clients routinely send "" for
    /// arguments they mean to omit.
    pub fn normalized(mut self) -> Self {
        fn clean(field: &mut Option<String>) {
            if field.as_deref().is_some_and(|s| s.trim().is_empty()) {
                *field = None;
            }
        }
        clean(&mut self.disease_name);
        clean(&mut self.therapy_name);
        clean(&mut self.molecular_profile_name);
        clean(&mut self.phenotype_name);
        self
    }

    /// Apply the rating cutoff locally. Name/type filters are pushed down to
    /// the GraphQL query; the rating cutoff is not expressible there.
    pub fn retain_strong(&self, items: &mut Vec<EvidenceItem>) {
        if self.strong_only {
            items.retain(|item| item.evidence_rating.is_some_and(|r| r > 3));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item_with_rating(rating: Option<u8>) -> EvidenceItem {
        EvidenceItem {
            id: 1,
            evidence_type: Some(EvidenceType::Predictive),
            evidence_direction: Some(EvidenceDirection::Supports),
            evidence_rating: rating,
            description: None,
            disease_name: None,
            phenotype_name: None,
            gene_name: None,
            variant_name: None,
            therapy_names: None,
        }
    }

    #[test]
    fn test_evidence_type_parsing() {
        assert_eq!(
            "predictive".parse::<EvidenceType>().unwrap(),
            EvidenceType::Predictive
        );
        assert_eq!(
            "DIAGNOSTIC".parse::<EvidenceType>().unwrap(),
            EvidenceType::Diagnostic
        );
        assert!("predictivee".parse::<EvidenceType>().is_err());
    }

    #[test]
    fn test_evidence_direction_parsing() {
        assert_eq!(
            "supports".parse::<EvidenceDirection>().unwrap(),
            EvidenceDirection::Supports
        );
        assert_eq!(
            "does_not_support".parse::<EvidenceDirection>().unwrap(),
            EvidenceDirection::DoesNotSupport
        );
        assert!("maybe".parse::<EvidenceDirection>().is_err());
    }

    #[test]
    fn test_serde_screaming_snake_case() {
        let json = serde_json::to_string(&EvidenceType::Predisposing).unwrap();
        assert_eq!(json, "\"PREDISPOSING\"");
        let json = serde_json::to_string(&EvidenceDirection::DoesNotSupport).unwrap();
        assert_eq!(json, "\"DOES_NOT_SUPPORT\"");
    }

    #[test]
    fn test_filter_normalizes_empty_strings() {
        let filter = EvidenceFilter {
            disease_name: Some("".to_string()),
            therapy_name: Some("  ".to_string()),
            molecular_profile_name: Some("EGFR L858R".to_string()),
            ..Default::default()
        }
        .normalized();

        assert!(filter.disease_name.is_none());
        assert!(filter.therapy_name.is_none());
        assert_eq!(filter.molecular_profile_name.as_deref(), Some("EGFR L858R"));
    }

    #[test]
    fn test_retain_strong_keeps_ratings_above_three() {
        let filter = EvidenceFilter {
            strong_only: true,
            ..Default::default()
        };

        let mut items = vec![
            item_with_rating(Some(5)),
            item_with_rating(Some(3)),
            item_with_rating(Some(4)),
            item_with_rating(None),
        ];
        filter.retain_strong(&mut items);

        let ratings: Vec<_> = items.iter().map(|i| i.evidence_rating).collect();
        assert_eq!(ratings, vec![Some(5), Some(4)]);
    }

    #[test]
    fn test_retain_strong_noop_when_disabled() {
        let filter = EvidenceFilter::default();
        let mut items = vec![item_with_rating(Some(1)), item_with_rating(None)];
        filter.retain_strong(&mut items);
        assert_eq!(items.len(), 2);
    }
}
