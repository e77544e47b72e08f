//! Rendering of the human-readable evidence report returned by the
//! `search_clinical_evidence` tool: summary statistics, top-rated entries,
//! citations, and a research-use disclaimer.

use crate::evidence::{EvidenceItem, Source};
use std::collections::HashMap;

/// How many entries the "Top N" listing carries.
const TOP_ENTRIES: usize = 10;
/// How many values each frequency summary lists.
const TOP_FREQUENCIES: usize = 3;

const DISCLAIMER: &str = "\n**Disclaimer:** This tool is intended exclusively for research purposes. \
It is not a substitute for professional medical advice, diagnosis, or treatment.";

/// Builds the markdown evidence report.
pub struct ReportBuilder<'a> {
    items: &'a [EvidenceItem],
    sources: Vec<Source>,
}

impl<'a> ReportBuilder<'a> {
    pub fn new(items: &'a [EvidenceItem]) -> Self {
        Self {
            items,
            sources: Vec::new(),
        }
    }

    /// Attach literature sources for the citations section.
    pub fn with_sources(mut self, sources: Vec<Source>) -> Self {
        self.sources = sources;
        self
    }

    /// Ids of the top-rated entries, in report order. Callers use these to
    /// fetch citations before rendering.
    pub fn top_ids(&self) -> Vec<i64> {
        self.top_entries().iter().map(|item| item.id).collect()
    }

    fn top_entries(&self) -> Vec<&'a EvidenceItem> {
        let mut sorted: Vec<&EvidenceItem> = self.items.iter().collect();
        // Unrated items sort last.
        sorted.sort_by(|a, b| {
            b.evidence_rating
                .unwrap_or(0)
                .cmp(&a.evidence_rating.unwrap_or(0))
        });
        sorted.truncate(TOP_ENTRIES);
        sorted
    }

    /// Render the full report. An empty result set yields a fixed message.
    pub fn render(&self) -> String {
        if self.items.is_empty() {
            return "No evidence found for the specified filters.".to_string();
        }

        format!(
            "{}\n{}\n{}\n{}",
            self.stats_section(),
            self.evidence_section(),
            self.citation_section(),
            DISCLAIMER
        )
    }

    fn stats_section(&self) -> String {
        let total = self.items.len();
        let rated: Vec<f64> = self
            .items
            .iter()
            .filter_map(|i| i.evidence_rating.map(f64::from))
            .collect();
        let avg_rating = if rated.is_empty() {
            0.0
        } else {
            rated.iter().sum::<f64>() / rated.len() as f64
        };

        format!(
            "**Summary Statistics**\n\
             - Total Evidence Items: {total}\n\
             - Average Evidence Rating: {avg_rating:.2}\n\
             - Top Diseases: {}\n\
             - Top Genes: {}\n\
             - Top Variants: {}\n\
             - Top Therapies: {}\n\
             - Top Phenotypes: {}\n",
            format_top(self.items.iter().filter_map(|i| i.disease_name.as_deref())),
            format_top(self.items.iter().filter_map(|i| i.gene_name.as_deref())),
            format_top(self.items.iter().filter_map(|i| i.variant_name.as_deref())),
            format_top(self.items.iter().filter_map(|i| i.therapy_names.as_deref())),
            format_top(self.items.iter().filter_map(|i| i.phenotype_name.as_deref())),
        )
    }

    fn evidence_section(&self) -> String {
        let mut section = format!("**Top {TOP_ENTRIES} Evidence Entries**\n");
        for item in self.top_entries() {
            let evidence_type = item
                .evidence_type
                .map(|t| t.to_string())
                .unwrap_or_else(|| "N/A".to_string());
            let direction = item
                .evidence_direction
                .map(|d| d.to_string())
                .unwrap_or_else(|| "N/A".to_string());
            let rating = item
                .evidence_rating
                .map(|r| r.to_string())
                .unwrap_or_else(|| "N/A".to_string());

            section.push_str(&format!(
                "\n**{} ({})** | Rating: {}\n\
                 - Disease: {}\n\
                 - Phenotype: {}\n\
                 - Gene/Variant: {} / {}\n\
                 - Therapy: {}\n\
                 - Description: {}\n",
                evidence_type,
                direction,
                rating,
                or_na(&item.disease_name),
                or_na(&item.phenotype_name),
                or_na(&item.gene_name),
                or_na(&item.variant_name),
                or_na(&item.therapy_names),
                or_na(&item.description),
            ));
        }
        section
    }

    fn citation_section(&self) -> String {
        let mut section = "**Sources & Citations**\n".to_string();
        for source in &self.sources {
            section.push_str(&format!(
                "- {} - {}\n",
                source.citation.as_deref().unwrap_or("N/A"),
                source.source_url.as_deref().unwrap_or("N/A"),
            ));
        }
        section
    }
}

fn or_na(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("N/A")
}

/// Count occurrences and format the most common values as "name (count)".
fn format_top<'a>(values: impl Iterator<Item = &'a str>) -> String {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values {
        *counts.entry(value).or_default() += 1;
    }
    if counts.is_empty() {
        return "N/A".to_string();
    }

    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    // Ties break alphabetically so output is deterministic.
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked.truncate(TOP_FREQUENCIES);

    ranked
        .into_iter()
        .map(|(name, count)| format!("{name} ({count})"))
        .collect::<Vec<_>>()
        .join(", ")
}
