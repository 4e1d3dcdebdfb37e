//! Metadata aggregation and the final report.
//!
//! ```text
//! ClassRecord / ConversionRecord ──► MetadataAggregator ──► Report ──► metadata.json
//! ```
//!
//! Invariants after [`MetadataAggregator::finalize`]:
//! - category counts sum to `totalFiles`
//! - every class category is a key of `categorizedFiles`
//! - every conversion points at a recorded class

use crate::error::Result;
use crate::types::{Category, ClassRecord, ConversionRecord};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Accumulates records for one run.
#[derive(Debug, Default)]
pub struct MetadataAggregator {
    classes: Vec<ClassRecord>,
    class_index: HashSet<PathBuf>,
    conversions: Vec<ConversionRecord>,
}

impl MetadataAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the record for one discovered file.
    pub fn record(&mut self, class: ClassRecord) {
        self.class_index.insert(class.file_path.clone());
        self.classes.push(class);
    }

    /// Add a conversion. The original file must already be recorded.
    pub fn record_conversion(&mut self, conversion: ConversionRecord) {
        debug_assert!(
            self.class_index.contains(&conversion.original_file),
            "conversion of unrecorded file {}",
            conversion.original_file.display()
        );
        self.conversions.push(conversion);
    }

    /// Build the report. Nothing recorded is dropped.
    pub fn finalize(self, analysis_date: DateTime<Utc>) -> Report {
        let mut categorized_files = BTreeMap::new();
        for class in &self.classes {
            *categorized_files.entry(class.category).or_insert(0) += 1;
        }

        let mut summary = Summary::default();
        for class in &self.classes {
            let entry = SummaryEntry {
                class_name: class.class_name.clone(),
                methods: class.methods.len(),
            };
            match class.category {
                Category::Controller => summary.controllers.push(entry),
                Category::Service => summary.services.push(entry),
                Category::DataAccess => summary.daos.push(entry),
                Category::Entity
                | Category::Configuration
                | Category::Utility
                | Category::Other => {}
            }
        }

        Report {
            analysis: AnalysisSummary {
                total_files: self.classes.len(),
                categorized_files,
                analysis_date,
            },
            classes: self.classes,
            conversions: self.conversions,
            summary,
        }
    }
}

/// Terminal artifact of a run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub analysis: AnalysisSummary,
    pub classes: Vec<ClassRecord>,
    pub conversions: Vec<ConversionRecord>,
    pub summary: Summary,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    pub total_files: usize,
    /// Only categories with at least one file, in declaration order
    pub categorized_files: BTreeMap<Category, usize>,
    pub analysis_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Summary {
    pub controllers: Vec<SummaryEntry>,
    pub services: Vec<SummaryEntry>,
    pub daos: Vec<SummaryEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryEntry {
    pub class_name: String,
    pub methods: usize,
}

impl Report {
    /// Files counted under `category`.
    pub fn count(&self, category: Category) -> usize {
        self.analysis
            .categorized_files
            .get(&category)
            .copied()
            .unwrap_or(0)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report as pretty JSON.
    ///
    /// The text goes to a temp file in the same directory and is renamed
    /// into place, so readers never see a half-written report. The temp file
    /// is removed if anything fails.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }
}
