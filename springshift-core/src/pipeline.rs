//! Run orchestration.
//!
//! ## Stages
//!
//! ```text
//! Idle ─► Discovering ─► ProcessingFiles ─► SelectingRepresentatives ─► Converting ─► Reporting ─► Done
//!   │          │                                                                   │
//!   └──────────┴───────────────────────────────────────────────────────────────────┴─► Failed
//! ```
//!
//! Only discovery and the final report write can fail the run. In between,
//! every problem is absorbed per file: an unreadable file or a failed LLM
//! call produces a degraded record or placeholder and the loop moves on.
//! Files are processed one at a time in walk order.

use crate::analysis::ClassAnalyzer;
use crate::categorize::categorize_under;
use crate::config::PipelineConfig;
use crate::conversion::{ArtifactNamer, Converter};
use crate::discover::{DiscoveryOptions, SourceWalker};
use crate::error::Result;
use crate::llm::LlmClient;
use crate::report::{MetadataAggregator, Report};
use crate::types::{Category, ClassRecord, ConversionRecord, SourceFile};
use chrono::Utc;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Idle,
    Discovering,
    ProcessingFiles,
    SelectingRepresentatives,
    Converting,
    Reporting,
    Done,
    Failed,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Idle => "idle",
            PipelineStage::Discovering => "discovering",
            PipelineStage::ProcessingFiles => "processing_files",
            PipelineStage::SelectingRepresentatives => "selecting_representatives",
            PipelineStage::Converting => "converting",
            PipelineStage::Reporting => "reporting",
            PipelineStage::Done => "done",
            PipelineStage::Failed => "failed",
        }
    }
}

/// Progress notifications for callers that want to display them.
#[derive(Debug, Clone)]
pub enum PipelineEvent<'a> {
    /// Discovery finished with this many files
    Discovered { total: usize },
    /// About to analyze file `index` of `total`
    Analyzing {
        index: usize,
        total: usize,
        path: &'a Path,
    },
    /// Finished analyzing a file
    Analyzed { record: &'a ClassRecord },
    /// About to convert a representative
    Converting {
        category: Category,
        class_name: &'a str,
    },
    /// No file of this convertible category was found
    NoRepresentative { category: Category },
    /// An artifact was written
    Converted {
        record: &'a ConversionRecord,
        placeholder: bool,
    },
}

/// First file seen for a convertible category.
#[derive(Debug)]
struct Candidate {
    source: SourceFile,
    record: ClassRecord,
}

/// Result of a dry run: discovered files grouped by category.
#[derive(Debug, Default)]
pub struct Survey {
    pub files: BTreeMap<Category, Vec<PathBuf>>,
    pub unreadable: Vec<PathBuf>,
}

impl Survey {
    pub fn total(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }
}

/// Drives one run over a source tree.
pub struct Pipeline {
    root: PathBuf,
    config: PipelineConfig,
    client: Box<dyn LlmClient>,
    stage: PipelineStage,
}

impl Pipeline {
    /// Create a pipeline. The client is the only way out to the LLM.
    pub fn new(
        root: impl Into<PathBuf>,
        config: PipelineConfig,
        client: Box<dyn LlmClient>,
    ) -> Self {
        Self {
            root: root.into(),
            config,
            client,
            stage: PipelineStage::Idle,
        }
    }

    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn transition(&mut self, next: PipelineStage) {
        tracing::info!(from = self.stage.as_str(), to = next.as_str(), "Pipeline stage");
        self.stage = next;
    }

    /// Run every stage and return the report that was written.
    pub fn run(&mut self) -> Result<Report> {
        self.run_with_progress(|_| {})
    }

    /// Run every stage, calling `on_event` as work progresses.
    pub fn run_with_progress<F>(&mut self, mut on_event: F) -> Result<Report>
    where
        F: FnMut(PipelineEvent<'_>),
    {
        let span = tracing::info_span!("pipeline", root = %self.root.display());
        let _entered = span.enter();

        let files = match self.discover() {
            Ok(files) => files,
            Err(e) => {
                tracing::error!(root = %self.root.display(), error = %e, "Discovery failed");
                self.transition(PipelineStage::Failed);
                return Err(e);
            }
        };
        on_event(PipelineEvent::Discovered { total: files.len() });

        self.transition(PipelineStage::ProcessingFiles);
        let mut aggregator = MetadataAggregator::new();
        let mut candidates: BTreeMap<Category, Candidate> = BTreeMap::new();
        {
            let analyzer = ClassAnalyzer::new(self.client.as_ref(), self.config.max_source_chars);
            let total = files.len();

            for (index, path) in files.iter().enumerate() {
                on_event(PipelineEvent::Analyzing {
                    index,
                    total,
                    path: path.as_path(),
                });

                let record = match SourceFile::read(path) {
                    Ok(source) => {
                        let category = categorize_under(&self.root, &source.path, &source.content);
                        tracing::debug!(path = %path.display(), category = %category, "Categorized file");
                        let record = analyzer.analyze(&source, category);
                        if category.is_convertible() && !candidates.contains_key(&category) {
                            candidates.insert(
                                category,
                                Candidate {
                                    source,
                                    record: record.clone(),
                                },
                            );
                        }
                        record
                    }
                    Err(e) => {
                        // Counted anyway so totals reflect what was discovered
                        tracing::warn!(path = %path.display(), error = %e, "Failed to read source file");
                        ClassRecord::degraded(path, categorize_under(&self.root, path, ""))
                    }
                };

                on_event(PipelineEvent::Analyzed { record: &record });
                aggregator.record(record);
            }
        }

        self.transition(PipelineStage::SelectingRepresentatives);
        let mut selected = Vec::new();
        for category in Category::CONVERTIBLE {
            match candidates.remove(&category) {
                Some(candidate) => selected.push((category, candidate)),
                None => {
                    tracing::warn!(category = %category, "No files found for conversion");
                    on_event(PipelineEvent::NoRepresentative { category });
                }
            }
        }

        self.transition(PipelineStage::Converting);
        {
            let converter = Converter::new(self.client.as_ref(), self.config.max_source_chars);
            let mut names = ArtifactNamer::new(
                &self.config.output_dir,
                &self.config.target_extension,
                &self.config.report_file,
            );
            for (category, candidate) in selected {
                let class_name = candidate.record.class_name.as_str();
                on_event(PipelineEvent::Converting {
                    category,
                    class_name,
                });
                tracing::info!(category = %category, class = %class_name, "Converting representative");

                let outcome = converter.convert(&candidate.source, &candidate.record, category);
                let target = names.next(class_name, category);

                if let Err(e) = std::fs::write(&target, outcome.text()) {
                    tracing::error!(path = %target.display(), error = %e, "Failed to write artifact");
                    continue;
                }

                let conversion = ConversionRecord {
                    original_file: candidate.source.path.clone(),
                    converted_file: target,
                    category,
                    class_name: class_name.to_string(),
                };
                tracing::info!(
                    category = %category,
                    path = %conversion.converted_file.display(),
                    placeholder = outcome.is_placeholder(),
                    "Saved converted artifact"
                );
                on_event(PipelineEvent::Converted {
                    record: &conversion,
                    placeholder: outcome.is_placeholder(),
                });
                aggregator.record_conversion(conversion);
            }
        }

        self.transition(PipelineStage::Reporting);
        let report = aggregator.finalize(Utc::now());
        let report_path = self.config.report_path();
        if let Err(e) = report.write_to(&report_path) {
            tracing::error!(path = %report_path.display(), error = %e, "Failed to write report");
            self.transition(PipelineStage::Failed);
            return Err(e);
        }
        tracing::info!(
            path = %report_path.display(),
            total_files = report.analysis.total_files,
            conversions = report.conversions.len(),
            "Saved report"
        );

        self.transition(PipelineStage::Done);
        Ok(report)
    }

    /// Idle → Discovering: open the walk, make sure the output directory
    /// exists, and collect the file list.
    fn discover(&mut self) -> Result<Vec<PathBuf>> {
        self.transition(PipelineStage::Discovering);
        self.config.validate()?;

        let mut walker = SourceWalker::new(&self.root, &DiscoveryOptions::from(&self.config))?;
        std::fs::create_dir_all(&self.config.output_dir)?;

        let files: Vec<PathBuf> = walker.by_ref().collect();
        for warning in walker.warnings() {
            tracing::warn!(warning = %warning, "Skipped during discovery");
        }
        tracing::info!(root = %self.root.display(), count = files.len(), "Discovered source files");
        Ok(files)
    }
}

/// Discover and categorize without calling the LLM or writing anything.
pub fn survey(root: &Path, config: &PipelineConfig) -> Result<Survey> {
    let walker = SourceWalker::new(root, &DiscoveryOptions::from(config))?;
    let mut survey = Survey::default();

    for path in walker {
        match SourceFile::read(&path) {
            Ok(source) => {
                let category = categorize_under(root, &source.path, &source.content);
                survey.files.entry(category).or_default().push(path);
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read source file");
                let category = categorize_under(root, &path, "");
                survey.files.entry(category).or_default().push(path.clone());
                survey.unreadable.push(path);
            }
        }
    }

    Ok(survey)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::fs;
    use tempfile::TempDir;

    struct EchoClient;

    impl LlmClient for EchoClient {
        fn complete(&self, system: &str, _prompt: &str) -> Result<String> {
            if system.contains("analyzer") {
                Ok(r#"{"className": "Echo", "complexityLevel": "low"}"#.to_string())
            } else {
                Ok("// converted".to_string())
            }
        }
    }

    struct DownClient;

    impl LlmClient for DownClient {
        fn complete(&self, _system: &str, _prompt: &str) -> Result<String> {
            Err(Error::Llm("service unavailable".to_string()))
        }
    }

    fn config(output: &Path) -> PipelineConfig {
        PipelineConfig {
            output_dir: output.to_path_buf(),
            ..Default::default()
        }
    }

    #[test]
    fn missing_root_fails_in_discovery() {
        let dir = TempDir::new().unwrap();
        let mut pipeline = Pipeline::new(
            dir.path().join("absent"),
            config(&dir.path().join("out")),
            Box::new(EchoClient),
        );

        assert_eq!(pipeline.stage(), PipelineStage::Idle);
        let err = pipeline.run().unwrap_err();
        assert!(matches!(err, Error::Discovery { .. }));
        assert_eq!(pipeline.stage(), PipelineStage::Failed);
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn empty_tree_completes_with_empty_report() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(&src).unwrap();
        let out = dir.path().join("out");

        let mut pipeline = Pipeline::new(&src, config(&out), Box::new(EchoClient));
        let report = pipeline.run().unwrap();

        assert_eq!(pipeline.stage(), PipelineStage::Done);
        assert_eq!(report.analysis.total_files, 0);
        assert!(report.conversions.is_empty());
        assert!(out.join("metadata.json").exists());
    }

    #[test]
    fn unavailable_llm_still_produces_report_and_placeholders() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(src.join("web")).unwrap();
        fs::write(src.join("web/FooController.java"), "class FooController {}").unwrap();
        let out = dir.path().join("out");

        let mut pipeline = Pipeline::new(&src, config(&out), Box::new(DownClient));
        let report = pipeline.run().unwrap();

        assert_eq!(report.analysis.total_files, 1);
        assert!(report.classes[0].is_degraded());
        assert_eq!(report.conversions.len(), 1);
        let artifact = fs::read_to_string(out.join("foocontroller.js")).unwrap();
        assert!(artifact.starts_with("// Conversion failed for FooController"));
    }

    #[test]
    fn events_report_missing_representatives() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("Plain.java"), "class Plain {}").unwrap();

        let mut missing = Vec::new();
        let mut analyzed = 0;
        Pipeline::new(&src, config(&dir.path().join("out")), Box::new(EchoClient))
            .run_with_progress(|event| match event {
                PipelineEvent::NoRepresentative { category } => missing.push(category),
                PipelineEvent::Analyzed { .. } => analyzed += 1,
                _ => {}
            })
            .unwrap();

        assert_eq!(analyzed, 1);
        assert_eq!(missing, Category::CONVERTIBLE.to_vec());
    }

    #[test]
    fn report_write_failure_fails_the_run() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("Plain.java"), "class Plain {}").unwrap();
        let out = dir.path().join("out");
        // a directory where the report file should go
        fs::create_dir_all(out.join("metadata.json")).unwrap();

        let mut pipeline = Pipeline::new(&src, config(&out), Box::new(EchoClient));
        let err = pipeline.run().unwrap_err();

        assert!(matches!(err, Error::Io(_)));
        assert_eq!(pipeline.stage(), PipelineStage::Failed);
        assert!(out.join("metadata.json").is_dir());
    }

    #[test]
    fn survey_ignores_keywords_in_root_name() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("billing-service");
        fs::create_dir_all(src.join("app")).unwrap();
        fs::write(src.join("app/Main.java"), "class Main {}").unwrap();
        fs::write(src.join("app/Web.java"), "@RestController class Web {}").unwrap();

        let found = survey(&src, &config(&dir.path().join("out"))).unwrap();

        assert_eq!(found.files.get(&Category::Service), None);
        assert_eq!(found.files[&Category::Controller].len(), 1);
        assert_eq!(found.files[&Category::Other].len(), 1);
    }

    #[test]
    fn survey_groups_without_llm_calls() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("A.java"), "@Service class A {}").unwrap();
        fs::write(src.join("B.java"), "class B {}").unwrap();

        let found = survey(&src, &config(&dir.path().join("out"))).unwrap();

        assert_eq!(found.total(), 2);
        assert_eq!(found.files[&Category::Service].len(), 1);
        assert_eq!(found.files[&Category::Other].len(), 1);
        assert!(!dir.path().join("out").exists());
    }
}
