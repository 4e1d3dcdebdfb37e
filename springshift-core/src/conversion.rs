//! Conversion of representative classes.
//!
//! The reply is written verbatim. When the LLM cannot be reached, a commented
//! placeholder takes its place at the same path, so every attempted slot ends
//! up with a file.

use crate::llm::{truncate_chars, LlmClient};
use crate::types::{Category, ClassRecord, SourceFile};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

const SYSTEM_PROMPT: &str = "You are an expert in converting Java Spring Boot applications to Node.js Express applications. Provide complete, working code with proper error handling and documentation.";

/// Instruction set used for a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionTemplate {
    Controller,
    Service,
    DataAccess,
}

impl ConversionTemplate {
    /// Template for a category; categories without their own template use
    /// the service one.
    pub fn for_category(category: Category) -> Self {
        match category {
            Category::Controller => ConversionTemplate::Controller,
            Category::DataAccess => ConversionTemplate::DataAccess,
            Category::Service
            | Category::Entity
            | Category::Configuration
            | Category::Utility
            | Category::Other => ConversionTemplate::Service,
        }
    }

    fn preamble(&self) -> &'static str {
        match self {
            ConversionTemplate::Controller => {
                "Convert this Java Spring Boot Controller to a Node.js Express.js controller."
            }
            ConversionTemplate::Service => {
                "Convert this Java Spring Boot Service class to a Node.js service module."
            }
            ConversionTemplate::DataAccess => {
                "Convert this Java Spring Boot Repository/DAO to a Node.js data access module."
            }
        }
    }

    fn requirements(&self) -> &'static [&'static str] {
        match self {
            ConversionTemplate::Controller => &[
                "Use Express.js router patterns",
                "Convert @RequestMapping/@GetMapping/@PostMapping to Express routes",
                "Handle request/response objects properly",
                "Include proper error handling and validation",
                "Add JSDoc comments for all functions",
                "Use async/await for database operations",
                "Follow RESTful conventions",
                "Include proper HTTP status codes",
            ],
            ConversionTemplate::Service => &[
                "Create a service module with exported functions",
                "Convert business logic to async/await patterns",
                "Include proper error handling and logging",
                "Add JSDoc comments",
                "Handle data validation",
                "Use modern JavaScript patterns",
                "Include proper module exports",
            ],
            ConversionTemplate::DataAccess => &[
                "Create database access functions using a connection library",
                "Convert JPA methods to SQL queries or ORM calls",
                "Include proper error handling",
                "Add JSDoc comments",
                "Use async/await patterns",
                "Include connection management",
                "Add query validation",
            ],
        }
    }

    /// Render the full user prompt.
    pub fn render(&self, source: &str, record: &ClassRecord) -> String {
        let class_info =
            serde_json::to_string_pretty(record).unwrap_or_else(|_| record.class_name.clone());
        let requirements = self
            .requirements()
            .iter()
            .map(|r| format!("- {r}"))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "{}\n\nJava code:\n```java\n{}\n```\n\nClass info: {}\n\nRequirements:\n{}\n\nReturn complete, production-ready Node.js code.",
            self.preamble(),
            source,
            class_info,
            requirements
        )
    }
}

/// What a conversion produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutcome {
    /// LLM reply, unvalidated
    Converted(String),
    /// Commented stand-in naming the class and the error
    Placeholder(String),
}

impl ConversionOutcome {
    pub fn text(&self) -> &str {
        match self {
            ConversionOutcome::Converted(text) | ConversionOutcome::Placeholder(text) => text,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, ConversionOutcome::Placeholder(_))
    }
}

/// Placeholder text for a failed conversion.
pub fn placeholder(class_name: &str, error: &str) -> String {
    format!("// Conversion failed for {class_name}\n// Error: {error}")
}

/// File-name stem for a class: lower-cased, anything outside `[a-z0-9_-]`
/// dropped.
fn artifact_stem(class_name: &str) -> String {
    let stem: String = class_name
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    if stem.is_empty() {
        "converted".to_string()
    } else {
        stem
    }
}

/// Hands out artifact paths that are unique within one run.
///
/// `<class>.<ext>` is used while it is free. A clash with an earlier
/// artifact or with the reserved report name falls back to
/// `<class>.<category>.<ext>`, then to numbered variants of that.
#[derive(Debug)]
pub struct ArtifactNamer {
    output_dir: PathBuf,
    extension: String,
    taken: HashSet<String>,
}

impl ArtifactNamer {
    /// `reserved` is a file name in `output_dir` that must never be used,
    /// normally the report file.
    pub fn new(output_dir: &Path, extension: &str, reserved: &str) -> Self {
        let mut taken = HashSet::new();
        taken.insert(reserved.to_lowercase());
        Self {
            output_dir: output_dir.to_path_buf(),
            extension: extension.to_string(),
            taken,
        }
    }

    /// Path for the next artifact. Never returns the same path twice.
    pub fn next(&mut self, class_name: &str, category: Category) -> PathBuf {
        let stem = artifact_stem(class_name);
        let ext = &self.extension;

        let mut file_name = format!("{stem}.{ext}");
        if self.is_taken(&file_name) {
            file_name = format!("{stem}.{category}.{ext}");
        }
        let mut n = 2;
        while self.is_taken(&file_name) {
            file_name = format!("{stem}.{category}-{n}.{ext}");
            n += 1;
        }

        self.taken.insert(file_name.to_lowercase());
        self.output_dir.join(file_name)
    }

    // Case-insensitive so clashes hold on case-folding filesystems too
    fn is_taken(&self, file_name: &str) -> bool {
        self.taken.contains(&file_name.to_lowercase())
    }
}

/// Converts representative files through the LLM.
pub struct Converter<'a> {
    client: &'a dyn LlmClient,
    max_source_chars: usize,
}

impl<'a> Converter<'a> {
    pub fn new(client: &'a dyn LlmClient, max_source_chars: usize) -> Self {
        Self {
            client,
            max_source_chars,
        }
    }

    /// Convert one file. Exactly one LLM call; failures become a placeholder.
    pub fn convert(
        &self,
        file: &SourceFile,
        record: &ClassRecord,
        category: Category,
    ) -> ConversionOutcome {
        let template = ConversionTemplate::for_category(category);
        let source = truncate_chars(&file.content, self.max_source_chars);
        let prompt = template.render(&source, record);

        match self.client.complete(SYSTEM_PROMPT, &prompt) {
            Ok(text) => ConversionOutcome::Converted(text),
            Err(e) => {
                tracing::error!(
                    class = %record.class_name,
                    category = %category,
                    error = %e,
                    "Conversion request failed"
                );
                ConversionOutcome::Placeholder(placeholder(&record.class_name, &e.to_string()))
            }
        }
    }
}
