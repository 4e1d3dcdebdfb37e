//! Core domain types for springshift
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **SourceFile** | One file picked up by the walker, read once per run |
//! | **Category** | The architectural role a file plays (controller, service, ...) |
//! | **ClassRecord** | What the analyzer learned about a file |
//! | **Representative** | The first file of a convertible category; the only one converted |
//! | **Degraded record** | The fixed stand-in recorded when analysis fails |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Description written into degraded records.
pub const ANALYSIS_FAILED: &str = "Analysis failed";

// ============================================
// Source Files
// ============================================

/// A discovered file and its text.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Path as produced by the walker
    pub path: PathBuf,
    /// File text; invalid UTF-8 is replaced
    pub content: String,
    /// Extension without the dot (empty if none)
    pub extension: String,
}

impl SourceFile {
    /// Read a file from disk.
    pub fn read(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        Ok(Self::from_parts(
            path.to_path_buf(),
            String::from_utf8_lossy(&bytes).into_owned(),
        ))
    }

    pub fn from_parts(path: PathBuf, content: String) -> Self {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            path,
            content,
            extension,
        }
    }

    /// File name with the extension stripped, used as a fallback class name.
    pub fn stem(&self) -> String {
        file_stem(&self.path)
    }
}

pub(crate) fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ============================================
// Category
// ============================================

/// Architectural role of a source file.
///
/// Declaration order matters: it is the precedence order of the path
/// keyword table and the ordering of report maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Controller,
    Service,
    DataAccess,
    Entity,
    Configuration,
    Utility,
    Other,
}

impl Category {
    /// Every category, in declaration order.
    pub const ALL: [Category; 7] = [
        Category::Controller,
        Category::Service,
        Category::DataAccess,
        Category::Entity,
        Category::Configuration,
        Category::Utility,
        Category::Other,
    ];

    /// Categories that get a representative converted, in conversion order.
    pub const CONVERTIBLE: [Category; 3] =
        [Category::Controller, Category::Service, Category::DataAccess];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Controller => "controller",
            Category::Service => "service",
            Category::DataAccess => "data-access",
            Category::Entity => "entity",
            Category::Configuration => "configuration",
            Category::Utility => "utility",
            Category::Other => "other",
        }
    }

    pub fn is_convertible(&self) -> bool {
        match self {
            Category::Controller | Category::Service | Category::DataAccess => true,
            Category::Entity | Category::Configuration | Category::Utility | Category::Other => {
                false
            }
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown category: {}", s))
    }
}

// ============================================
// Analysis records
// ============================================

/// Coarse complexity tier reported by the analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum ComplexityLevel {
    Low,
    Medium,
    High,
    /// Only produced by degraded records
    Unknown,
}

impl ComplexityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplexityLevel::Low => "low",
            ComplexityLevel::Medium => "medium",
            ComplexityLevel::High => "high",
            ComplexityLevel::Unknown => "unknown",
        }
    }
}

impl TryFrom<String> for ComplexityLevel {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(ComplexityLevel::Low),
            "medium" => Ok(ComplexityLevel::Medium),
            "high" => Ok(ComplexityLevel::High),
            "unknown" => Ok(ComplexityLevel::Unknown),
            other => Err(format!("unknown complexity level: {}", other)),
        }
    }
}

/// One method of an analyzed class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodRecord {
    pub name: String,
    #[serde(default)]
    pub signature: String,
    #[serde(default)]
    pub return_type: String,
    #[serde(default)]
    pub parameters: Vec<String>,
    #[serde(default)]
    pub description: String,
}

/// Structured metadata for one source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassRecord {
    pub file_path: PathBuf,
    pub class_name: String,
    pub description: String,
    pub methods: Vec<MethodRecord>,
    pub complexity_level: ComplexityLevel,
    pub internal_dependencies: Vec<String>,
    pub annotations: Vec<String>,
    pub category: Category,
}

impl ClassRecord {
    /// The stand-in recorded when analysis is impossible or its reply unusable.
    pub fn degraded(path: &Path, category: Category) -> Self {
        Self {
            file_path: path.to_path_buf(),
            class_name: file_stem(path),
            description: ANALYSIS_FAILED.to_string(),
            methods: vec![],
            complexity_level: ComplexityLevel::Unknown,
            internal_dependencies: vec![],
            annotations: vec![],
            category,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.complexity_level == ComplexityLevel::Unknown && self.description == ANALYSIS_FAILED
    }
}

// ============================================
// Conversions
// ============================================

/// A representative file that was turned into an artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionRecord {
    pub original_file: PathBuf,
    pub converted_file: PathBuf,
    #[serde(rename = "type")]
    pub category: Category,
    pub class_name: String,
}
