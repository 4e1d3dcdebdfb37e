//! # springshift-core
//!
//! Core library for springshift - a batch tool that sorts a Java/Spring
//! codebase into architectural roles and has an LLM describe every class and
//! convert one representative per role.
//!
//! This library provides:
//! - Source tree discovery and role categorization
//! - LLM-backed class analysis and conversion with deterministic fallbacks
//! - Metadata aggregation into a JSON report
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Flow
//!
//! - **Discover:** walk the root for `.java` files
//! - **Categorize + analyze:** one LLM call per file, in walk order
//! - **Convert:** first controller, service and data-access file only
//! - **Report:** `output/metadata.json`
//!
//! ## Example
//!
//! ```rust,no_run
//! use springshift_core::{llm, Config, Pipeline};
//!
//! let config = Config::load().expect("failed to load config");
//! let client = llm::create_client(config.require_llm().unwrap()).expect("no LLM client");
//!
//! let mut pipeline = Pipeline::new("./java-codebase", config.pipeline, client);
//! let report = pipeline.run().expect("run failed");
//! println!("{} files", report.analysis.total_files);
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use error::{Error, Result};
pub use pipeline::{Pipeline, PipelineEvent, PipelineStage};
pub use report::{MetadataAggregator, Report};
pub use types::*;

// Public modules
pub mod analysis;
pub mod categorize;
pub mod config;
pub mod conversion;
pub mod discover;
pub mod error;
pub mod llm;
pub mod logging;
pub mod pipeline;
pub mod report;
pub mod types;
