//! Per-file analysis through the LLM.
//!
//! [`ClassAnalyzer::analyze`] never fails: a transport error or an unusable
//! reply both yield [`ClassRecord::degraded`]. Each file gets exactly one call.

use crate::llm::{extract_json_object, truncate_chars, LlmClient};
use crate::types::{Category, ClassRecord, ComplexityLevel, MethodRecord, SourceFile};
use crate::{Error, Result};
use serde::Deserialize;

const SYSTEM_PROMPT: &str = "You are a Java code analyzer. Analyze the provided Java class and return structured JSON data.";

/// Shape the analyzer asks the LLM for.
///
/// `className` and `complexityLevel` are required; list fields may be omitted.
/// A `category` field in the reply is ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalysisReply {
    class_name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    methods: Vec<MethodRecord>,
    complexity_level: ComplexityLevel,
    #[serde(default)]
    internal_dependencies: Vec<String>,
    #[serde(default)]
    annotations: Vec<String>,
}

/// Turns source files into [`ClassRecord`]s.
pub struct ClassAnalyzer<'a> {
    client: &'a dyn LlmClient,
    max_source_chars: usize,
}

impl<'a> ClassAnalyzer<'a> {
    pub fn new(client: &'a dyn LlmClient, max_source_chars: usize) -> Self {
        Self {
            client,
            max_source_chars,
        }
    }

    /// Analyze one file. `category` is the categorizer's verdict and always
    /// ends up on the record.
    pub fn analyze(&self, file: &SourceFile, category: Category) -> ClassRecord {
        let prompt = self.build_prompt(file, category);

        let raw = match self.client.complete(SYSTEM_PROMPT, &prompt) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!(path = %file.path.display(), error = %e, "Analysis request failed");
                return ClassRecord::degraded(&file.path, category);
            }
        };

        match parse_reply(&raw) {
            Ok(reply) => {
                tracing::info!(
                    path = %file.path.display(),
                    class = %reply.class_name,
                    methods = reply.methods.len(),
                    "Analyzed class"
                );
                ClassRecord {
                    file_path: file.path.clone(),
                    class_name: reply.class_name,
                    description: reply.description,
                    methods: reply.methods,
                    complexity_level: reply.complexity_level,
                    internal_dependencies: reply.internal_dependencies,
                    annotations: reply.annotations,
                    category,
                }
            }
            Err(e) => {
                tracing::warn!(path = %file.path.display(), error = %e, "Discarding malformed analysis");
                ClassRecord::degraded(&file.path, category)
            }
        }
    }

    fn build_prompt(&self, file: &SourceFile, category: Category) -> String {
        let source = truncate_chars(&file.content, self.max_source_chars);
        format!(
            r#"Analyze this Java class and extract the following information in JSON format:

```java
{source}
```

The file looks like a {category} based on its path and annotations.

Please provide:
{{
  "className": "string",
  "description": "string - brief description of what this class does",
  "methods": [
    {{
      "name": "string",
      "signature": "string - full method signature",
      "description": "string - what this method does",
      "returnType": "string",
      "parameters": ["string array of parameter types"]
    }}
  ],
  "complexityLevel": "string - low/medium/high based on logic complexity",
  "internalDependencies": ["array of other classes this depends on"],
  "annotations": ["array of Spring/Java annotations used"]
}}

Focus on Spring Boot patterns, REST endpoints, database operations, and business logic.
Return only JSON."#
        )
    }
}

fn parse_reply(raw: &str) -> Result<AnalysisReply> {
    let reply: AnalysisReply = match serde_json::from_str(raw) {
        Ok(reply) => reply,
        Err(_) => serde_json::from_str(extract_json_object(raw)?)
            .map_err(|e| Error::MalformedResponse(e.to_string()))?,
    };

    if reply.class_name.trim().is_empty() {
        return Err(Error::MalformedResponse("empty className".to_string()));
    }
    if reply.complexity_level == ComplexityLevel::Unknown {
        return Err(Error::MalformedResponse(
            "complexityLevel must be low, medium or high".to_string(),
        ));
    }
    Ok(reply)
}
