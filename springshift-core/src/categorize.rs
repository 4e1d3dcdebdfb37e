//! Role classification from path and content.
//!
//! Two layers, first match wins:
//!
//! 1. keywords in the lower-cased path, checked in [`PATH_KEYWORDS`] order
//! 2. framework annotations in the file text
//!
//! Anything left over is [`Category::Other`]. Files found by a walk are
//! categorized with [`categorize_under`], which ignores the walk root.

use crate::types::Category;
use std::path::Path;

/// Path keywords in precedence order.
///
/// The table is a total order: a path containing both `service` and `util`
/// is a service because `service` comes first.
pub const PATH_KEYWORDS: &[(&str, Category)] = &[
    ("controller", Category::Controller),
    ("service", Category::Service),
    ("dao", Category::DataAccess),
    ("repository", Category::DataAccess),
    ("entity", Category::Entity),
    ("model", Category::Entity),
    ("pojo", Category::Entity),
    ("config", Category::Configuration),
    ("util", Category::Utility),
    ("helper", Category::Utility),
];

const CONTROLLER_MARKERS: &[&str] = &["@Controller", "@RestController"];
const SERVICE_MARKERS: &[&str] = &["@Service"];
const ENTITY_MARKERS: &[&str] = &["@Entity"];
const REPOSITORY_MARKERS: &[&str] = &["@Repository"];

/// Assign a category to a file. Pure and total.
pub fn categorize(path: &Path, content: &str) -> Category {
    categorize_by_path(path)
        .or_else(|| categorize_by_content(content))
        .unwrap_or(Category::Other)
}

/// Categorize a file found under `root`.
///
/// Only the part of the path below `root` is matched against keywords, so
/// a root such as `billing-service/` does not decide every file in it.
pub fn categorize_under(root: &Path, path: &Path, content: &str) -> Category {
    categorize(path.strip_prefix(root).unwrap_or(path), content)
}

/// Path layer only.
pub fn categorize_by_path(path: &Path) -> Option<Category> {
    let lowered = path.to_string_lossy().to_lowercase();
    PATH_KEYWORDS
        .iter()
        .find(|(keyword, _)| lowered.contains(keyword))
        .map(|(_, category)| *category)
}

/// Content layer only.
pub fn categorize_by_content(content: &str) -> Option<Category> {
    let has_any = |markers: &[&str]| markers.iter().any(|m| content.contains(m));

    if has_any(CONTROLLER_MARKERS) {
        Some(Category::Controller)
    } else if has_any(SERVICE_MARKERS) {
        Some(Category::Service)
    } else if has_any(ENTITY_MARKERS) {
        // @Entity beats @Repository when both appear
        Some(Category::Entity)
    } else if has_any(REPOSITORY_MARKERS) {
        Some(Category::DataAccess)
    } else {
        None
    }
}
