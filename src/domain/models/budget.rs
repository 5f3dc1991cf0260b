use serde::{Deserialize, Serialize};

/// A budget ceiling for one expense category.
///
/// Allocations are declared in display order; group ordering for the
/// budget-comparison view derives from the order groups first appear in the
/// allocation list. Categories sharing a `shared_id` draw against one
/// combined ceiling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetAllocation {
    /// Category name the ceiling applies to
    pub category: String,
    /// Group the category is reported under
    pub group: String,
    /// Quarterly ceiling in USD
    #[serde(default)]
    pub quarterly: f64,
    /// Semester ceiling in USD
    #[serde(default)]
    pub semester: f64,
    /// Identifier of the shared pool this category draws from, if any
    #[serde(default)]
    pub shared_id: Option<String>,
}
