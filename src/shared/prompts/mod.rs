//! Prompt templates for the insight generator.

pub mod engine;

pub use engine::{render_template, TemplateError};

use minijinja::context;

/// Render the spending summary prompt.
///
/// # Arguments
/// * `bills_json` - The projected bills, already serialized
/// * `bill_count` - Number of bills in `bills_json`
pub fn render_spending_summary_prompt(
    bills_json: &str,
    bill_count: usize,
) -> Result<String, TemplateError> {
    render_template(
        "insights/spending_summary.jinja",
        context! {
            bills_json => bills_json,
            bill_count => bill_count,
        },
    )
}
