//! Prompt construction shared by the service-backed research tools.

use coldmail_services::ServiceResult;
use regex::Regex;
use std::sync::LazyLock;

static RESEARCH_TARGET: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)Research\s+([A-Za-z0-9\s&.-]+?)\s+(?:for|to|at)").ok());

const KEYWORDS: &[&str] = &["research", "for", "to", "at", "about"];
const LEADING_WORDS: usize = 3;

/// Builds the enriched prompt a service-backed tool hands to its analyzer.
#[derive(Debug, Clone)]
pub struct ToolPromptBuilder {
    company_name: String,
}

impl ToolPromptBuilder {
    /// Start from the model's prompt, extracting the company it is about.
    pub fn from_prompt(prompt: &str) -> Self {
        Self {
            company_name: extract_company_name(prompt),
        }
    }

    /// Start from a company name already known.
    pub fn for_company(company_name: impl Into<String>) -> Self {
        Self {
            company_name: company_name.into(),
        }
    }

    pub fn company_name(&self) -> &str {
        &self.company_name
    }

    /// `Analyze this <kind>:\n\n<data>`
    pub fn analysis(&self, kind: &str, data: &str) -> String {
        format!("Analyze this {}:\n\n{}", kind, data)
    }

    /// Prompt used when the company's data could not be gathered at all.
    pub fn fallback(&self, message: &str) -> String {
        format!(
            "Could not retrieve data for: {}. {}",
            self.company_name, message
        )
    }

    /// Fill `{companyName}` and `{data}` in `template`.
    pub fn custom(&self, template: &str, data: &str) -> String {
        template
            .replace("{companyName}", &self.company_name)
            .replace("{data}", data)
    }

    /// Format a service result for [`analysis`](Self::analysis), replacing a
    /// failure with a "Data unavailable" note.
    pub fn analysis_of<T>(
        &self,
        result: ServiceResult<T>,
        format: impl FnOnce(&T) -> String,
        kind: &str,
    ) -> String {
        self.analysis(kind, &data_or_unavailable(result, format))
    }

    /// Same as [`analysis_of`](Self::analysis_of) with a custom template.
    pub fn custom_of<T>(
        &self,
        result: ServiceResult<T>,
        format: impl FnOnce(&T) -> String,
        template: &str,
    ) -> String {
        self.custom(template, &data_or_unavailable(result, format))
    }
}

fn data_or_unavailable<T>(result: ServiceResult<T>, format: impl FnOnce(&T) -> String) -> String {
    match result {
        Ok(data) => format(&data),
        Err(e) => {
            tracing::warn!(error = %e.format(), "Service data unavailable");
            format!("Data unavailable: {}", e.user_message())
        }
    }
}

/// Company named by a research prompt.
///
/// Tries "Research <Company> for|to|at" first, then the non-keyword words
/// among the first three, then the prompt itself.
pub fn extract_company_name(prompt: &str) -> String {
    if prompt.trim().is_empty() {
        return prompt.to_string();
    }

    if let Some(captures) = RESEARCH_TARGET.as_ref().and_then(|re| re.captures(prompt)) {
        let extracted = captures.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
        if !extracted.is_empty() {
            return extracted.to_string();
        }
    }

    let leading: Vec<&str> = prompt
        .split_whitespace()
        .take(LEADING_WORDS)
        .filter(|word| !KEYWORDS.contains(&word.to_lowercase().as_str()))
        .collect();
    if !leading.is_empty() {
        return leading.join(" ");
    }

    prompt.to_string()
}
