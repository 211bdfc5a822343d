//! Schema-driven prompt suggestions.
//!
//! Every suggestion this module emits is phrased so the builtin rule tier of
//! the translator can parse it back into a plan without a model call.

use crate::dataset::Dataset;

/// The prompt the smoke checks translate; always suggested first when the
/// dataset has a numeric column.
pub const SUMMARY_PROMPT: &str =
    "Show summary statistics (count, mean, std, min, 25%, 50%, 75%, max) for numeric columns.";

const MAX_SUGGESTIONS: usize = 8;

/// Ordered analysis prompts for a dataset. May be empty only for a dataset
/// with no columns at all; the head/shape prompts apply to anything else.
pub fn suggest_prompts(data: &Dataset) -> Vec<String> {
    let mut out = Vec::new();
    let numeric = data.numeric_columns();
    let categorical = data.categorical_columns();

    if !numeric.is_empty() {
        out.push(SUMMARY_PROMPT.to_string());
    }
    if data.width() > 0 {
        out.push(format!("Show the first {} rows.", 5.min(data.rows().max(1))));
        out.push("How many rows and columns does the dataset have?".to_string());
    }
    for col in &categorical {
        out.push(format!("Count the rows for each value of '{}'.", col.name));
    }
    for col in &numeric {
        out.push(format!("What is the average of '{}'?", col.name));
    }
    if let (Some(cat), Some(num)) = (categorical.first(), numeric.first()) {
        out.push(format!(
            "Show the average '{}' for each value of '{}'.",
            num.name, cat.name
        ));
    }
    if let Some(num) = numeric.first() {
        out.push(format!("What is the max of '{}'?", num.name));
    }

    out.truncate(MAX_SUGGESTIONS);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::load_data;
    use std::io::Write;

    fn dataset(csv: &str) -> (tempfile::NamedTempFile, Dataset) {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "{}", csv).unwrap();
        f.flush().unwrap();
        let ds = load_data(f.path()).unwrap();
        (f, ds)
    }

    #[test]
    fn summary_prompt_comes_first_for_numeric_data() {
        let (_f, ds) = dataset("age,city\n34,Boston\n29,Boston\n41,Denver\n");
        let prompts = suggest_prompts(&ds);
        assert_eq!(prompts[0], SUMMARY_PROMPT);
        assert!(prompts.len() >= 3);
        assert!(prompts.len() <= MAX_SUGGESTIONS);
    }

    #[test]
    fn text_only_data_still_gets_suggestions() {
        let (_f, ds) = dataset("city\nBoston\nBoston\nDenver\n");
        let prompts = suggest_prompts(&ds);
        assert!(!prompts.is_empty());
        assert!(!prompts.contains(&SUMMARY_PROMPT.to_string()));
        assert!(prompts.iter().any(|p| p.contains("each value of 'city'")));
    }

    #[test]
    fn every_suggestion_translates_with_builtin_rules() {
        let (_f, ds) = dataset("age,city,salary\n34,Boston,72000.0\n29,Denver,61000.0\n41,Boston,83500.0\n");
        for prompt in suggest_prompts(&ds) {
            let plan = crate::translate::translate_builtin(&prompt, &ds);
            assert!(plan.is_some(), "no builtin rule for suggested prompt: {}", prompt);
        }
    }
}
