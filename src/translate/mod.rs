//! Prompt-to-code translation.
//!
//! Two tiers: a deterministic builtin rule matcher that understands the
//! phrasing the suggester emits, and an OpenAI-compatible model fallback that
//! asks for a JSON plan. `Ok(None)` means "no code could be produced", which
//! callers treat differently from a failed translation.

use anyhow::{bail, Context, Result};

use crate::{
    cache::RequestCache,
    config::Config,
    dataset::Dataset,
    engine::{AnalysisPlan, Stat},
    llm::{ChatMessage, ChatOptions, LlmClient, Role},
    role::plan_role_text,
};

/// A generated, executable analysis fragment: the parsed plan plus the JSON
/// source it was parsed from and where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeArtifact {
    pub plan: AnalysisPlan,
    pub source: String,
    pub origin: Origin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Builtin,
    Model,
}

#[derive(Debug)]
pub struct Translator {
    client: Option<LlmClient>,
    cache: Option<RequestCache>,
    model: String,
    temperature: f32,
    top_p: f32,
}

impl Translator {
    pub fn from_config(
        cfg: &Config,
        model: &str,
        temperature: f32,
        top_p: f32,
        caching: bool,
    ) -> Result<Self> {
        let offline = cfg.get_bool("ANALYST_OFFLINE");
        let client = if offline { None } else { Some(LlmClient::from_config(cfg)?) };
        let cache = caching.then(|| RequestCache::from_config(cfg));
        Ok(Self {
            client,
            cache,
            model: model.to_string(),
            temperature,
            top_p,
        })
    }

    /// Builtin rules only; used by tests and wherever determinism matters.
    pub fn offline(model: &str) -> Self {
        Self {
            client: None,
            cache: None,
            model: model.to_string(),
            temperature: 0.0,
            top_p: 1.0,
        }
    }

    /// Translate a natural-language prompt into a code artifact.
    ///
    /// Builtin rules fire first. With no matching rule and no usable model
    /// tier this returns `Ok(None)`; model errors propagate as `Err`.
    pub async fn prompt_to_code(&self, prompt: &str, data: &Dataset) -> Result<Option<CodeArtifact>> {
        if prompt.trim().is_empty() {
            return Ok(None);
        }
        if let Some(plan) = translate_builtin(prompt, data) {
            let source = serde_json::to_string(&plan)?;
            return Ok(Some(CodeArtifact { plan, source, origin: Origin::Builtin }));
        }

        let Some(client) = self.client.as_ref().filter(|c| c.has_api_key()) else {
            return Ok(None);
        };

        let schema = data.schema_text();
        let key = self
            .cache
            .as_ref()
            .map(|c| c.key_for(client.base_url(), &self.model, prompt, &schema));
        let reply = match key.as_ref().and_then(|k| self.cache.as_ref()?.get(k)) {
            Some(cached) => cached,
            None => {
                let messages = vec![
                    ChatMessage::new(Role::System, plan_role_text(data)),
                    ChatMessage::new(Role::User, prompt.to_string()),
                ];
                let opts = ChatOptions {
                    model: self.model.clone(),
                    temperature: self.temperature,
                    top_p: self.top_p,
                    max_tokens: 256,
                };
                let reply = client.complete(messages, opts).await?;
                if let (Some(cache), Some(k)) = (self.cache.as_ref(), key.as_ref()) {
                    let _ = cache.set(k, &reply);
                }
                reply
            }
        };

        let body = strip_code_fences(&reply);
        if body.is_empty() {
            return Ok(None);
        }
        let plan: AnalysisPlan = serde_json::from_str(body)
            .with_context(|| format!("model reply is not a valid plan: {}", body))?;
        validate_plan(&plan, data)?;
        Ok(Some(CodeArtifact {
            plan,
            source: body.to_string(),
            origin: Origin::Model,
        }))
    }
}

/// Deterministic rule tier. Understands every prompt the suggester emits and
/// common rephrasings of them.
pub fn translate_builtin(prompt: &str, data: &Dataset) -> Option<AnalysisPlan> {
    let lower = prompt.to_lowercase();

    if lower.contains("summary statistics") || lower.contains("describe") {
        return Some(AnalysisPlan::Describe);
    }
    if lower.contains("how many rows") || lower.contains("rows and columns") || lower.contains("shape") {
        return Some(AnalysisPlan::Shape);
    }
    if (lower.contains("first") && lower.contains("row")) || lower.contains("head") {
        let n = first_number(&lower).unwrap_or(5);
        return Some(AnalysisPlan::Head { n });
    }

    let grouped = lower.contains("for each") || lower.contains(" per ") || lower.contains(" grouped by ");
    let stat = stat_keyword(&lower)?;
    let cols = referenced_columns(prompt, data);

    match (grouped, stat, cols.as_slice()) {
        // "Count the rows for each value of 'city'."
        (true, Stat::Count, [col]) => Some(AnalysisPlan::ValueCounts { column: col.clone() }),
        // "Show the average 'salary' for each value of 'city'." The value
        // column usually appears first, but when exactly one of the two is
        // numeric it is the value column no matter where it appears.
        (true, stat, [first, second]) => {
            let numeric = |name: &str| {
                data.resolve_column(name).is_some_and(|c| c.ty.is_numeric())
            };
            let (column, by) = if numeric(second) && !numeric(first) {
                (second, first)
            } else {
                (first, second)
            };
            Some(AnalysisPlan::GroupAggregate {
                by: by.clone(),
                column: column.clone(),
                stat,
            })
        }
        // "What is the average of 'age'?"
        (false, stat, [column]) => Some(AnalysisPlan::Aggregate { column: column.clone(), stat }),
        // Stat with no named column resolves only when there is exactly one
        // numeric column to mean.
        (false, stat, []) => {
            let numeric = data.numeric_columns();
            if numeric.len() == 1 {
                Some(AnalysisPlan::Aggregate { column: numeric[0].name.clone(), stat })
            } else {
                None
            }
        }
        _ => None,
    }
}

fn stat_keyword(lower: &str) -> Option<Stat> {
    if lower.contains("average") || lower.contains("mean") {
        Some(Stat::Mean)
    } else if lower.contains("standard deviation") || lower.contains("std") {
        Some(Stat::Std)
    } else if lower.contains("minimum") || lower.contains("smallest") || lower.contains("min ") || lower.contains("min of") {
        Some(Stat::Min)
    } else if lower.contains("maximum") || lower.contains("largest") || lower.contains("max ") || lower.contains("max of") {
        Some(Stat::Max)
    } else if lower.contains("total") || lower.contains("sum") {
        Some(Stat::Sum)
    } else if lower.contains("count") || lower.contains("how many") {
        Some(Stat::Count)
    } else {
        None
    }
}

/// Column references, in order of appearance. Quoted names win; otherwise
/// dataset column names are matched case-insensitively as substrings.
fn referenced_columns(prompt: &str, data: &Dataset) -> Vec<String> {
    let quoted = quoted_spans(prompt);
    let mut found: Vec<(usize, String)> = Vec::new();
    if !quoted.is_empty() {
        for (pos, name) in quoted {
            if let Some(col) = data.resolve_column(&name) {
                found.push((pos, col.name.clone()));
            }
        }
    } else {
        let lower = prompt.to_lowercase();
        for col in data.columns() {
            if let Some(pos) = find_word(&lower, &col.name.to_lowercase()) {
                found.push((pos, col.name.clone()));
            }
        }
    }
    found.sort_by_key(|(pos, _)| *pos);
    found.into_iter().map(|(_, name)| name).collect()
}

/// Substring search constrained to word boundaries, so a column named `age`
/// never matches inside "average".
fn find_word(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    let word_char = |c: char| c.is_alphanumeric() || c == '_';
    let mut start = 0;
    while let Some(rel) = haystack[start..].find(needle) {
        let pos = start + rel;
        let end = pos + needle.len();
        let before = haystack[..pos].chars().next_back();
        let after = haystack[end..].chars().next();
        if !before.is_some_and(word_char) && !after.is_some_and(word_char) {
            return Some(pos);
        }
        start = end;
    }
    None
}

fn quoted_spans(prompt: &str) -> Vec<(usize, String)> {
    let mut out = Vec::new();
    for quote in ['\'', '"'] {
        let mut rest = prompt;
        let mut offset = 0;
        while let Some(start) = rest.find(quote) {
            let after = &rest[start + 1..];
            let Some(end) = after.find(quote) else { break };
            if end > 0 {
                out.push((offset + start, after[..end].to_string()));
            }
            let consumed = start + 1 + end + 1;
            offset += consumed;
            rest = &rest[consumed..];
        }
    }
    out
}

fn first_number(lower: &str) -> Option<usize> {
    let digits: String = lower
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

fn strip_code_fences(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop a language tag on the fence line, then the closing fence.
    let inner = match inner.split_once('\n') {
        Some((_lang, rest)) => rest,
        None => inner,
    };
    inner.trim_end_matches('`').trim()
}

fn validate_plan(plan: &AnalysisPlan, data: &Dataset) -> Result<()> {
    let mut check = |name: &str| -> Result<()> {
        if data.resolve_column(name).is_none() {
            bail!("plan references unknown column '{}'", name);
        }
        Ok(())
    };
    match plan {
        AnalysisPlan::Describe | AnalysisPlan::Head { .. } | AnalysisPlan::Shape => Ok(()),
        AnalysisPlan::ValueCounts { column } | AnalysisPlan::Aggregate { column, .. } => check(column),
        AnalysisPlan::GroupAggregate { by, column, .. } => {
            check(by)?;
            check(column)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::load_data;
    use crate::suggest::SUMMARY_PROMPT;
    use std::io::Write;

    fn dataset() -> (tempfile::NamedTempFile, Dataset) {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "name,age,city,salary").unwrap();
        writeln!(f, "Alice,34,Boston,72000.0").unwrap();
        writeln!(f, "Bob,29,Denver,61000.0").unwrap();
        f.flush().unwrap();
        let ds = load_data(f.path()).unwrap();
        (f, ds)
    }

    #[test]
    fn summary_prompt_becomes_describe() {
        let (_f, ds) = dataset();
        assert_eq!(translate_builtin(SUMMARY_PROMPT, &ds), Some(AnalysisPlan::Describe));
    }

    #[test]
    fn head_prompt_parses_row_count() {
        let (_f, ds) = dataset();
        assert_eq!(
            translate_builtin("Show the first 3 rows.", &ds),
            Some(AnalysisPlan::Head { n: 3 })
        );
        assert_eq!(
            translate_builtin("show the first rows", &ds),
            Some(AnalysisPlan::Head { n: 5 })
        );
    }

    #[test]
    fn shape_prompt() {
        let (_f, ds) = dataset();
        assert_eq!(
            translate_builtin("How many rows and columns does the dataset have?", &ds),
            Some(AnalysisPlan::Shape)
        );
    }

    #[test]
    fn value_counts_prompt() {
        let (_f, ds) = dataset();
        assert_eq!(
            translate_builtin("Count the rows for each value of 'city'.", &ds),
            Some(AnalysisPlan::ValueCounts { column: "city".into() })
        );
    }

    #[test]
    fn aggregate_prompt_resolves_quoted_column() {
        let (_f, ds) = dataset();
        assert_eq!(
            translate_builtin("What is the average of 'Age'?", &ds),
            Some(AnalysisPlan::Aggregate { column: "age".into(), stat: Stat::Mean })
        );
    }

    #[test]
    fn group_aggregate_prompt_orders_value_then_key() {
        let (_f, ds) = dataset();
        assert_eq!(
            translate_builtin("Show the average 'salary' for each value of 'city'.", &ds),
            Some(AnalysisPlan::GroupAggregate {
                by: "city".into(),
                column: "salary".into(),
                stat: Stat::Mean,
            })
        );
    }

    #[test]
    fn unquoted_column_names_still_resolve() {
        let (_f, ds) = dataset();
        assert_eq!(
            translate_builtin("what is the max salary", &ds),
            Some(AnalysisPlan::Aggregate { column: "salary".into(), stat: Stat::Max })
        );
    }

    #[test]
    fn unquoted_average_prompt_ignores_embedded_age_column() {
        // "average" contains "age"; word-boundary matching must not resolve
        // it as a column reference.
        let (_f, ds) = dataset();
        assert_eq!(
            translate_builtin("What is the average salary?", &ds),
            Some(AnalysisPlan::Aggregate { column: "salary".into(), stat: Stat::Mean })
        );
    }

    #[test]
    fn group_prompt_with_key_named_first_binds_numeric_value_column() {
        let (_f, ds) = dataset();
        assert_eq!(
            translate_builtin("For each city, show the average salary.", &ds),
            Some(AnalysisPlan::GroupAggregate {
                by: "city".into(),
                column: "salary".into(),
                stat: Stat::Mean,
            })
        );
    }

    #[test]
    fn unrelated_prompt_does_not_match() {
        let (_f, ds) = dataset();
        assert_eq!(translate_builtin("Plot a histogram of everything.", &ds), None);
    }

    #[test]
    fn fence_stripping() {
        assert_eq!(strip_code_fences("{\"op\":\"shape\"}"), "{\"op\":\"shape\"}");
        assert_eq!(
            strip_code_fences("```json\n{\"op\":\"shape\"}\n```"),
            "{\"op\":\"shape\"}"
        );
        assert_eq!(strip_code_fences("  \n"), "");
    }

    #[tokio::test]
    async fn offline_translator_yields_none_for_unknown_prompts() {
        let (_f, ds) = dataset();
        let t = Translator::offline("gpt-4o");
        let artifact = t.prompt_to_code("Plot a histogram of everything.", &ds).await.unwrap();
        assert!(artifact.is_none());
        // Empty prompt is also "no code", not an error.
        assert!(t.prompt_to_code("   ", &ds).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn offline_translator_builds_builtin_artifacts() {
        let (_f, ds) = dataset();
        let t = Translator::offline("gpt-4o");
        let artifact = t.prompt_to_code(SUMMARY_PROMPT, &ds).await.unwrap().unwrap();
        assert_eq!(artifact.origin, Origin::Builtin);
        assert_eq!(artifact.plan, AnalysisPlan::Describe);
        assert!(artifact.source.contains("describe"));
    }

    #[test]
    fn plan_validation_rejects_unknown_columns() {
        let (_f, ds) = dataset();
        let plan = AnalysisPlan::ValueCounts { column: "ghost".into() };
        assert!(validate_plan(&plan, &ds).is_err());
        assert!(validate_plan(&AnalysisPlan::Describe, &ds).is_ok());
    }
}
