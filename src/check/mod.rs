//! Smoke checks for the analyst pipeline.
//!
//! Four sequential steps: load the sample dataset, suggest prompts, translate
//! a fixed prompt, execute the resulting artifact. Each step prints a status
//! line as it runs; the first failure stops the sequence. The process still
//! exits 0 on failure: the output is for a human operator, not for scripting.

use std::path::Path;

use owo_colors::OwoColorize;

use crate::{
    dataset::load_data,
    engine::{run_plan, ExecutionResult},
    suggest::{suggest_prompts, SUMMARY_PROMPT},
    translate::Translator,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Load,
    Suggest,
    Translate,
    Execute,
}

impl Step {
    fn title(self) -> &'static str {
        match self {
            Step::Load => "data loading",
            Step::Suggest => "prompt suggestions",
            Step::Translate => "prompt-to-code conversion",
            Step::Execute => "code execution",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepStatus {
    Passed(String),
    Failed(String),
}

/// What happened, step by step. Steps after the first failure are absent.
#[derive(Debug, Default)]
pub struct CheckReport {
    pub steps: Vec<(Step, StepStatus)>,
}

impl CheckReport {
    pub fn all_passed(&self) -> bool {
        self.steps.len() == 4
            && self.steps.iter().all(|(_, s)| matches!(s, StepStatus::Passed(_)))
    }

    fn pass(&mut self, step: Step, detail: String) {
        println!("   {} {}", "✓".green(), detail);
        self.steps.push((step, StepStatus::Passed(detail)));
    }

    fn fail(&mut self, step: Step, detail: String) {
        println!("   {} {}", "✗".red(), detail);
        self.steps.push((step, StepStatus::Failed(detail)));
    }
}

/// Run the four checks against the dataset at `data_path`, printing progress.
pub async fn run_checks(data_path: &Path, translator: &Translator) -> CheckReport {
    let mut report = CheckReport::default();
    println!("Testing the personal AI data analyst...\n");

    // 1. Load
    announce(1, Step::Load);
    let data = match load_data(data_path) {
        Ok(data) => {
            report.pass(
                Step::Load,
                format!(
                    "Data loaded successfully: {} rows, {} columns",
                    data.rows(),
                    data.width()
                ),
            );
            data
        }
        Err(e) => {
            report.fail(Step::Load, format!("Failed to load data: {}", e));
            return report;
        }
    };

    // 2. Suggest. Suggestion building cannot fail, so this step passes with
    // the count; the first three are shown, numbered from 1.
    println!();
    announce(2, Step::Suggest);
    let suggestions = suggest_prompts(&data);
    report.pass(Step::Suggest, format!("Generated {} suggestions:", suggestions.len()));
    for (i, s) in suggestions.iter().take(3).enumerate() {
        println!("      {}. {}", i + 1, s);
    }

    // 3. Translate the fixed prompt. No artifact is terminal: step 4 never
    // runs with nothing to execute.
    println!();
    announce(3, Step::Translate);
    let artifact = match translator.prompt_to_code(SUMMARY_PROMPT, &data).await {
        Ok(Some(artifact)) => {
            report.pass(Step::Translate, "Successfully converted prompt to code".to_string());
            artifact
        }
        Ok(None) => {
            report.fail(Step::Translate, "No code generated for prompt".to_string());
            return report;
        }
        Err(e) => {
            report.fail(Step::Translate, format!("Failed to convert prompt: {}", e));
            return report;
        }
    };

    // 4. Execute
    println!();
    announce(4, Step::Execute);
    match run_plan(&data, &artifact.plan) {
        Ok(ExecutionResult::DataFrame(frame)) => {
            let (rows, cols) = frame.shape();
            report.pass(
                Step::Execute,
                format!("Code executed successfully, result type: dataframe, shape: ({}, {})", rows, cols),
            );
        }
        Ok(other) => {
            report.pass(
                Step::Execute,
                format!("Code executed, result type: {}", other.kind()),
            );
        }
        Err(e) => {
            report.fail(Step::Execute, format!("Failed to execute code: {}", e));
            return report;
        }
    }

    println!("\n{}", "✓ All checks passed! You're ready to analyze data.".green());
    println!("\nTry it out:");
    println!("  danalyst --data {} \"{}\"", data_path.display(), SUMMARY_PROMPT);
    report
}

fn announce(n: usize, step: Step) {
    println!("{}. Testing {}...", n, step.title());
}
