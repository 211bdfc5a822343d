//! Suggestion handler: print every suggested prompt for a dataset.

use std::path::Path;

use anyhow::Result;

use crate::{dataset::load_data, suggest::suggest_prompts};

pub fn run(data_path: &Path) -> Result<()> {
    let data = load_data(data_path)?;
    let suggestions = suggest_prompts(&data);
    if suggestions.is_empty() {
        println!("No suggestions for this dataset.");
        return Ok(());
    }
    for (i, s) in suggestions.iter().enumerate() {
        println!("{}. {}", i + 1, s);
    }
    Ok(())
}
