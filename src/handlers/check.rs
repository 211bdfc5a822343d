//! Smoke-check handler: runs the four pipeline checks against the sample
//! dataset. Always exits 0; the report is for the human operator.

use std::path::Path;

use anyhow::Result;

use crate::{check::run_checks, config::Config, translate::Translator};

pub async fn run(
    cfg: &Config,
    data_path: &Path,
    model: &str,
    temperature: f32,
    top_p: f32,
    caching: bool,
) -> Result<()> {
    let translator = Translator::from_config(cfg, model, temperature, top_p, caching)?;
    let _report = run_checks(data_path, &translator).await;
    Ok(())
}
