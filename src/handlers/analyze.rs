//! Analyze handler: prompt → plan → result for one request.

use std::path::Path;

use anyhow::{bail, Result};

use crate::{
    config::Config,
    dataset::load_data,
    engine::run_plan,
    printer::print_result,
    translate::Translator,
};

pub async fn run(
    cfg: &Config,
    data_path: &Path,
    prompt: &str,
    model: &str,
    temperature: f32,
    top_p: f32,
    caching: bool,
    plan_only: bool,
) -> Result<()> {
    let data = load_data(data_path)?;
    let translator = Translator::from_config(cfg, model, temperature, top_p, caching)?;

    let Some(artifact) = translator.prompt_to_code(prompt, &data).await? else {
        bail!(
            "no analysis could be generated for this prompt; try one from `danalyst --suggest --data {}`",
            data_path.display()
        );
    };

    if plan_only {
        println!("{}", artifact.source);
        return Ok(());
    }

    let result = run_plan(&data, &artifact.plan)?;
    print_result(&result);
    Ok(())
}
