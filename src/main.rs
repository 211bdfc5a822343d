mod cache;
mod check;
mod cli;
mod config;
mod dataset;
mod engine;
mod handlers;
mod llm;
mod printer;
mod role;
mod suggest;
mod translate;

use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{bail, Result};
use config::Config;
use is_terminal::IsTerminal;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    // Load config
    let cfg = Config::load();

    // Resolve model: CLI overrides config; fall back to DEFAULT_MODEL
    let effective_model = args
        .model
        .clone()
        .or_else(|| cfg.get("DEFAULT_MODEL"))
        .unwrap_or_else(|| "gpt-4o".to_string());

    // Resolve dataset path: CLI overrides config; the sample file by default
    let data_path = args
        .data
        .clone()
        .map(PathBuf::from)
        .unwrap_or_else(|| cfg.sample_data_path());

    // stdin handling (pipe support for the prompt)
    let mut prompt_from_stdin = String::new();
    let stdin_is_tty = io::stdin().is_terminal();
    if !stdin_is_tty && !args.check && !args.suggest {
        io::stdin().read_to_string(&mut prompt_from_stdin)?;
    }

    // Resolve prompt: stdin + optional positional
    let arg_prompt = args.prompt.clone().unwrap_or_default();
    let prompt_from_stdin = prompt_from_stdin.trim().to_string();
    let prompt = if !prompt_from_stdin.is_empty() && !arg_prompt.is_empty() {
        format!("{}\n\n{}", prompt_from_stdin, arg_prompt)
    } else if !prompt_from_stdin.is_empty() {
        prompt_from_stdin
    } else {
        arg_prompt
    };

    // Effective boolean switches with defaults
    let caching = if args.no_cache {
        false
    } else if args.cache {
        true
    } else {
        true // default enabled
    };

    if args.check {
        return handlers::check::run(
            &cfg,
            &data_path,
            &effective_model,
            args.temperature,
            args.top_p,
            caching,
        )
        .await;
    }
    if args.suggest {
        return handlers::suggest::run(&data_path);
    }

    if prompt.trim().is_empty() {
        bail!("Provide an analysis prompt, or run with --suggest or --check");
    }
    handlers::analyze::run(
        &cfg,
        &data_path,
        &prompt,
        &effective_model,
        args.temperature,
        args.top_p,
        caching,
        args.plan,
    )
    .await
}
