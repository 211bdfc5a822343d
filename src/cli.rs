use clap::{ArgGroup, Parser};

#[derive(Parser, Debug, Clone)]
#[command(name = "danalyst", about = "Personal AI data analyst CLI", version)]
#[command(group(ArgGroup::new("mode").args(["check", "suggest", "plan"]).multiple(false)))]
#[command(group(ArgGroup::new("cache_switch").args(["cache", "no_cache"]).multiple(false)))]
pub struct Cli {
    /// The analysis request in natural language.
    #[arg(value_name = "PROMPT")]
    pub prompt: Option<String>,

    /// Path to the CSV dataset.
    #[arg(long)]
    pub data: Option<String>,

    /// Large language model to use for prompt translation.
    #[arg(long)]
    pub model: Option<String>,

    /// Randomness of generated output.
    #[arg(long, default_value_t = 0.0, value_parser = clap::value_parser!(f32))]
    pub temperature: f32,

    /// Limits highest probable tokens (words).
    #[arg(long = "top-p", default_value_t = 1.0, value_parser = clap::value_parser!(f32))]
    pub top_p: f32,

    /// Run the pipeline smoke checks against the sample dataset.
    #[arg(long)]
    pub check: bool,

    /// List suggested analysis prompts for the dataset.
    #[arg(short = 's', long)]
    pub suggest: bool,

    /// Print the generated analysis plan without executing it.
    #[arg(short = 'p', long)]
    pub plan: bool,

    /// Cache model translation results.
    #[arg(long)]
    pub cache: bool,
    /// Disable caching.
    #[arg(long = "no-cache")]
    pub no_cache: bool,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}
