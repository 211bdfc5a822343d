use std::{
    collections::HashMap,
    env, fs,
    io::{BufRead, BufReader},
    path::PathBuf,
};

use directories::BaseDirs;

#[derive(Debug, Clone)]
pub struct Config {
    inner: HashMap<String, String>,
    pub config_path: PathBuf,
}

impl Config {
    pub fn load() -> Self {
        let mut map = default_map();
        let config_path = default_config_path();

        // Read .danalystrc if exists
        if config_path.exists() {
            if let Ok(file) = fs::File::open(&config_path) {
                let reader = BufReader::new(file);
                for line in reader.lines().map_while(Result::ok) {
                    let line = line.trim();
                    if line.is_empty() || line.starts_with('#') {
                        continue;
                    }
                    if let Some((k, v)) = line.split_once('=') {
                        map.insert(k.trim().to_string(), v.trim().to_string());
                    }
                }
            }
        }

        // Overlay environment variables (take precedence)
        for (k, v) in env::vars() {
            if is_config_key(&k) {
                map.insert(k, v);
            }
        }

        Self { inner: map, config_path }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        // ENV first
        if let Ok(v) = env::var(key) {
            return Some(v);
        }
        self.inner.get(key).cloned()
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key)
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    pub fn cache_path(&self) -> PathBuf {
        PathBuf::from(self.get("CACHE_PATH").unwrap_or_else(|| {
            env::temp_dir().join("danalyst").join("cache").to_string_lossy().into_owned()
        }))
    }

    pub fn sample_data_path(&self) -> PathBuf {
        PathBuf::from(self.get("SAMPLE_DATA_PATH").unwrap_or_else(|| "sample_data.csv".into()))
    }
}

fn is_config_key(k: &str) -> bool {
    // Accept known keys or ANALYST_*/OPENAI_* for forward-compat
    const KEYS: &[&str] = &[
        "OPENAI_API_KEY",
        "API_BASE_URL",
        "CACHE_PATH",
        "CACHE_LENGTH",
        "REQUEST_TIMEOUT",
        "DEFAULT_MODEL",
        "SAMPLE_DATA_PATH",
    ];

    KEYS.contains(&k) || k.starts_with("ANALYST_") || k.starts_with("OPENAI_")
}

fn default_config_path() -> PathBuf {
    let base = BaseDirs::new()
        .map(|b| b.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.config"));
    base.join("danalyst").join(".danalystrc")
}

fn default_map() -> HashMap<String, String> {
    let mut m = HashMap::new();
    // Paths
    let temp = env::temp_dir().join("danalyst");
    m.insert(
        "CACHE_PATH".into(),
        temp.join("cache").to_string_lossy().into_owned(),
    );

    // Numbers
    m.insert("CACHE_LENGTH".into(), "100".into());
    m.insert("REQUEST_TIMEOUT".into(), "60".into());

    // Strings
    m.insert("DEFAULT_MODEL".into(), "gpt-4o".into());
    m.insert("API_BASE_URL".into(), "default".into());
    m.insert("SAMPLE_DATA_PATH".into(), "sample_data.csv".into());

    // Bools as strings
    m.insert("ANALYST_OFFLINE".into(), "false".into());

    m
}
