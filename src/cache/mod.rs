//! On-disk cache for model translation responses.

use std::{fs, path::PathBuf};

use anyhow::Result;

use crate::config::Config;

#[derive(Debug, Clone)]
pub struct RequestCache {
    length: usize,
    cache_path: PathBuf,
}

impl RequestCache {
    pub fn from_config(cfg: &Config) -> Self {
        let len = cfg
            .get("CACHE_LENGTH")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(100);
        let path = cfg.cache_path();
        let _ = fs::create_dir_all(&path);
        Self { length: len, cache_path: path }
    }

    /// Cache key for one translation request. The schema is part of the key:
    /// the same prompt against a different dataset must not reuse a plan.
    pub fn key_for(&self, base_url: &str, model: &str, prompt: &str, schema: &str) -> String {
        let payload = serde_json::json!({
            "base_url": base_url,
            "model": model,
            "prompt": prompt,
            "schema": schema,
        });
        let data = serde_json::to_vec(&payload).unwrap_or_default();
        let digest = md5::compute(data);
        format!("{:x}", digest)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let p = self.cache_path.join(key);
        fs::read_to_string(p).ok()
    }

    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let p = self.cache_path.join(key);
        fs::write(p, value)?;
        self.prune()?;
        Ok(())
    }

    fn prune(&self) -> Result<()> {
        let mut entries: Vec<_> = fs::read_dir(&self.cache_path)?.filter_map(|e| e.ok()).collect();
        entries.sort_by_key(|e| e.metadata().and_then(|m| m.modified()).ok());
        if entries.len() > self.length {
            let to_delete = entries.len() - self.length;
            for entry in entries.iter().take(to_delete) {
                let _ = fs::remove_file(entry.path());
            }
        }
        Ok(())
    }
}
