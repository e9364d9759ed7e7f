use std::str::FromStr;

use super::Config;

fn env_parse<T: FromStr>(key: &str, warnings: &mut Vec<String>) -> Option<T> {
    let v = std::env::var(key).ok()?;
    if let Ok(parsed) = v.trim().parse::<T>() {
        Some(parsed)
    } else {
        warnings.push(format!("ignoring invalid {key} value: {v}"));
        None
    }
}

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_llm();
        self.apply_env_overrides_pipeline();
    }

    fn apply_env_overrides_llm(&mut self) {
        let warnings = &mut self.env_warnings;
        if let Ok(v) = std::env::var("NEWSROOM_LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Ok(v) = std::env::var("NEWSROOM_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Some(t) = env_parse::<f32>("NEWSROOM_LLM_TEMPERATURE", warnings) {
            self.llm.temperature = t;
        }
        if let Some(n) = env_parse::<u32>("NEWSROOM_LLM_MAX_TOKENS", warnings) {
            self.llm.max_tokens = Some(n);
        }
        if let Some(secs) = env_parse::<u64>("NEWSROOM_LLM_TIMEOUT", warnings) {
            self.llm.timeout = secs;
        }
    }

    fn apply_env_overrides_pipeline(&mut self) {
        let warnings = &mut self.env_warnings;
        if let Some(secs) = env_parse::<u64>("NEWSROOM_FETCH_TIMEOUT", warnings) {
            self.fetch.timeout = secs;
        }
        if let Some(bytes) = env_parse::<usize>("NEWSROOM_FETCH_MAX_BODY", warnings) {
            self.fetch.max_body_bytes = bytes;
        }
        if let Some(allow) = env_parse::<bool>("NEWSROOM_FETCH_ALLOW_PRIVATE_HOSTS", warnings)
        {
            self.fetch.allow_private_hosts = allow;
        }
        if let Some(size) = env_parse::<usize>("NEWSROOM_CHUNK_SIZE", warnings) {
            self.splitter.chunk_size = size;
        }
        if let Some(overlap) = env_parse::<usize>("NEWSROOM_CHUNK_OVERLAP", warnings) {
            self.splitter.chunk_overlap = overlap;
        }
        if let Ok(v) = std::env::var("NEWSROOM_LOG_LEVEL") {
            self.logging.level = v;
        }
    }
}
