use std::path::PathBuf;

/// Resolves the Hugging Face hub cache directory a model download would use.
///
/// `lookup` reads a configuration value by name; empty values count as unset.
/// Only used for diagnostics.
pub fn resolve_model_cache_dir<F>(lookup: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

    if let Some(dir) = get("HUGGINGFACE_HUB_CACHE").or_else(|| get("HF_HUB_CACHE")) {
        return PathBuf::from(dir);
    }
    if let Some(hf_home) = get("HF_HOME") {
        return PathBuf::from(hf_home).join("hub");
    }
    if let Some(xdg_cache) = get("XDG_CACHE_HOME") {
        return PathBuf::from(xdg_cache).join("huggingface").join("hub");
    }

    let home = get("HOME")
        .or_else(|| get("USERPROFILE"))
        .unwrap_or_else(|| "~".to_string());
    PathBuf::from(home)
        .join(".cache")
        .join("huggingface")
        .join("hub")
}

pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}
