use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: String,
    pub books_path: PathBuf,
    pub content_dir: PathBuf,
    /// When set, book text is fetched over HTTP instead of from `content_dir`.
    pub content_url: Option<String>,
    pub positions_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            addr: "0.0.0.0:3000".to_string(),
            books_path: PathBuf::from("./data/books.json"),
            content_dir: PathBuf::from("./content"),
            content_url: None,
            positions_path: PathBuf::from("./data/positions.json"),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Config::default();
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        Config {
            addr: get("BOOKVOYAGE_ADDR").unwrap_or(defaults.addr),
            books_path: get("BOOKVOYAGE_BOOKS")
                .map(PathBuf::from)
                .unwrap_or(defaults.books_path),
            content_dir: get("BOOKVOYAGE_CONTENT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.content_dir),
            content_url: get("BOOKVOYAGE_CONTENT_URL"),
            positions_path: get("BOOKVOYAGE_POSITIONS")
                .map(PathBuf::from)
                .unwrap_or(defaults.positions_path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn env_overrides_defaults() {
        let env = HashMap::from([
            ("BOOKVOYAGE_ADDR", "127.0.0.1:8080"),
            ("BOOKVOYAGE_CONTENT_URL", "https://cdn.example.com/content"),
            ("BOOKVOYAGE_BOOKS", "  "),
        ]);
        let config = Config::from_lookup(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.addr, "127.0.0.1:8080");
        assert_eq!(config.content_url.as_deref(), Some("https://cdn.example.com/content"));
        assert_eq!(config.books_path, PathBuf::from("./data/books.json"));
        assert_eq!(config.content_dir, PathBuf::from("./content"));
    }
}
