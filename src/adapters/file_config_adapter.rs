//! INI file configuration adapter.

use crate::domain::error::TickframeError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TickframeError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::parse(content, &path.display().to_string())
    }

    pub fn from_string(content: &str) -> Result<Self, TickframeError> {
        Self::parse(content.to_string(), "<string>")
    }

    fn parse(content: String, file: &str) -> Result<Self, TickframeError> {
        // Tickers under [symbols] are case-sensitive keys.
        let mut config = Ini::new_cs();
        config
            .read(content)
            .map_err(|reason| TickframeError::ConfigParse {
                file: file.to_string(),
                reason,
            })?;
        Ok(Self { config })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_section(&self, section: &str) -> Vec<(String, String)> {
        let Some(entries) = self.config.get_map_ref().get(section) else {
            return Vec::new();
        };
        let mut pairs: Vec<(String, String)> = entries
            .iter()
            .filter_map(|(k, v)| v.as_ref().map(|v| (k.clone(), v.clone())))
            .collect();
        pairs.sort();
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_config() {
        let content = r#"
[table]
duplicates = keep_last

[symbols]
SPY = SPY EQUITY USA
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_string("table", "duplicates"),
            Some("keep_last".to_string())
        );
        assert_eq!(
            adapter.get_string("symbols", "SPY"),
            Some("SPY EQUITY USA".to_string())
        );
    }

    #[test]
    fn keys_are_case_sensitive() {
        let adapter = FileConfigAdapter::from_string("[symbols]\nSPY = SPY EQUITY USA\n").unwrap();
        assert_eq!(adapter.get_string("symbols", "spy"), None);
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string("[table]\nduplicates = keep_all\n").unwrap();
        assert_eq!(adapter.get_string("table", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn get_section_is_sorted_by_key() {
        let adapter = FileConfigAdapter::from_string(
            "[symbols]\nSPY = SPY EQUITY USA\nAAPL = AAPL EQUITY USA\n",
        )
        .unwrap();
        let pairs = adapter.get_section("symbols");
        assert_eq!(pairs[0].0, "AAPL");
        assert_eq!(pairs[1], ("SPY".to_string(), "SPY EQUITY USA".to_string()));
        assert!(adapter.get_section("missing").is_empty());
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[table]\nduplicates = keep_all\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("table", "duplicates"),
            Some("keep_all".to_string())
        );
    }

    #[test]
    fn from_file_returns_error_for_missing_file() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        assert!(matches!(result, Err(TickframeError::Io(_))));
    }
}
