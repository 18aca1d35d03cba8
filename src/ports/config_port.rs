//! Configuration access port trait.

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    /// Every `key = value` pair of a section, sorted by key. Empty when the
    /// section is missing.
    fn get_section(&self, section: &str) -> Vec<(String, String)>;
}
