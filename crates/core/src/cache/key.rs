/// Builds and strips fully qualified cache keys of the form
/// `prefix:version:key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyFunction {
    prefix: String,
    version: u32,
}

impl KeyFunction {
    pub fn new(prefix: impl Into<String>, version: u32) -> Self {
        Self { prefix: prefix.into(), version }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn make_key(&self, key: &str) -> String {
        format!("{}:{}:{}", self.prefix, self.version, key)
    }

    /// Recover the caller's key from a full key.
    ///
    /// Keys written under this function's prefix and version are stripped
    /// exactly; anything else falls back to dropping the first two
    /// `:`-separated segments. Returns `None` when there is nothing to strip.
    pub fn reverse_key<'a>(&self, full_key: &'a str) -> Option<&'a str> {
        let own = format!("{}:{}:", self.prefix, self.version);
        if let Some(rest) = full_key.strip_prefix(own.as_str()) {
            return Some(rest);
        }
        full_key.splitn(3, ':').nth(2)
    }
}
