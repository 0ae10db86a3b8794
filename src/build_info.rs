//! Build metadata embedded by build.rs

use std::fmt;

use serde::Serialize;

/// Recompilation counter; 0 when built without build.rs metadata
pub const BUILD_NUMBER: u64 = match option_env!("NUTRIBUDGET_BUILD_NUMBER") {
    Some(s) => match parse_u64(s) {
        Some(n) => n,
        None => 0,
    },
    None => 0,
};

pub const BUILD_TIMESTAMP: &str = match option_env!("NUTRIBUDGET_BUILD_TIMESTAMP") {
    Some(s) => s,
    None => "unknown",
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

// str::parse is not const
const fn parse_u64(s: &str) -> Option<u64> {
    let bytes = s.as_bytes();
    if bytes.is_empty() {
        return None;
    }
    let mut result: u64 = 0;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if !b.is_ascii_digit() {
            return None;
        }
        result = result * 10 + (b - b'0') as u64;
        i += 1;
    }
    Some(result)
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct BuildInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub build_number: u64,
    pub build_timestamp: &'static str,
}

impl BuildInfo {
    pub const fn current() -> Self {
        Self {
            name: NAME,
            version: VERSION,
            build_number: BUILD_NUMBER,
            build_timestamp: BUILD_TIMESTAMP,
        }
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} (build {}, {})",
            self.name, self.version, self.build_number, self.build_timestamp
        )
    }
}

/// Print the startup banner to stderr
pub fn print_startup_banner() {
    let rule = "=".repeat(47);
    eprintln!("{}", rule);
    eprintln!("  NutriBudget");
    eprintln!("  {}", BuildInfo::current());
    eprintln!("{}", rule);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_u64() {
        assert_eq!(parse_u64("42"), Some(42));
        assert_eq!(parse_u64(""), None);
        assert_eq!(parse_u64("4x"), None);
    }

    #[test]
    fn test_display() {
        let info = BuildInfo {
            name: "nutribudget",
            version: "1.2.3",
            build_number: 7,
            build_timestamp: "2026-01-01T00:00:00Z",
        };
        assert_eq!(info.to_string(), "nutribudget 1.2.3 (build 7, 2026-01-01T00:00:00Z)");
        assert_eq!(BuildInfo::current().name, "nutribudget");
    }
}
