//! Target languages for generated models.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A language the pipeline generates models for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Kcl,
    Python,
    Go,
    Json,
}

impl Language {
    /// Every supported language, in generation order.
    pub const ALL: [Language; 4] = [Language::Kcl, Language::Python, Language::Go, Language::Json];

    /// Returns the lowercase identifier used in cache paths.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Kcl => "kcl",
            Language::Python => "python",
            Language::Go => "go",
            Language::Json => "json",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "kcl" => Ok(Language::Kcl),
            "python" => Ok(Language::Python),
            "go" => Ok(Language::Go),
            "json" => Ok(Language::Json),
            other => Err(format!(
                "unknown language '{}'. Expected one of: kcl, python, go, json",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        for lang in Language::ALL {
            assert_eq!(lang.as_str().parse::<Language>().unwrap(), lang);
        }
        assert_eq!("KCL".parse::<Language>().unwrap(), Language::Kcl);
        assert!("rust".parse::<Language>().is_err());
    }
}
