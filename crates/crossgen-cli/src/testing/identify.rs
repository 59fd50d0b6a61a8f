//! Identification of a test directory's authoring language.

use std::fmt;
use std::str::FromStr;

use crossgen_vfs::FileSystem;
use serde::{Deserialize, Serialize};

/// A language tests can be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestLanguage {
    Kcl,
    Python,
}

impl TestLanguage {
    pub const ALL: [TestLanguage; 2] = [TestLanguage::Kcl, TestLanguage::Python];

    pub fn as_str(&self) -> &'static str {
        match self {
            TestLanguage::Kcl => "kcl",
            TestLanguage::Python => "python",
        }
    }
}

impl fmt::Display for TestLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestLanguage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "kcl" => Ok(TestLanguage::Kcl),
            "python" => Ok(TestLanguage::Python),
            other => Err(format!(
                "unsupported test language '{}'. Expected one of: kcl, python",
                other
            )),
        }
    }
}

/// Decides which language a test directory is written in.
pub trait Identifier: Send + Sync {
    /// Returns `None` for directories that hold no supported test.
    fn identify(&self, fs: &dyn FileSystem) -> Option<TestLanguage>;
}

/// `kcl.mod` marks a KCL test, `main.py` a Python one. KCL wins when both
/// are present.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultIdentifier;

impl Identifier for DefaultIdentifier {
    fn identify(&self, fs: &dyn FileSystem) -> Option<TestLanguage> {
        if fs.exists("kcl.mod") {
            Some(TestLanguage::Kcl)
        } else if fs.exists("main.py") {
            Some(TestLanguage::Python)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossgen_vfs::VirtualFileTree;

    #[test]
    fn test_default_identifier() {
        let kcl = VirtualFileTree::from_files([("kcl.mod", ""), ("main.k", "")]).unwrap();
        let python = VirtualFileTree::from_files([("main.py", "")]).unwrap();
        let both = VirtualFileTree::from_files([("kcl.mod", ""), ("main.py", "")]).unwrap();
        let neither = VirtualFileTree::from_files([("README.md", "")]).unwrap();

        assert_eq!(DefaultIdentifier.identify(&kcl), Some(TestLanguage::Kcl));
        assert_eq!(DefaultIdentifier.identify(&python), Some(TestLanguage::Python));
        assert_eq!(DefaultIdentifier.identify(&both), Some(TestLanguage::Kcl));
        assert_eq!(DefaultIdentifier.identify(&neither), None);
    }

    #[test]
    fn test_parse_language() {
        assert_eq!("KCL".parse::<TestLanguage>().unwrap(), TestLanguage::Kcl);
        assert_eq!("python".parse::<TestLanguage>().unwrap(), TestLanguage::Python);
        assert!("go".parse::<TestLanguage>().is_err());
    }
}
