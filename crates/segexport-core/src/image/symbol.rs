use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::config::format;

/// Where a symbol's name came from.
///
/// Only `Default` names (placeholders such as `FUN_00102a40` that the
/// analysis host invents) are left out of the export.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SymbolSource {
    Default,
    Analysis,
    Imported,
    #[default]
    UserDefined,
}

/// A named address of interest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub address: u64,
    pub name: String,
    #[serde(default)]
    pub source: SymbolSource,
}

impl Symbol {
    pub fn new(address: u64, name: impl Into<String>, source: SymbolSource) -> Self {
        Self {
            address,
            name: name.into(),
            source,
        }
    }

    /// A symbol with an explicit, user-assigned name.
    pub fn user(address: u64, name: impl Into<String>) -> Self {
        Self::new(address, name, SymbolSource::UserDefined)
    }

    /// A placeholder symbol invented by the analysis host.
    pub fn generated(address: u64, name: impl Into<String>) -> Self {
        Self::new(address, name, SymbolSource::Default)
    }

    pub fn is_default_generated(&self) -> bool {
        self.source == SymbolSource::Default
    }

    /// Size of this symbol's entry in the container's symbol table.
    pub fn entry_size(&self) -> usize {
        format::SYMBOL_ENTRY_OVERHEAD + self.name.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_generated() {
        assert!(Symbol::generated(0x2010, "FUN_2010").is_default_generated());
        assert!(!Symbol::user(0x1050, "init_fn").is_default_generated());
        assert!(!Symbol::new(0x10, "malloc", SymbolSource::Imported).is_default_generated());
        assert!(!Symbol::new(0x10, "sub", SymbolSource::Analysis).is_default_generated());
    }

    #[test]
    fn test_entry_size_counts_utf8_bytes() {
        assert_eq!(Symbol::user(0x1050, "init_fn").entry_size(), 16);
        // "héllo" is 6 bytes in UTF-8
        assert_eq!(Symbol::user(0, "héllo").entry_size(), 15);
        assert_eq!(Symbol::user(0, "").entry_size(), 9);
    }

    #[test]
    fn test_source_serde() {
        let symbol: Symbol =
            serde_json::from_str(r#"{"address": 16, "name": "f", "source": "imported"}"#).unwrap();
        assert_eq!(symbol.source, SymbolSource::Imported);

        let symbol: Symbol = serde_json::from_str(r#"{"address": 16, "name": "f"}"#).unwrap();
        assert_eq!(symbol.source, SymbolSource::UserDefined);
    }

    #[test]
    fn test_source_display() {
        assert_eq!(SymbolSource::UserDefined.to_string(), "user_defined");
        assert_eq!("default".parse::<SymbolSource>().unwrap(), SymbolSource::Default);
    }
}
