//! ABI definitions: the dynamic schema a contract publishes for its
//! action payloads. Parsed from the chain's standard ABI JSON files.

use crate::error::AbiError;
use crate::name::ActionName;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A named alias for another type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbiTypeDef {
    pub new_type_name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

/// One field of a struct definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbiFieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

/// A struct: named fields, optionally inheriting a base struct's fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbiStructDef {
    pub name: String,
    #[serde(default)]
    pub base: String,
    #[serde(default)]
    pub fields: Vec<AbiFieldDef>,
}

/// Binding from an action name to the struct type of its payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbiActionDef {
    pub name: ActionName,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub ricardian_contract: String,
}

/// A contract's ABI. Unknown sections of richer ABI files are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AbiDef {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub types: Vec<AbiTypeDef>,
    #[serde(default)]
    pub structs: Vec<AbiStructDef>,
    #[serde(default)]
    pub actions: Vec<AbiActionDef>,
}

impl AbiDef {
    pub fn from_json(json: &str) -> Result<Self, AbiError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, AbiError> {
        let raw = std::fs::read_to_string(path).map_err(|source| AbiError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    /// Payload struct type of an action, if the ABI declares it.
    pub fn action_type(&self, action: &ActionName) -> Option<&str> {
        self.actions
            .iter()
            .find(|a| a.name == *action)
            .map(|a| a.type_name.as_str())
    }

    pub fn struct_def(&self, name: &str) -> Option<&AbiStructDef> {
        self.structs.iter().find(|s| s.name == name)
    }

    /// Follow typedef aliases to the underlying type name. The hop count is
    /// bounded by the typedef table size, so alias cycles terminate.
    pub fn resolve_type<'a>(&'a self, name: &'a str) -> &'a str {
        let mut current = name;
        for _ in 0..=self.types.len() {
            match self.types.iter().find(|t| t.new_type_name == current) {
                Some(td) => current = &td.type_name,
                None => break,
            }
        }
        current
    }
}
