//! Read-only tool registry.

use std::collections::HashMap;

use super::catalog::{ToolDefinition, ToolSpec};
use super::opera;
use crate::types::{Error, Result};

/// Name → definition, built once at startup. Keeps declaration order for listing.
#[derive(Debug)]
pub struct ToolRegistry {
    tools: Vec<ToolDefinition>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Compile every spec. Duplicate names and bad specs are `ConfigError`s.
    pub fn new(specs: impl IntoIterator<Item = ToolSpec>) -> Result<Self> {
        let mut tools = Vec::new();
        let mut index = HashMap::new();
        for spec in specs {
            let tool = ToolDefinition::compile(spec)?;
            if index.contains_key(&tool.name) {
                return Err(Error::config(format!("duplicate tool name: {}", tool.name)));
            }
            index.insert(tool.name.clone(), tools.len());
            tools.push(tool);
        }
        Ok(Self { tools, index })
    }

    /// The OPERA Cloud endpoint catalogue.
    pub fn opera() -> Result<Self> {
        Self::new(opera::catalogue())
    }

    pub fn resolve(&self, name: &str) -> Result<&ToolDefinition> {
        self.get(name).ok_or_else(|| Error::unknown_tool(name))
    }

    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Definitions in declaration order.
    pub fn list_tools(&self) -> &[ToolDefinition] {
        &self.tools
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::catalog::{HttpMethod, ParamDef, ParamType, HOTEL_ID_PARAM};

    fn spec(name: &str) -> ToolSpec {
        ToolSpec::new(name, HttpMethod::Get, "/hotels/{hotelId}", "test tool")
            .param(ParamDef::path(HOTEL_ID_PARAM, ParamType::Identifier, "Hotel"))
    }

    #[test]
    fn test_resolve_and_unknown() {
        let registry = ToolRegistry::new(vec![spec("a"), spec("b")]).unwrap();
        assert_eq!(registry.resolve("b").unwrap().name, "b");
        let err = registry.resolve("does-not-exist").unwrap_err();
        assert!(matches!(err, Error::UnknownTool(ref n) if n == "does-not-exist"));
    }

    #[test]
    fn test_duplicate_name_is_config_error() {
        let err = ToolRegistry::new(vec![spec("a"), spec("a")]).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_declaration_order_preserved() {
        let registry = ToolRegistry::new(vec![spec("zulu"), spec("alpha"), spec("mike")]).unwrap();
        assert_eq!(registry.names(), vec!["zulu", "alpha", "mike"]);
    }

    #[test]
    fn test_opera_catalogue_compiles() {
        let registry = ToolRegistry::opera().unwrap();
        assert!(registry.len() >= 20);
        for name in [
            "search_reservations",
            "get_reservation",
            "create_reservation",
            "cancel_reservation",
            "check_room_availability",
            "get_guest_profile",
            "check_in_guest",
            "update_room_status",
            "get_guest_folio",
        ] {
            assert!(registry.contains(name), "missing {}", name);
        }
    }
}
