use function_api::FunctionRegistry;

use crate::model::ModelRegistry;

/// Service limits applied when a request leaves an option out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryDefaults {
    pub top_default: u64,
    pub top_max: u64,
    pub count_default: bool,
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self {
            top_default: 100,
            top_max: 1000,
            count_default: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParserSettings {
    /// Reads `name.Type` inside open properties as a link to an entity of
    /// that type.
    pub custom_links_enabled: bool,
    pub defaults: QueryDefaults,
}

impl ParserSettings {
    pub fn with_custom_links(mut self, enabled: bool) -> Self {
        self.custom_links_enabled = enabled;
        self
    }
}

/// Everything a parse call reads: the model, the settings and the function
/// catalog.
#[derive(Clone, Copy)]
pub struct ParseContext<'a> {
    pub registry: &'a ModelRegistry,
    pub settings: &'a ParserSettings,
    pub functions: &'a FunctionRegistry,
}

impl<'a> ParseContext<'a> {
    /// Uses the standard function catalog.
    pub fn new(registry: &'a ModelRegistry, settings: &'a ParserSettings) -> Self {
        Self {
            registry,
            settings,
            functions: stdfunc::registry(),
        }
    }

    pub fn with_functions(mut self, functions: &'a FunctionRegistry) -> Self {
        self.functions = functions;
        self
    }
}
