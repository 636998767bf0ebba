//! Operation registry: name → tool lookup table.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::app::AppInfo;
use crate::tool::{HandlerRef, Tool};

/// Outcome of a single registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Inserted,
    /// The name was already bound to the same tool object.
    AlreadyPresent,
    /// The name was bound to a different tool; the original binding is kept.
    Conflict,
}

/// Name → tool table with first-registration-wins semantics.
pub struct Registry<S> {
    by_name: HashMap<String, Arc<Tool<S>>>,
}

impl<S> Default for Registry<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Registry<S> {
    pub fn new() -> Self {
        Self {
            by_name: HashMap::new(),
        }
    }

    /// Build the table from every registration source of an app:
    /// tag value capabilities, declared tools with the handlers their context
    /// actions reference, then extra handlers.
    pub fn from_app(app: &AppInfo<S>) -> Self {
        let mut registry = Self::new();

        for tag_type in &app.tag_values {
            let capabilities = [
                tag_type.search_tool(),
                tag_type.match_tool(),
                tag_type.load_tool(),
                tag_type.context_action_tool(),
            ];
            for tool in capabilities.into_iter().flatten() {
                registry.add(tool.clone());
            }
        }

        for tool in &app.tools {
            registry.add(tool.clone());
            for action in tool.context_actions() {
                // Name-only references must resolve through another source.
                if let Some(HandlerRef::Tool(handler)) = &action.handler {
                    registry.add(handler.clone());
                }
            }
        }

        for tool in &app.handlers {
            registry.add(tool.clone());
        }

        registry
    }

    /// Bind `name` to `tool` unless it is already bound to a different tool.
    pub fn register(&mut self, name: &str, tool: Arc<Tool<S>>) -> Registration {
        match self.by_name.get(name) {
            Some(existing) if Arc::ptr_eq(existing, &tool) => Registration::AlreadyPresent,
            Some(_) => {
                warn!(op_name = %name, "conflicting handler registration ignored; keeping the first");
                Registration::Conflict
            }
            None => {
                debug!(op_name = %name, "registered handler");
                self.by_name.insert(name.to_string(), tool);
                Registration::Inserted
            }
        }
    }

    /// Register a tool under its own name.
    pub fn add(&mut self, tool: Arc<Tool<S>>) -> Registration {
        let name = tool.name().to_string();
        self.register(&name, tool)
    }

    pub fn resolve(&self, name: &str) -> Option<&Arc<Tool<S>>> {
        self.by_name.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// All registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.by_name.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
