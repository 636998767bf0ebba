//! Tag value types: resolvable categories of domain values.
//!
//! A [`TagValueType`] (for example "Country") exposes up to four capabilities
//! to the host UI. Each capability is an ordinary [`Tool`] registered under
//! its own name and dispatched like any other operation:
//!
//! | Capability    | Input                          | Output                         |
//! |---------------|--------------------------------|--------------------------------|
//! | Load          | none                           | `{info, entries: [[k, l]..]}`  |
//! | Match         | `{value}`                      | `{entry: [k, l] \| null}`      |
//! | Search        | `{query}`                      | `{info, entries: [[k, l]..]}`  |
//! | ContextAction | `{value: TagValue?, info, ..}` | `{name, args}`                 |

use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::HandlerError;
use crate::field::{DTypeRef, Field};
use crate::tool::{ContextAction, HandlerRef, Tool};

/// A `(key, label)` pair, serialized as a two-element array.
pub type Entry = (String, String);

fn unknown() -> String {
    "?".to_string()
}

/// Canonical resolved form of a tag value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagValue {
    #[serde(default = "unknown")]
    pub id: String,
    #[serde(default = "unknown")]
    pub label: String,
}

impl TagValue {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

impl Default for TagValue {
    fn default() -> Self {
        Self {
            id: unknown(),
            label: unknown(),
        }
    }
}

// =============================================================================
// Capability inputs
// =============================================================================

/// Input of a Load handler.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoadRequest {}

impl LoadRequest {
    pub fn fields() -> Vec<Field> {
        Vec::new()
    }
}

/// Input of a Match handler.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatchRequest {
    #[serde(default)]
    pub value: String,
}

impl MatchRequest {
    pub fn fields() -> Vec<Field> {
        vec![
            Field::string("value")
                .title("Value")
                .description("The substring to search")
                .default(""),
        ]
    }
}

/// Input of a Search handler.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: String,
}

impl SearchRequest {
    pub fn fields() -> Vec<Field> {
        vec![
            Field::string("query")
                .title("Query")
                .description("The substring to match")
                .default(""),
        ]
    }
}

/// Input of a ContextAction handler.
///
/// `value` is `None` when the UI asks for the default action; any extra keys
/// the UI sends are kept in `extra`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContextActionRequest {
    pub value: Option<TagValue>,
    #[serde(default)]
    pub info: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ContextActionRequest {
    pub fn fields() -> Vec<Field> {
        vec![
            Field::tag_value("value")
                .description("the selected value")
                .optional(),
            Field::object("info")
                .title("Info")
                .description("the info that was clicked")
                .default(json!({})),
        ]
    }
}

// =============================================================================
// Capability outputs
// =============================================================================

#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadResponse {
    pub info: Option<Value>,
    pub entries: Vec<Entry>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MatchResponse {
    pub entry: Option<Entry>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchResponse {
    pub info: Option<Value>,
    pub entries: Vec<Entry>,
}

/// Follow-up tool invocation produced by a context action.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ContextActionResponse {
    pub name: Option<String>,
    pub args: Map<String, Value>,
}

// =============================================================================
// Capability tool constructors
// =============================================================================

/// Build a Load tool named `name`.
pub fn load_handler<S, F, Fut>(name: impl Into<String>, f: F) -> Arc<Tool<S>>
where
    S: Send + Sync + 'static,
    F: Fn(LoadRequest, Arc<S>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<LoadResponse, HandlerError>> + Send + 'static,
{
    Tool::builder(name).fields(LoadRequest::fields()).handler(f)
}

/// Build a Match tool named `name`.
pub fn match_handler<S, F, Fut>(name: impl Into<String>, f: F) -> Arc<Tool<S>>
where
    S: Send + Sync + 'static,
    F: Fn(MatchRequest, Arc<S>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<MatchResponse, HandlerError>> + Send + 'static,
{
    Tool::builder(name).fields(MatchRequest::fields()).handler(f)
}

/// Build a Search tool named `name`.
pub fn search_handler<S, F, Fut>(name: impl Into<String>, f: F) -> Arc<Tool<S>>
where
    S: Send + Sync + 'static,
    F: Fn(SearchRequest, Arc<S>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<SearchResponse, HandlerError>> + Send + 'static,
{
    Tool::builder(name).fields(SearchRequest::fields()).handler(f)
}

/// Build a ContextAction tool named `name`.
pub fn context_action_handler<S, F, Fut>(name: impl Into<String>, f: F) -> Arc<Tool<S>>
where
    S: Send + Sync + 'static,
    F: Fn(ContextActionRequest, Arc<S>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ContextActionResponse, HandlerError>> + Send + 'static,
{
    Tool::builder(name)
        .fields(ContextActionRequest::fields())
        .handler(f)
}

// =============================================================================
// Tag value type
// =============================================================================

/// A resolvable category of values, unique by `(ns, name)`.
pub struct TagValueType<S> {
    ns: String,
    name: String,
    icon: String,
    title: String,
    description: String,
    entries: Option<Vec<Entry>>,
    load: Option<Arc<Tool<S>>>,
    search: Option<Arc<Tool<S>>>,
    matcher: Option<Arc<Tool<S>>>,
    context_action: Option<Arc<Tool<S>>>,
}

impl<S> Clone for TagValueType<S> {
    fn clone(&self) -> Self {
        Self {
            ns: self.ns.clone(),
            name: self.name.clone(),
            icon: self.icon.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            entries: self.entries.clone(),
            load: self.load.clone(),
            search: self.search.clone(),
            matcher: self.matcher.clone(),
            context_action: self.context_action.clone(),
        }
    }
}

impl<S> std::fmt::Debug for TagValueType<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TagValueType")
            .field("ns", &self.ns)
            .field("name", &self.name)
            .field("icon", &self.icon)
            .finish_non_exhaustive()
    }
}

impl<S> TagValueType<S> {
    pub fn new(ns: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            ns: ns.into(),
            name: name.into(),
            icon: "question".to_string(),
            title: "Field".to_string(),
            description: "a tag value".to_string(),
            entries: None,
            load: None,
            search: None,
            matcher: None,
            context_action: None,
        }
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Static entry list published in the manifest.
    pub fn entries(mut self, entries: Vec<Entry>) -> Self {
        self.entries = Some(entries);
        self
    }

    pub fn load(mut self, tool: Arc<Tool<S>>) -> Self {
        self.load = Some(tool);
        self
    }

    pub fn search(mut self, tool: Arc<Tool<S>>) -> Self {
        self.search = Some(tool);
        self
    }

    pub fn matcher(mut self, tool: Arc<Tool<S>>) -> Self {
        self.matcher = Some(tool);
        self
    }

    pub fn context_action(mut self, tool: Arc<Tool<S>>) -> Self {
        self.context_action = Some(tool);
        self
    }

    pub fn ns(&self) -> &str {
        &self.ns
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn icon_name(&self) -> &str {
        &self.icon
    }

    pub fn static_entries(&self) -> Option<&[Entry]> {
        self.entries.as_deref()
    }

    pub fn load_tool(&self) -> Option<&Arc<Tool<S>>> {
        self.load.as_ref()
    }

    pub fn search_tool(&self) -> Option<&Arc<Tool<S>>> {
        self.search.as_ref()
    }

    pub fn match_tool(&self) -> Option<&Arc<Tool<S>>> {
        self.matcher.as_ref()
    }

    pub fn context_action_tool(&self) -> Option<&Arc<Tool<S>>> {
        self.context_action.as_ref()
    }

    pub fn dtype_ref(&self) -> DTypeRef {
        DTypeRef::new(&self.ns, &self.name)
    }

    /// A string field bound to this type, titled and described like the type.
    pub fn to_field(&self, name: impl Into<String>) -> Field {
        Field::string(name)
            .title(&self.title)
            .description(&self.description)
            .default("?")
            .dtype(self.dtype_ref())
    }

    /// A context action targeting this type, handled by its ContextAction tool.
    pub fn to_context_action(&self, info: Option<Value>) -> ContextAction<S> {
        ContextAction {
            target: self.dtype_ref(),
            handler: self.context_action.clone().map(HandlerRef::Tool),
            info,
        }
    }

    /// Marker embedding a resolved value of this type in tool result data.
    pub fn to_data_tag(&self, key: &str, label: &str) -> Value {
        json!(["tv", [self.ns, self.name, key, label]])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_value_fills_unknowns() {
        let tv: TagValue = serde_json::from_value(json!({"id": "FRA"})).unwrap();
        assert_eq!(tv, TagValue::new("FRA", "?"));
        assert_eq!(TagValue::default(), TagValue::new("?", "?"));
    }

    #[test]
    fn context_action_request_keeps_extra_keys() {
        let req: ContextActionRequest = serde_json::from_value(json!({
            "value": {"id": "ESP", "label": "Spain"},
            "info": {"x": 1},
            "source": "map"
        }))
        .unwrap();
        assert_eq!(req.value.unwrap().id, "ESP");
        assert_eq!(req.info["x"], 1);
        assert_eq!(req.extra["source"], "map");
    }

    #[test]
    fn responses_use_pair_entries() {
        let load = LoadResponse {
            info: None,
            entries: vec![("FRA".into(), "France".into())],
        };
        assert_eq!(
            serde_json::to_value(load).unwrap(),
            json!({"info": null, "entries": [["FRA", "France"]]})
        );
        assert_eq!(
            serde_json::to_value(MatchResponse::default()).unwrap(),
            json!({"entry": null})
        );
    }

    #[test]
    fn to_field_binds_the_type() {
        let country: TagValueType<()> = TagValueType::new("demo", "Country")
            .title("Country")
            .description("Country Name");
        let field = country.to_field("country");
        assert_eq!(field.label(), "Country");
        assert_eq!(field.dtype_ref(), Some(&DTypeRef::new("demo", "Country")));
        assert_eq!(field.schema()["default"], "?");
    }

    #[test]
    fn to_context_action_points_at_handler() {
        let handler = context_action_handler("CountryAction", |_req, _state: Arc<()>| async {
            Ok(ContextActionResponse::default())
        });
        let country = TagValueType::new("demo", "Country").context_action(handler);
        let action = country.to_context_action(None);
        assert_eq!(action.target, DTypeRef::new("demo", "Country"));
        assert_eq!(action.handler.unwrap().name(), "CountryAction");

        let bare: TagValueType<()> = TagValueType::new("demo", "Region");
        assert!(bare.to_context_action(None).handler.is_none());
    }

    #[tokio::test]
    async fn search_tool_defaults_query_and_filters() {
        let search = search_handler("SearchColors", |req: SearchRequest, _: Arc<()>| async move {
            let entries = ["red", "green", "blue"]
                .into_iter()
                .filter(|c| c.contains(req.query.as_str()))
                .map(|c| (c.to_string(), c.to_uppercase()))
                .collect();
            Ok(SearchResponse { info: None, entries })
        });

        let args = search.prepare_args(Map::new()).unwrap();
        assert_eq!(args["query"], "");
        let all = search.call(args, Arc::new(())).await.unwrap();
        assert_eq!(all["entries"].as_array().unwrap().len(), 3);

        let mut args = Map::new();
        args.insert("query".into(), json!("re"));
        let args = search.prepare_args(args).unwrap();
        let some = search.call(args, Arc::new(())).await.unwrap();
        assert_eq!(
            some,
            json!({"info": null, "entries": [["red", "RED"], ["green", "GREEN"]]})
        );
    }

    #[test]
    fn data_tag_shape() {
        let country: TagValueType<()> = TagValueType::new("demo", "Country");
        assert_eq!(
            country.to_data_tag("FRA", "France"),
            json!(["tv", ["demo", "Country", "FRA", "France"]])
        );
    }
}
