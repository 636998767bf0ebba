//! Manifest document consumed by the host UI.
//!
//! Built once from an [`AppInfo`] and served verbatim for every `info`
//! action. Field names and fragment shapes are a wire contract.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::app::AppInfo;
use crate::field::Field;
use crate::registry::Registry;
use crate::tag_value::{Entry, TagValueType};
use crate::tool::{ContextAction, Tool};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub ns: String,
    pub title: String,
    pub tag_values: Option<IndexMap<String, TagValueFragment>>,
    pub tools: IndexMap<String, ToolFragment>,
    pub handlers: Vec<String>,
}

/// Manifest entry for one tag value type. Absent handler ids mean the UI must
/// not offer that capability.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagValueFragment {
    pub icon: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entries: Option<Vec<Entry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_entries_handler_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_handler_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_handler_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolFragment {
    pub title: String,
    pub schema: SchemaFragment,
    pub ui: UiFragment,
    pub examples: Vec<String>,
    pub context_actions: Vec<ContextActionFragment>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SchemaFragment {
    pub fields: IndexMap<String, Value>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UiFragment {
    pub prefix: String,
    pub args: IndexMap<String, UiArg>,
    pub manual_update: bool,
}

/// UI rendering hint for one argument.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum UiArg {
    /// Plain text box with a label.
    Label(String),
    /// Type-aware picker for a tag value bound field.
    DType {
        from: String,
        prefix: String,
        #[serde(rename = "dtypeNs")]
        dtype_ns: String,
        #[serde(rename = "dtypeName")]
        dtype_name: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextActionFragment {
    #[serde(rename = "for")]
    pub target: DTypeFragment,
    pub handler: Option<String>,
    pub info: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DTypeFragment {
    pub ns: String,
    pub name: String,
}

impl Manifest {
    /// Build the manifest for `app`; `registry` supplies the handler names.
    pub fn build<S>(app: &AppInfo<S>, registry: &Registry<S>) -> Self {
        let tag_values = if app.tag_values.is_empty() {
            None
        } else {
            Some(
                app.tag_values
                    .iter()
                    .map(|t| (t.name().to_string(), TagValueFragment::from_type(t)))
                    .collect(),
            )
        };

        let tools = app
            .tools
            .iter()
            .map(|t| (t.name().to_string(), ToolFragment::from_tool(t, &app.ns)))
            .collect();

        Self {
            ns: app.ns.clone(),
            title: app.title.clone(),
            tag_values,
            tools,
            handlers: registry.names(),
        }
    }
}

impl TagValueFragment {
    pub fn from_type<S>(tag_type: &TagValueType<S>) -> Self {
        Self {
            icon: tag_type.icon_name().to_string(),
            entries: tag_type.static_entries().map(<[Entry]>::to_vec),
            load_entries_handler_id: tag_type.load_tool().map(|t| t.name().to_string()),
            search_handler_id: tag_type.search_tool().map(|t| t.name().to_string()),
            match_handler_id: tag_type.match_tool().map(|t| t.name().to_string()),
        }
    }
}

impl ToolFragment {
    /// `ns` is the fallback namespace for bound fields that declare none.
    pub fn from_tool<S>(tool: &Tool<S>, ns: &str) -> Self {
        let fields = tool
            .fields()
            .iter()
            .map(|f| (f.name().to_string(), f.schema()))
            .collect();

        let args = tool
            .fields()
            .iter()
            .map(|f| (f.name().to_string(), UiArg::for_field(f, ns)))
            .collect();

        Self {
            title: tool.title().to_string(),
            schema: SchemaFragment { fields },
            ui: UiFragment {
                prefix: tool.ui_prefix().to_string(),
                args,
                manual_update: tool.manual_update(),
            },
            examples: tool.examples(),
            context_actions: tool
                .context_actions()
                .iter()
                .map(|a| ContextActionFragment::from_action(a, ns))
                .collect(),
        }
    }
}

impl UiArg {
    fn for_field(field: &Field, ns: &str) -> Self {
        match field.dtype_ref() {
            Some(dtype) => UiArg::DType {
                from: field.name().to_string(),
                prefix: field.label().to_string(),
                dtype_ns: dtype.ns.clone().unwrap_or_else(|| ns.to_string()),
                dtype_name: dtype.name.clone(),
            },
            None => UiArg::Label(field.label().to_string()),
        }
    }
}

impl ContextActionFragment {
    fn from_action<S>(action: &ContextAction<S>, ns: &str) -> Self {
        Self {
            target: DTypeFragment {
                ns: action.target.ns.clone().unwrap_or_else(|| ns.to_string()),
                name: action.target.name.clone(),
            },
            handler: action.handler.as_ref().map(|h| h.name().to_string()),
            info: action.info.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::{Map, json};

    use super::*;
    use crate::error::HandlerError;
    use crate::field::DTypeRef;
    use crate::tag_value::{ContextActionResponse, MatchResponse, context_action_handler, match_handler};

    fn country_type() -> TagValueType<()> {
        let matcher = match_handler("MatchCountry", |_, _: Arc<()>| async {
            Ok(MatchResponse::default())
        });
        let action = context_action_handler("CountryAction", |_, _: Arc<()>| async {
            Ok(ContextActionResponse::default())
        });
        TagValueType::new("demo", "Country")
            .icon("flag")
            .title("Country")
            .description("Country Name")
            .matcher(matcher)
            .context_action(action)
    }

    fn info_box(country: &TagValueType<()>) -> Arc<Tool<()>> {
        Tool::builder("CountryInfoBox")
            .title("Country Information")
            .ui_prefix("Information for")
            .field(country.to_field("country").default("BRA"))
            .field(Field::integer("year").title("Year"))
            .field(Field::string("unit"))
            .context_action(country.to_context_action(None))
            .handler(|_: Map<String, Value>, _| async { Ok::<_, HandlerError>(json!({})) })
    }

    fn manifest() -> Value {
        let country = country_type();
        let app = AppInfo::new("demo", "Demo", ())
            .tool(info_box(&country))
            .tag_value(country);
        let registry = Registry::from_app(&app);
        serde_json::to_value(Manifest::build(&app, &registry)).unwrap()
    }

    #[test]
    fn top_level_shape() {
        let m = manifest();
        assert_eq!(m["ns"], "demo");
        assert_eq!(m["title"], "Demo");
        assert!(m["tagValues"].is_object());
        assert!(m["tools"].is_object());
        assert_eq!(
            m["handlers"],
            json!(["CountryAction", "CountryInfoBox", "MatchCountry"])
        );
    }

    #[test]
    fn tag_value_fragment_lists_only_configured_capabilities() {
        let m = manifest();
        let country = &m["tagValues"]["Country"];
        assert_eq!(
            country,
            &json!({"icon": "flag", "matchHandlerId": "MatchCountry"})
        );
    }

    #[test]
    fn tool_fragment_shape() {
        let m = manifest();
        let tool = &m["tools"]["CountryInfoBox"];
        assert_eq!(tool["title"], "Country Information");
        assert_eq!(tool["ui"]["prefix"], "Information for");
        assert_eq!(tool["ui"]["manualUpdate"], false);
        assert_eq!(tool["examples"], json!(["Show Country Information"]));
        assert_eq!(tool["ui"]["args"]["year"], "Year");
        assert_eq!(tool["ui"]["args"]["unit"], "unit");
        assert_eq!(tool["schema"]["fields"]["country"]["default"], "BRA");
        assert_eq!(tool["schema"]["fields"]["year"]["type"], "integer");
    }

    #[test]
    fn fields_keep_declaration_order() {
        let m = manifest();
        let tool = &m["tools"]["CountryInfoBox"];
        for section in [&tool["schema"]["fields"], &tool["ui"]["args"]] {
            let names: Vec<&String> = section.as_object().unwrap().keys().collect();
            assert_eq!(names, vec!["country", "year", "unit"]);
        }
    }

    #[test]
    fn bound_field_matches_registered_type() {
        let m = manifest();
        assert_eq!(
            m["tools"]["CountryInfoBox"]["ui"]["args"]["country"],
            json!({
                "from": "country",
                "prefix": "Country",
                "dtypeNs": "demo",
                "dtypeName": "Country"
            })
        );
    }

    #[test]
    fn bound_field_without_namespace_uses_app_namespace() {
        let field = Field::string("region").dtype(DTypeRef {
            ns: None,
            name: "Region".into(),
        });
        assert_eq!(
            UiArg::for_field(&field, "geo"),
            UiArg::DType {
                from: "region".into(),
                prefix: "region".into(),
                dtype_ns: "geo".into(),
                dtype_name: "Region".into(),
            }
        );
    }

    #[test]
    fn context_action_without_namespace_uses_app_namespace() {
        let action: ContextAction<()> = ContextAction {
            target: DTypeRef {
                ns: None,
                name: "Region".into(),
            },
            handler: Some("RegionAction".into()),
            info: None,
        };
        assert_eq!(
            ContextActionFragment::from_action(&action, "geo"),
            ContextActionFragment {
                target: DTypeFragment {
                    ns: "geo".into(),
                    name: "Region".into(),
                },
                handler: Some("RegionAction".into()),
                info: None,
            }
        );
    }

    #[test]
    fn context_actions_are_normalized_to_names() {
        let m = manifest();
        assert_eq!(
            m["tools"]["CountryInfoBox"]["contextActions"],
            json!([{
                "for": {"ns": "demo", "name": "Country"},
                "handler": "CountryAction",
                "info": null
            }])
        );
    }

    #[test]
    fn empty_app_has_null_tag_values_and_empty_tools() {
        let app: AppInfo<()> = AppInfo::new("demo", "Empty", ());
        let registry = Registry::from_app(&app);
        let m = serde_json::to_value(Manifest::build(&app, &registry)).unwrap();
        assert!(m["tagValues"].is_null());
        assert_eq!(m["tools"], json!({}));
        assert_eq!(m["handlers"], json!([]));
    }
}
