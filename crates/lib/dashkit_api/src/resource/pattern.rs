//! Pattern routing for resource paths.
//!
//! A pattern is a path template with `{name}` or `{name:convertor}`
//! placeholders, e.g. `data/{country}/{year:int}.csv`:
//!
//! | Convertor | Matches                  | Parameter value |
//! |-----------|--------------------------|-----------------|
//! | `str`     | one segment (default)    | string          |
//! | `path`    | the rest, `/` included   | string          |
//! | `int`     | digits                   | integer         |
//! | `float`   | digits with decimals     | number          |
//!
//! [`PatternResources`] tries its patterns in registration order and hands
//! the converted parameters of the first full match to that route's handler.

use std::collections::HashSet;
use std::future::Future;
use std::io;

use async_trait::async_trait;
use regex::Regex;
use serde_json::{Map, Number, Value};
use thiserror::Error;
use tracing::debug;

use crate::resource::{Resource, ResourceProvider};

const PARAM_PATTERN: &str = r"\{([a-zA-Z_][a-zA-Z0-9_]*)(?::([a-zA-Z_][a-zA-Z0-9_]*))?\}";

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("unknown convertor `{convertor}` for parameter `{param}`")]
    UnknownConvertor { param: String, convertor: String },

    #[error("duplicate parameter `{0}`")]
    DuplicateParam(String),

    #[error("invalid pattern: {0}")]
    Regex(#[from] regex::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Convertor {
    Str,
    Path,
    Int,
    Float,
}

impl Convertor {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "str" => Some(Convertor::Str),
            "path" => Some(Convertor::Path),
            "int" => Some(Convertor::Int),
            "float" => Some(Convertor::Float),
            _ => None,
        }
    }

    fn regex(self) -> &'static str {
        match self {
            Convertor::Str => "[^/]+",
            Convertor::Path => ".*",
            Convertor::Int => "[0-9]+",
            Convertor::Float => r"[0-9]+(?:\.[0-9]+)?",
        }
    }

    fn convert(self, raw: &str) -> Option<Value> {
        match self {
            Convertor::Str | Convertor::Path => Some(Value::String(raw.to_string())),
            Convertor::Int => raw.parse::<i64>().ok().map(Value::from),
            Convertor::Float => raw
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number),
        }
    }
}

/// A compiled resource path template.
#[derive(Debug, Clone)]
pub struct PathPattern {
    source: String,
    regex: Regex,
    params: Vec<(String, Convertor)>,
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        let param_re = Regex::new(PARAM_PATTERN)?;
        let template = pattern.trim_start_matches('/');

        let mut regex = String::from("^");
        let mut params = Vec::new();
        let mut seen = HashSet::new();
        let mut last = 0;

        for caps in param_re.captures_iter(template) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let name = name.as_str();
            let convertor_name = caps.get(2).map_or("str", |m| m.as_str());
            let convertor =
                Convertor::from_name(convertor_name).ok_or_else(|| PatternError::UnknownConvertor {
                    param: name.to_string(),
                    convertor: convertor_name.to_string(),
                })?;
            if !seen.insert(name) {
                return Err(PatternError::DuplicateParam(name.to_string()));
            }

            regex.push_str(&regex::escape(&template[last..whole.start()]));
            regex.push_str(&format!("(?P<{name}>{})", convertor.regex()));
            params.push((name.to_string(), convertor));
            last = whole.end();
        }
        regex.push_str(&regex::escape(&template[last..]));
        regex.push('$');

        Ok(Self {
            source: pattern.to_string(),
            regex: Regex::new(&regex)?,
            params,
        })
    }

    /// The template this pattern was parsed from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Converted parameters when `path` matches the whole pattern.
    pub fn matches(&self, path: &str) -> Option<Map<String, Value>> {
        let caps = self.regex.captures(path.trim_start_matches('/'))?;
        let mut params = Map::new();
        for (name, convertor) in &self.params {
            let raw = caps.name(name)?.as_str();
            params.insert(name.clone(), convertor.convert(raw)?);
        }
        Some(params)
    }
}

/// Opens the resource for one matched route.
#[async_trait]
pub trait PathHandler: Send + Sync {
    async fn open(&self, params: Map<String, Value>) -> io::Result<Option<Resource>>;
}

#[async_trait]
impl<F, Fut> PathHandler for F
where
    F: Fn(Map<String, Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = io::Result<Option<Resource>>> + Send + 'static,
{
    async fn open(&self, params: Map<String, Value>) -> io::Result<Option<Resource>> {
        (self)(params).await
    }
}

/// Resource provider dispatching on path patterns.
#[derive(Default)]
pub struct PatternResources {
    routes: Vec<(PathPattern, Box<dyn PathHandler>)>,
}

impl std::fmt::Debug for PatternResources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.routes.iter().map(|(p, _)| p.as_str()))
            .finish()
    }
}

impl PatternResources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(
        mut self,
        pattern: &str,
        handler: impl PathHandler + 'static,
    ) -> Result<Self, PatternError> {
        self.routes.push((PathPattern::parse(pattern)?, Box::new(handler)));
        Ok(self)
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.routes.iter().map(|(p, _)| p.as_str())
    }
}

#[async_trait]
impl ResourceProvider for PatternResources {
    async fn open(&self, path: &str) -> io::Result<Option<Resource>> {
        for (pattern, handler) in &self.routes {
            if let Some(params) = pattern.matches(path) {
                debug!(pattern = %pattern.as_str(), path = %path, "resource pattern matched");
                return handler.open(params).await;
            }
        }
        Ok(None)
    }
}
