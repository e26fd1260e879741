use crate::edge_style::EdgeStyle;
use crate::perimeter::Perimeter;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;

/// Value a style name can resolve to.
#[derive(Debug, Clone)]
pub enum StyleValue {
    EdgeStyle(EdgeStyle),
    Perimeter(Perimeter),
}

type DynamicResolver = Box<dyn Fn(&str) -> Option<StyleValue>>;

/// Maps `edgeStyle`, `loopStyle` and `perimeter` names to implementations.
///
/// Names missing from the table resolve to nothing unless the caller opts in
/// to the dynamic resolver.
pub struct StyleRegistry {
    values: HashMap<String, StyleValue>,
    dynamic: Option<DynamicResolver>,
}

impl fmt::Debug for StyleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.values.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("StyleRegistry")
            .field("values", &names)
            .field("dynamic", &self.dynamic.is_some())
            .finish()
    }
}

static BUILTINS: Lazy<HashMap<&'static str, StyleValue>> = Lazy::new(|| {
    let edge_styles = EdgeStyle::builtins()
        .into_iter()
        .map(|(name, style)| (name, StyleValue::EdgeStyle(style)));
    let perimeters = Perimeter::builtins()
        .into_iter()
        .map(|(name, perimeter)| (name, StyleValue::Perimeter(perimeter)));
    edge_styles.chain(perimeters).collect()
});

impl Default for StyleRegistry {
    fn default() -> Self {
        Self {
            values: BUILTINS
                .iter()
                .map(|(name, value)| (name.to_string(), value.clone()))
                .collect(),
            dynamic: None,
        }
    }
}

impl StyleRegistry {
    /// Registry preloaded with the built-in edge styles and perimeters.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn empty() -> Self {
        Self {
            values: HashMap::new(),
            dynamic: None,
        }
    }

    pub fn put_value(&mut self, name: impl Into<String>, value: StyleValue) {
        self.values.insert(name.into(), value);
    }

    pub fn put_edge_style(&mut self, name: impl Into<String>, style: EdgeStyle) {
        self.put_value(name, StyleValue::EdgeStyle(style));
    }

    pub fn put_perimeter(&mut self, name: impl Into<String>, perimeter: Perimeter) {
        self.put_value(name, StyleValue::Perimeter(perimeter));
    }

    pub fn value(&self, name: &str) -> Option<&StyleValue> {
        self.values.get(name)
    }

    /// Installs the fallback consulted for unknown names when evaluation is
    /// allowed.
    pub fn set_dynamic_resolver(&mut self, resolver: impl Fn(&str) -> Option<StyleValue> + 'static) {
        self.dynamic = Some(Box::new(resolver));
    }

    fn lookup(&self, name: &str, allow_eval: bool) -> Option<StyleValue> {
        if let Some(value) = self.values.get(name) {
            return Some(value.clone());
        }
        if !allow_eval {
            return None;
        }
        let resolver = self.dynamic.as_ref()?;
        tracing::debug!(name, "consulting dynamic style resolver");
        resolver(name)
    }

    pub fn edge_style(&self, name: &str, allow_eval: bool) -> Option<EdgeStyle> {
        match self.lookup(name, allow_eval)? {
            StyleValue::EdgeStyle(style) => Some(style),
            StyleValue::Perimeter(_) => None,
        }
    }

    pub fn perimeter(&self, name: &str, allow_eval: bool) -> Option<Perimeter> {
        match self.lookup(name, allow_eval)? {
            StyleValue::Perimeter(perimeter) => Some(perimeter),
            StyleValue::EdgeStyle(_) => None,
        }
    }
}
