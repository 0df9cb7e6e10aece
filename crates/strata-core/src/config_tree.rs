//! Generic parsed key/value/sequence tree.
//!
//! Strata never reads files itself. Whatever reader the host uses (YAML, JSON,
//! a hand-written format) hands over a [`ConfigNode`] tree that keeps the
//! source line of every node so diagnostics can point back at the input.

#[derive(Clone, Debug, PartialEq)]
pub enum ConfigValue {
    Null,
    Scalar(String),
    Seq(Vec<ConfigNode>),
    /// Insertion-ordered; later duplicates shadow nothing, lookups take the first.
    Map(Vec<(String, ConfigNode)>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ConfigNode {
    pub value: ConfigValue,
    pub line: u32,
}

impl ConfigNode {
    pub fn null(line: u32) -> Self {
        Self {
            value: ConfigValue::Null,
            line,
        }
    }

    pub fn scalar(s: impl Into<String>, line: u32) -> Self {
        Self {
            value: ConfigValue::Scalar(s.into()),
            line,
        }
    }

    pub fn seq(items: Vec<ConfigNode>, line: u32) -> Self {
        Self {
            value: ConfigValue::Seq(items),
            line,
        }
    }

    pub fn map(pairs: Vec<(String, ConfigNode)>, line: u32) -> Self {
        Self {
            value: ConfigValue::Map(pairs),
            line,
        }
    }

    pub fn is_map(&self) -> bool {
        matches!(self.value, ConfigValue::Map(_))
    }

    pub fn is_seq(&self) -> bool {
        matches!(self.value, ConfigValue::Seq(_))
    }

    pub fn get(&self, key: &str) -> Option<&ConfigNode> {
        self.entries()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn entries(&self) -> &[(String, ConfigNode)] {
        match &self.value {
            ConfigValue::Map(pairs) => pairs,
            _ => &[],
        }
    }

    pub fn items(&self) -> &[ConfigNode] {
        match &self.value {
            ConfigValue::Seq(items) => items,
            _ => &[],
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            ConfigValue::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        self.as_str()?.trim().parse().ok()
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.as_str()?.trim() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        }
    }

    /// Reads up to `N` floats from a sequence. Missing trailing components are
    /// zero, except the fourth which defaults to 1 (alpha).
    pub fn as_floats<const N: usize>(&self) -> Option<[f32; N]> {
        if !self.is_seq() {
            return None;
        }
        let items = self.items();
        let mut out = [0.0; N];
        for (k, slot) in out.iter_mut().enumerate() {
            *slot = match items.get(k).and_then(|n| n.as_f32()) {
                Some(v) => v,
                None if k == 3 => 1.0,
                None => 0.0,
            };
        }
        Some(out)
    }
}

#[cfg(feature = "serde")]
impl ConfigNode {
    /// Converts a JSON value. JSON carries no line information, so nodes are
    /// numbered in pre-order starting at 1.
    pub fn from_json(v: &serde_json::Value) -> Self {
        let mut line = 0;
        Self::from_json_inner(v, &mut line)
    }

    fn from_json_inner(v: &serde_json::Value, line: &mut u32) -> Self {
        use serde_json::Value;
        *line += 1;
        let here = *line;
        match v {
            Value::Null => ConfigNode::null(here),
            Value::Bool(b) => ConfigNode::scalar(b.to_string(), here),
            Value::Number(n) => ConfigNode::scalar(n.to_string(), here),
            Value::String(s) => ConfigNode::scalar(s.clone(), here),
            Value::Array(items) => ConfigNode::seq(
                items
                    .iter()
                    .map(|i| Self::from_json_inner(i, line))
                    .collect(),
                here,
            ),
            Value::Object(obj) => ConfigNode::map(
                obj.iter()
                    .map(|(k, v)| (k.clone(), Self::from_json_inner(v, line)))
                    .collect(),
                here,
            ),
        }
    }
}
