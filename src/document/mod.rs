//! Editable JSONC Document
//!
//! Lossless parse tree for project files. Every object member and array
//! element keeps the whitespace and comments around it, and string and number
//! literals keep their raw text, so anything that is not edited serializes
//! back byte-for-byte.
//!
//! Supported edits: delete a member, drop or replace an array element,
//! collapse an empty container.

mod parse;

pub use parse::ParseError;

use std::fmt;

/// A parsed project file
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Trivia before the root value (including a byte order mark, if any)
    leading: String,
    root: Value,
    /// Trivia after the root value
    trailing: String,
}

impl Document {
    /// Parse JSON text, accepting comments and trailing commas
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        parse::parse_document(text)
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Value {
        &mut self.root
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.leading)?;
        write!(f, "{}", self.root)?;
        f.write_str(&self.trailing)
    }
}

/// Any JSON value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Object(Object),
    Array(Array),
    String(JsonString),
    Number(Number),
    Bool(bool),
    Null,
}

impl Value {
    /// Short name of the value's kind, for error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Object(_) => "object",
            Value::Array(_) => "array",
            Value::String(_) => "string",
            Value::Number(_) => "number",
            Value::Bool(_) => "boolean",
            Value::Null => "null",
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut Object> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Array> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Decoded string contents
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.value()),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(n.value()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Object(obj) => write!(f, "{}", obj),
            Value::Array(arr) => write!(f, "{}", arr),
            Value::String(s) => f.write_str(&s.raw),
            Value::Number(n) => f.write_str(&n.raw),
            Value::Bool(true) => f.write_str("true"),
            Value::Bool(false) => f.write_str("false"),
            Value::Null => f.write_str("null"),
        }
    }
}

/// String literal: raw source text (with quotes and escapes) plus decoded value
#[derive(Debug, Clone, PartialEq)]
pub struct JsonString {
    raw: String,
    value: String,
}

impl JsonString {
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }
}

/// Number literal: raw source text plus parsed value
#[derive(Debug, Clone, PartialEq)]
pub struct Number {
    raw: String,
    value: f64,
}

impl Number {
    /// Literal with a single decimal digit (`0.0`, `1.0`), the way the editor
    /// writes whole-valued floats
    pub fn canonical(value: f64) -> Self {
        Self {
            raw: format!("{:.1}", value),
            value,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }
}

/// `"key": value` inside an object, with its surrounding trivia
#[derive(Debug, Clone, PartialEq)]
struct Member {
    leading: String,
    key: JsonString,
    before_colon: String,
    after_colon: String,
    value: Value,
    /// Trivia between the value and its comma
    trailing: String,
}

/// JSON object; members stay in declaration order
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    members: Vec<Member>,
    /// Trivia before the closing brace
    close: String,
    trailing_comma: bool,
}

impl Object {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Value of the first member with this key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.members
            .iter()
            .find(|m| m.key.value == key)
            .map(|m| &m.value)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.members
            .iter_mut()
            .find(|m| m.key.value == key)
            .map(|m| &mut m.value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.members.iter().any(|m| m.key.value == key)
    }

    /// Members as `(key, value)` pairs, in declaration order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.members.iter().map(|m| (m.key.value.as_str(), &m.value))
    }

    pub fn entries_mut(&mut self) -> impl Iterator<Item = (&str, &mut Value)> {
        self.members
            .iter_mut()
            .map(|m| (m.key.value.as_str(), &mut m.value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|m| m.key.value.as_str())
    }

    /// Delete the first member with this key, along with its trivia and comma.
    /// If it was the first member, its leading trivia passes to the next one.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let index = self.members.iter().position(|m| m.key.value == key)?;
        let member = self.members.remove(index);
        if index == 0 {
            if let Some(next) = self.members.first_mut() {
                next.leading = member.leading;
            }
        }
        if self.members.is_empty() {
            self.trailing_comma = false;
        }
        Some(member.value)
    }

    /// Keep only the members for which `keep` returns `Ok(true)`, preserving
    /// the relative order of survivors. Stops visiting on the first error.
    ///
    /// Returns the number of members removed.
    pub fn try_retain<E>(
        &mut self,
        mut keep: impl FnMut(&str, &mut Value) -> Result<bool, E>,
    ) -> Result<usize, E> {
        let before = self.members.len();
        let first_leading = self.members.first().map(|m| m.leading.clone());
        let mut first_kept = true;
        let mut index = 0;
        let mut failure = None;
        self.members.retain_mut(|m| {
            let current = index;
            index += 1;
            if failure.is_some() {
                return true;
            }
            match keep(&m.key.value, &mut m.value) {
                Ok(kept) => {
                    if current == 0 {
                        first_kept = kept;
                    }
                    kept
                }
                Err(e) => {
                    failure = Some(e);
                    true
                }
            }
        });
        if !first_kept {
            if let (Some(first), Some(leading)) = (self.members.first_mut(), first_leading) {
                first.leading = leading;
            }
        }
        if self.members.is_empty() {
            self.trailing_comma = false;
        }
        match failure {
            Some(e) => Err(e),
            None => Ok(before - self.members.len()),
        }
    }

    /// Collapse to `{}` if there are no members left
    pub fn compact_if_empty(&mut self) -> bool {
        if !self.members.is_empty() {
            return false;
        }
        self.close.clear();
        self.trailing_comma = false;
        true
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        let last = self.members.len().saturating_sub(1);
        for (i, m) in self.members.iter().enumerate() {
            f.write_str(&m.leading)?;
            f.write_str(&m.key.raw)?;
            f.write_str(&m.before_colon)?;
            f.write_str(":")?;
            f.write_str(&m.after_colon)?;
            write!(f, "{}", m.value)?;
            f.write_str(&m.trailing)?;
            if i < last || self.trailing_comma {
                f.write_str(",")?;
            }
        }
        f.write_str(&self.close)?;
        f.write_str("}")
    }
}

/// Array element with its surrounding trivia
#[derive(Debug, Clone, PartialEq)]
struct Element {
    leading: String,
    value: Value,
    trailing: String,
}

/// JSON array
#[derive(Debug, Clone, PartialEq)]
pub struct Array {
    elements: Vec<Element>,
    /// Trivia before the closing bracket
    close: String,
    trailing_comma: bool,
}

impl Array {
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.elements.get(index).map(|e| &e.value)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Value> {
        self.elements.get_mut(index).map(|e| &mut e.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.elements.iter().map(|e| &e.value)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Value> {
        self.elements.iter_mut().map(|e| &mut e.value)
    }

    /// Remove the element at `index`. Panics if out of bounds, like `Vec::remove`.
    pub fn remove(&mut self, index: usize) -> Value {
        let element = self.elements.remove(index);
        if index == 0 {
            if let Some(next) = self.elements.first_mut() {
                next.leading = element.leading;
            }
        }
        if self.elements.is_empty() {
            self.trailing_comma = false;
        }
        element.value
    }

    /// Swap in a new value at `index`, keeping the element's trivia.
    /// Returns the old value, or `None` if out of bounds.
    pub fn replace(&mut self, index: usize, value: Value) -> Option<Value> {
        let element = self.elements.get_mut(index)?;
        Some(std::mem::replace(&mut element.value, value))
    }

    /// Keep only the elements for which `keep` returns `Ok(true)`, preserving
    /// the relative order of survivors. Stops visiting on the first error.
    ///
    /// Returns the number of elements removed.
    pub fn try_retain<E>(
        &mut self,
        mut keep: impl FnMut(usize, &mut Value) -> Result<bool, E>,
    ) -> Result<usize, E> {
        let before = self.elements.len();
        let first_leading = self.elements.first().map(|e| e.leading.clone());
        let mut first_kept = true;
        let mut failure = None;
        let mut index = 0;
        self.elements.retain_mut(|e| {
            let current = index;
            index += 1;
            if failure.is_some() {
                return true;
            }
            match keep(current, &mut e.value) {
                Ok(kept) => {
                    if current == 0 {
                        first_kept = kept;
                    }
                    kept
                }
                Err(err) => {
                    failure = Some(err);
                    true
                }
            }
        });
        // The new first element sits right after the bracket, not after a comma
        if !first_kept {
            if let (Some(first), Some(leading)) = (self.elements.first_mut(), first_leading) {
                first.leading = leading;
            }
        }
        if self.elements.is_empty() {
            self.trailing_comma = false;
        }
        match failure {
            Some(e) => Err(e),
            None => Ok(before - self.elements.len()),
        }
    }

    /// Collapse to `[]` if there are no elements left
    pub fn compact_if_empty(&mut self) -> bool {
        if !self.elements.is_empty() {
            return false;
        }
        self.close.clear();
        self.trailing_comma = false;
        true
    }
}

impl fmt::Display for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        let last = self.elements.len().saturating_sub(1);
        for (i, e) in self.elements.iter().enumerate() {
            f.write_str(&e.leading)?;
            write!(f, "{}", e.value)?;
            f.write_str(&e.trailing)?;
            if i < last || self.trailing_comma {
                f.write_str(",")?;
            }
        }
        f.write_str(&self.close)?;
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROJECT: &str = r#"{
    // scene graph
    "objects": {
        "1": {
            "name": "Root",
            "translation": [0, 0.5, 1e-7],
            "components": [null, {"type": "mesh"}]
        }
    },
    "files": [ ],
    "settings": {"a": 1, /* inline */ "b": true,}
}
"#;

    fn parse(text: &str) -> Document {
        Document::parse(text).unwrap()
    }

    fn object<'a>(doc: &'a mut Document, key: &str) -> &'a mut Object {
        doc.root_mut()
            .as_object_mut()
            .unwrap()
            .get_mut(key)
            .unwrap()
            .as_object_mut()
            .unwrap()
    }

    #[test]
    fn test_round_trip_is_lossless() {
        let doc = parse(PROJECT);
        assert_eq!(doc.to_string(), PROJECT);
    }

    #[test]
    fn test_lookup_and_decode() {
        let doc = parse(PROJECT);
        let root = doc.root().as_object().unwrap();
        let keys: Vec<_> = root.keys().collect();
        assert_eq!(keys, vec!["objects", "files", "settings"]);

        let obj = root.get("objects").unwrap().as_object().unwrap();
        let entry = obj.get("1").unwrap().as_object().unwrap();
        assert_eq!(entry.get("name").unwrap().as_str(), Some("Root"));

        let translation = entry.get("translation").unwrap().as_array().unwrap();
        assert_eq!(translation.len(), 3);
        assert_eq!(translation.get(1).unwrap().as_f64(), Some(0.5));
        assert_eq!(translation.get(2).unwrap().as_f64(), Some(1e-7));

        let components = entry.get("components").unwrap().as_array().unwrap();
        assert!(components.get(0).unwrap().is_null());
    }

    #[test]
    fn test_remove_last_member_keeps_layout() {
        let mut doc = parse("{\n    \"a\": 1,\n    \"b\": 2\n}");
        doc.root_mut().as_object_mut().unwrap().remove("b");
        assert_eq!(doc.to_string(), "{\n    \"a\": 1\n}");
    }

    #[test]
    fn test_remove_first_member_keeps_layout() {
        let mut doc = parse("{\n    \"a\": 1,\n    \"b\": 2\n}");
        doc.root_mut().as_object_mut().unwrap().remove("a");
        assert_eq!(doc.to_string(), "{\n    \"b\": 2\n}");
    }

    #[test]
    fn test_remove_first_in_compact_layout() {
        let mut doc = parse(r#"{"a": 1, "b": [10, 20, 30]}"#);
        let obj = doc.root_mut().as_object_mut().unwrap();
        obj.get_mut("b").unwrap().as_array_mut().unwrap().remove(0);
        obj.remove("a");
        assert_eq!(doc.to_string(), r#"{"b": [20, 30]}"#);
    }

    #[test]
    fn test_object_try_retain_drops_first_member() {
        let mut doc = parse(r#"{ "a": 1, "b": 2, "c": 3 }"#);
        let obj = doc.root_mut().as_object_mut().unwrap();
        let removed = obj.try_retain(|key, _| Ok::<_, ()>(key != "a")).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(doc.to_string(), r#"{ "b": 2, "c": 3 }"#);
    }

    #[test]
    fn test_remove_first_keeps_leading_comment() {
        let mut doc = parse("[
    // items
    1,
    2
]");
        doc.root_mut().as_array_mut().unwrap().remove(0);
        assert_eq!(doc.to_string(), "[
    // items
    2
]");
    }

    #[test]
    fn test_remove_missing_key() {
        let mut doc = parse(r#"{"a": 1}"#);
        assert!(doc.root_mut().as_object_mut().unwrap().remove("z").is_none());
        assert_eq!(doc.to_string(), r#"{"a": 1}"#);
    }

    #[test]
    fn test_trailing_comma_survives_removal() {
        let mut doc = parse(PROJECT);
        let settings = object(&mut doc, "settings");
        settings.remove("b");
        assert!(doc.to_string().contains(r#""settings": {"a": 1,}"#));

        let settings = object(&mut doc, "settings");
        settings.remove("a");
        assert!(settings.compact_if_empty());
        assert!(doc.to_string().contains(r#""settings": {}"#));
    }

    #[test]
    fn test_compact_if_empty_only_when_empty() {
        let mut doc = parse("{\"a\": {\n\n}, \"b\": {\"c\": 1}}");
        assert!(object(&mut doc, "a").compact_if_empty());
        assert!(!object(&mut doc, "b").compact_if_empty());
        assert_eq!(doc.to_string(), "{\"a\": {}, \"b\": {\"c\": 1}}");
    }

    #[test]
    fn test_array_compact_if_empty() {
        let mut doc = parse(PROJECT);
        let files = doc
            .root_mut()
            .as_object_mut()
            .unwrap()
            .get_mut("files")
            .unwrap()
            .as_array_mut()
            .unwrap();
        assert!(files.compact_if_empty());
        assert!(doc.to_string().contains(r#""files": [],"#));
    }

    #[test]
    fn test_replace_keeps_trivia() {
        let mut doc = parse("[ 1e-9 , 2 ]");
        let arr = doc.root_mut().as_array_mut().unwrap();
        let old = arr.replace(0, Value::Number(Number::canonical(0.0)));
        assert_eq!(old.and_then(|v| v.as_f64()), Some(1e-9));
        assert!(arr.replace(7, Value::Null).is_none());
        assert_eq!(doc.to_string(), "[ 0.0 , 2 ]");
    }

    #[test]
    fn test_array_try_retain_preserves_order() {
        let mut doc = parse("[1, 2, 3, 4, 5]");
        let arr = doc.root_mut().as_array_mut().unwrap();
        let removed = arr
            .try_retain(|_, v| Ok::<_, ()>(v.as_f64().unwrap() as i64 % 2 == 1))
            .unwrap();
        assert_eq!(removed, 2);
        assert_eq!(doc.to_string(), "[1, 3, 5]");
    }

    #[test]
    fn test_array_try_retain_passes_original_indices() {
        let mut doc = parse("[10, 20, 30]");
        let arr = doc.root_mut().as_array_mut().unwrap();
        let mut seen = Vec::new();
        arr.try_retain(|i, _| {
            seen.push(i);
            Ok::<_, ()>(i != 0)
        })
        .unwrap();
        assert_eq!(seen, vec![0, 1, 2]);
        assert_eq!(doc.to_string(), "[20, 30]");
    }

    #[test]
    fn test_try_retain_stops_on_error() {
        let mut doc = parse(r#"{"a": 1, "b": 2, "c": 3}"#);
        let obj = doc.root_mut().as_object_mut().unwrap();
        let mut visited = Vec::new();
        let result = obj.try_retain(|key, _| {
            visited.push(key.to_string());
            if key == "b" {
                Err("boom")
            } else {
                Ok(false)
            }
        });
        assert_eq!(result, Err("boom"));
        assert_eq!(visited, vec!["a", "b"]);
        assert_eq!(obj.len(), 2);
    }

    #[test]
    fn test_remove_every_element() {
        let mut doc = parse("[\n  null,\n  null,\n]");
        let arr = doc.root_mut().as_array_mut().unwrap();
        arr.remove(1);
        arr.remove(0);
        assert!(arr.is_empty());
        assert_eq!(doc.to_string(), "[\n]");
    }

    #[test]
    fn test_canonical_literals() {
        assert_eq!(Number::canonical(0.0).raw(), "0.0");
        assert_eq!(Number::canonical(1.0).raw(), "1.0");
    }
}
