//! Typed node properties.
//!
//! Nodes describe their configurable values with static [`PropertyDescriptor`]s.
//! Every incoming [`PropertyValue`] passes through [`PropertyDescriptor::coerce`]
//! before a node sees it, so nodes only ever store in-range values.

use serde::{Deserialize, Serialize};

/// A property value as exchanged with callers and stored in graph documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    String(String),
    /// Index into the descriptor's option list.
    Choice(usize),
}

impl PropertyValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_choice(&self) -> Option<usize> {
        match self {
            PropertyValue::Choice(v) => Some(*v),
            _ => None,
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::Bool(_) => "bool",
            PropertyValue::Int(_) => "int",
            PropertyValue::String(_) => "string",
            PropertyValue::Choice(_) => "choice",
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        PropertyValue::Bool(v)
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        PropertyValue::Int(v)
    }
}

impl From<i32> for PropertyValue {
    fn from(v: i32) -> Self {
        PropertyValue::Int(v as i64)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::String(v.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        PropertyValue::String(v)
    }
}

/// The type and range of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Bool,
    /// Integer clamped to `[min, max]`.
    Int { min: i64, max: i64 },
    String,
    /// One of a fixed list of options.
    Choice { options: &'static [&'static str] },
}

/// Static description of one property of a node kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyDescriptor {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: PropertyKind,
}

impl PropertyDescriptor {
    pub const fn new(key: &'static str, label: &'static str, kind: PropertyKind) -> Self {
        Self { key, label, kind }
    }

    /// Validate `value` against this descriptor. Integers are clamped into
    /// range; choices may be given by index or by option name.
    pub fn coerce(&self, value: PropertyValue) -> Result<PropertyValue, String> {
        match (self.kind, value) {
            (PropertyKind::Bool, v @ PropertyValue::Bool(_)) => Ok(v),
            (PropertyKind::String, v @ PropertyValue::String(_)) => Ok(v),
            (PropertyKind::Int { min, max }, PropertyValue::Int(v)) => Ok(PropertyValue::Int(v.clamp(min, max))),
            (PropertyKind::Choice { options }, PropertyValue::Choice(i)) => {
                if i < options.len() {
                    Ok(PropertyValue::Choice(i))
                } else {
                    Err(format!("choice {} out of range (0..{})", i, options.len()))
                }
            }
            (PropertyKind::Choice { options }, PropertyValue::Int(i)) => usize::try_from(i)
                .ok()
                .filter(|&i| i < options.len())
                .map(PropertyValue::Choice)
                .ok_or_else(|| format!("choice {} out of range (0..{})", i, options.len())),
            (PropertyKind::Choice { options }, PropertyValue::String(name)) => options
                .iter()
                .position(|o| o.eq_ignore_ascii_case(&name))
                .map(PropertyValue::Choice)
                .ok_or_else(|| format!("'{}' is not one of {:?}", name, options)),
            (kind, v) => Err(format!("expected {:?}, got {}", kind, v.type_name())),
        }
    }
}

/// A descriptor together with the node's current value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub descriptor: PropertyDescriptor,
    pub value: PropertyValue,
}

#[cfg(test)]
mod tests {
    use super::*;

    const RADIUS: PropertyDescriptor =
        PropertyDescriptor::new("radius", "Search radius", PropertyKind::Int { min: 0, max: 7 });
    const MODE: PropertyDescriptor = PropertyDescriptor::new(
        "mode",
        "Mode",
        PropertyKind::Choice {
            options: &["4:4:4", "4:2:2", "4:2:0"],
        },
    );

    #[test]
    fn test_int_is_clamped() {
        assert_eq!(RADIUS.coerce(PropertyValue::Int(12)), Ok(PropertyValue::Int(7)));
        assert_eq!(RADIUS.coerce(PropertyValue::Int(-3)), Ok(PropertyValue::Int(0)));
        assert_eq!(RADIUS.coerce(PropertyValue::Int(4)), Ok(PropertyValue::Int(4)));
    }

    #[test]
    fn test_choice_by_index_or_name() {
        assert_eq!(MODE.coerce(PropertyValue::Choice(1)), Ok(PropertyValue::Choice(1)));
        assert_eq!(MODE.coerce("4:2:0".into()), Ok(PropertyValue::Choice(2)));
        assert_eq!(MODE.coerce(PropertyValue::Int(1)), Ok(PropertyValue::Choice(1)));
        assert!(MODE.coerce(PropertyValue::Choice(3)).is_err());
        assert!(MODE.coerce(PropertyValue::Int(-1)).is_err());
        assert!(MODE.coerce("4:1:1".into()).is_err());
    }

    #[test]
    fn test_wrong_type_rejected() {
        assert!(RADIUS.coerce(PropertyValue::Bool(true)).is_err());
        assert!(MODE.coerce(PropertyValue::Bool(false)).is_err());
    }

    #[test]
    fn test_accessors() {
        assert_eq!(PropertyValue::Bool(true).as_bool(), Some(true));
        assert_eq!(PropertyValue::Int(42).as_int(), Some(42));
        assert_eq!(PropertyValue::from("hello").as_str(), Some("hello"));
        assert_eq!(PropertyValue::Choice(2).as_choice(), Some(2));
        assert_eq!(PropertyValue::Int(1).as_str(), None);
    }
}
