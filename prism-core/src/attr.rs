//! Attribute binding.
//!
//! Keeps attributes of some external element in sync with signals. The
//! element is anything implementing [`AttributeSink`]; this crate never
//! touches a DOM.
//!
//! Class lists are built with [`class_names`], which flattens strings,
//! nested lists and toggle maps into one space-separated string:
//!
//! ```rust,ignore
//! let classes = class_names(&[
//!     "btn  primary".into(),
//!     ClassValue::from_toggles([("active", true), ("disabled", false)]),
//! ]);
//! assert_eq!(classes, "btn primary active");
//! ```

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::reactive::{untrack, Effect, Readable};

/// One entry of a class list.
///
/// Deserializes from JSON: a string, an array, an object of booleans, a
/// boolean or `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClassValue {
    /// One or more whitespace-separated class names.
    Text(String),
    /// Nested entries, flattened in order.
    List(Vec<ClassValue>),
    /// Class names switched on or off.
    Toggles(IndexMap<String, bool>),
    /// Contributes nothing; stands in for conditional entries.
    Flag(bool),
    /// No entry; `null` in JSON.
    Empty,
}

impl ClassValue {
    /// Toggle map from `(class, enabled)` pairs.
    pub fn from_toggles<I, K>(toggles: I) -> Self
    where
        I: IntoIterator<Item = (K, bool)>,
        K: Into<String>,
    {
        ClassValue::Toggles(
            toggles
                .into_iter()
                .map(|(name, enabled)| (name.into(), enabled))
                .collect(),
        )
    }

    fn collect_into<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            ClassValue::Text(text) => out.extend(text.split_whitespace()),
            ClassValue::List(items) => {
                for item in items {
                    item.collect_into(out);
                }
            }
            ClassValue::Toggles(toggles) => {
                for (name, enabled) in toggles {
                    if *enabled {
                        out.extend(name.split_whitespace());
                    }
                }
            }
            ClassValue::Flag(_) | ClassValue::Empty => {}
        }
    }
}

impl From<&str> for ClassValue {
    fn from(text: &str) -> Self {
        ClassValue::Text(text.to_string())
    }
}

impl From<String> for ClassValue {
    fn from(text: String) -> Self {
        ClassValue::Text(text)
    }
}

impl<T: Into<ClassValue>> From<Vec<T>> for ClassValue {
    fn from(items: Vec<T>) -> Self {
        ClassValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<IndexMap<String, bool>> for ClassValue {
    fn from(toggles: IndexMap<String, bool>) -> Self {
        ClassValue::Toggles(toggles)
    }
}

impl<T: Into<ClassValue>> From<Option<T>> for ClassValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(ClassValue::Empty, Into::into)
    }
}

/// Join class entries into one space-separated class string.
///
/// Whitespace inside entries is collapsed and empty entries vanish.
/// Duplicates are kept.
pub fn class_names(inputs: &[ClassValue]) -> String {
    let mut names = Vec::new();
    for input in inputs {
        input.collect_into(&mut names);
    }
    names.join(" ")
}

/// Something with named string attributes.
pub trait AttributeSink: Send + Sync + 'static {
    /// Set attribute `name` to `value`, replacing any previous value.
    fn set_attribute(&self, name: &str, value: &str);
}

/// Keep attribute `name` of `sink` equal to the value of `source`.
///
/// The attribute is written immediately and after every change. The returned
/// effect stops the binding when disposed or dropped.
pub fn bind_attribute<K, S>(sink: &Arc<K>, name: impl Into<String>, source: &S) -> Effect
where
    K: AttributeSink + ?Sized,
    S: Readable,
    S::Value: AsRef<str>,
{
    let sink = Arc::clone(sink);
    let name = name.into();
    let source = source.clone();

    Effect::new(move || {
        let value = source.get();
        untrack(|| sink.set_attribute(&name, value.as_ref()));
    })
}

/// Keep the `class` attribute of `sink` equal to the merged class list of
/// `source`.
pub fn bind_classes<K, S>(sink: &Arc<K>, source: &S) -> Effect
where
    K: AttributeSink + ?Sized,
    S: Readable,
    S::Value: AsRef<[ClassValue]>,
{
    let sink = Arc::clone(sink);
    let source = source.clone();

    Effect::new(move || {
        let classes = source.with(|value| class_names(value.as_ref()));
        untrack(|| sink.set_attribute("class", &classes));
    })
}
