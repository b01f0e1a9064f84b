use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::tag::TraceTag;

/// A decoded field value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldValue {
  /// Any fixed-width unsigned scalar, widened to 64 bits.
  Uint(u64),
  /// Text read from the NUL-terminated tail of a frame.
  Text(String),
}

impl FieldValue {
  pub fn as_uint(&self) -> Option<u64> {
    match self {
      Self::Uint(v) => Some(*v),
      Self::Text(_) => None,
    }
  }

  pub fn as_text(&self) -> Option<&str> {
    match self {
      Self::Text(s) => Some(s),
      Self::Uint(_) => None,
    }
  }
}

impl fmt::Display for FieldValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Uint(v) => write!(f, "{v}"),
      Self::Text(s) => write!(f, "{s:?}"),
    }
  }
}

impl Serialize for FieldValue {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    match self {
      Self::Uint(v) => serializer.serialize_u64(*v),
      Self::Text(s) => serializer.serialize_str(s),
    }
  }
}

/// One fully decoded trace event.
///
/// Fields are kept in declaration order. For text-bearing tags the text
/// sits first, where the firmware's string pointer was, followed by the
/// remaining fixed fields.
///
/// ```text
/// Mark_Init      →  time, heap
/// Def_Task       →  handle (text), instance
/// Debug_Message  →  message (text)
/// ```
///
/// A `Record` is built in one piece by the decoder and never mutated
/// afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
  tag: TraceTag,
  fields: Vec<(&'static str, FieldValue)>,
}

impl Record {
  pub fn new(tag: TraceTag, fields: Vec<(&'static str, FieldValue)>) -> Self {
    Self { tag, fields }
  }

  pub fn tag(&self) -> TraceTag {
    self.tag
  }

  /// The tag's firmware name, e.g. `Mark_Init`.
  pub fn name(&self) -> &'static str {
    self.tag.name()
  }

  /// Ordered `(name, value)` pairs, excluding the tag itself.
  pub fn fields(&self) -> &[(&'static str, FieldValue)] {
    &self.fields
  }

  pub fn get(&self, name: &str) -> Option<&FieldValue> {
    self
      .fields
      .iter()
      .find(|(field, _)| *field == name)
      .map(|(_, value)| value)
  }

  pub fn uint(&self, name: &str) -> Option<u64> {
    self.get(name).and_then(FieldValue::as_uint)
  }

  pub fn text(&self, name: &str) -> Option<&str> {
    self.get(name).and_then(FieldValue::as_text)
  }

  /// The trailing text of a definition or debug record.
  pub fn payload_text(&self) -> Option<&str> {
    if !self.tag.carries_text() {
      return None;
    }
    self.fields.first().and_then(|(_, value)| value.as_text())
  }

  /// Timestamp of a mark record.
  pub fn time(&self) -> Option<u64> {
    self.uint("time")
  }
}

/// Serializes as a flat JSON object in field order:
///
/// ```json
/// {"name": "Mark_Init", "tag": 3, "time": 1000, "heap": 512}
/// ```
impl Serialize for Record {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(self.fields.len() + 2))?;
    map.serialize_entry("name", self.name())?;
    map.serialize_entry("tag", &self.tag.wire_value())?;
    for (name, value) in &self.fields {
      map.serialize_entry(name, value)?;
    }
    map.end()
  }
}

impl fmt::Display for Record {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())?;
    for (name, value) in &self.fields {
      write!(f, " {name}={value}")?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn mark_init() -> Record {
    Record::new(
      TraceTag::MarkInit,
      vec![("time", FieldValue::Uint(1000)), ("heap", FieldValue::Uint(512))],
    )
  }

  #[test]
  fn lookups_by_name() {
    let record = mark_init();
    assert_eq!(record.name(), "Mark_Init");
    assert_eq!(record.time(), Some(1000));
    assert_eq!(record.uint("heap"), Some(512));
    assert_eq!(record.get("missing"), None);
    assert_eq!(record.payload_text(), None);
  }

  #[test]
  fn json_keeps_field_order() {
    let json = serde_json::to_string(&mark_init()).unwrap();
    assert_eq!(json, r#"{"name":"Mark_Init","tag":3,"time":1000,"heap":512}"#);
  }

  #[test]
  fn text_record_display_and_json() {
    let record = Record::new(
      TraceTag::DefTask,
      vec![
        ("handle", FieldValue::Text("blink".into())),
        ("instance", FieldValue::Uint(2)),
      ],
    );
    assert_eq!(record.payload_text(), Some("blink"));
    assert_eq!(record.to_string(), r#"Def_Task handle="blink" instance=2"#);
    assert_eq!(
      serde_json::to_string(&record).unwrap(),
      r#"{"name":"Def_Task","tag":0,"handle":"blink","instance":2}"#
    );
  }
}
