//! JSON document shape shared by both problem-details revisions.
//!
//! The five standard members are emitted first and every extension is flattened into the
//! same object. An extension whose key collides with a standard member is dropped: the
//! standard member always wins.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// `type` value meaning "no semantics beyond the status code".
pub const ABOUT_BLANK: &str = "about:blank";

const STANDARD_MEMBERS: [&str; 5] = ["type", "title", "status", "detail", "instance"];

fn is_standard_member(key: &str) -> bool {
    STANDARD_MEMBERS.contains(&key)
}

/// Borrowed view over a problem document, used for serialization.
pub struct DocumentRef<'a> {
    pub type_url: &'a str,
    pub title: &'a str,
    pub status: u16,
    pub detail: &'a str,
    pub instance: &'a str,
    pub extensions: &'a Map<String, Value>,
}

impl DocumentRef<'_> {
    fn overlay(&self) -> impl Iterator<Item = (&String, &Value)> + Clone {
        self.extensions
            .iter()
            .filter(|(key, _)| !is_standard_member(key))
    }

    pub fn to_value(&self) -> Value {
        let mut object = Map::with_capacity(STANDARD_MEMBERS.len() + self.extensions.len());
        for (key, value) in self.overlay() {
            object.insert(key.clone(), value.clone());
        }
        object.insert("type".to_owned(), Value::from(self.type_url));
        object.insert("title".to_owned(), Value::from(self.title));
        object.insert("status".to_owned(), Value::from(self.status));
        object.insert("detail".to_owned(), Value::from(self.detail));
        object.insert("instance".to_owned(), Value::from(self.instance));
        Value::Object(object)
    }

    /// Compact JSON text with the standard members first, then the extensions.
    pub fn to_json_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.to_value().to_string())
    }
}

impl Serialize for DocumentRef<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let overlay = self.overlay();
        let mut map =
            serializer.serialize_map(Some(STANDARD_MEMBERS.len() + overlay.clone().count()))?;
        map.serialize_entry("type", self.type_url)?;
        map.serialize_entry("title", self.title)?;
        map.serialize_entry("status", &self.status)?;
        map.serialize_entry("detail", self.detail)?;
        map.serialize_entry("instance", self.instance)?;
        for (key, value) in overlay {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

fn about_blank() -> String {
    ABOUT_BLANK.to_owned()
}

/// Owned problem document as read from the wire. Unknown members become extensions.
#[derive(Debug, Deserialize)]
pub struct RawDocument {
    #[serde(rename = "type", default = "about_blank")]
    pub type_url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: u16,
    #[serde(default)]
    pub detail: String,
    #[serde(default)]
    pub instance: String,
    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}
