//! Wire types for the Firestore REST API.
//!
//! Firestore encodes every field value as a single-key object
//! (`{"stringValue": "..."}`, `{"integerValue": "42"}`); integers travel as
//! strings. Only the value kinds this service stores are modeled.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Value {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub string_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integer_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub double_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boolean_value: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_value: Option<String>,
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Value {
            string_value: Some(s.into()),
            ..Default::default()
        }
    }

    pub fn integer(i: i64) -> Self {
        Value {
            integer_value: Some(i.to_string()),
            ..Default::default()
        }
    }

    pub fn double(f: f64) -> Self {
        Value {
            double_value: Some(f),
            ..Default::default()
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.string_value.as_deref()
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.integer_value
            .as_deref()
            .and_then(|s| s.parse().ok())
            .or_else(|| self.double_value.map(|f| f as i64))
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.double_value.or_else(|| {
            self.integer_value
                .as_deref()
                .and_then(|s| s.parse::<i64>().ok())
                .map(|i| i as f64)
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Full resource path. Absent when creating (the id goes in the URL).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub fields: HashMap<String, Value>,
}

impl Document {
    pub fn new(fields: HashMap<String, Value>) -> Self {
        Document { name: None, fields }
    }

    pub fn named(name: String, fields: HashMap<String, Value>) -> Self {
        Document {
            name: Some(name),
            fields,
        }
    }

    /// Trailing path segment of the resource name, i.e. the document id.
    pub fn id(&self) -> Option<&str> {
        self.name
            .as_deref()
            .and_then(|name| name.rsplit('/').next())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDocumentsResponse {
    #[serde(default)]
    pub documents: Vec<Document>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CommitRequest {
    pub writes: Vec<Write>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Write {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update: Option<Document>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<DocumentTransform>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_document: Option<Precondition>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentTransform {
    pub document: String,
    pub field_transforms: Vec<FieldTransform>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldTransform {
    pub field_path: String,
    pub increment: Value,
}

#[derive(Debug, Serialize)]
pub struct Precondition {
    pub exists: bool,
}
