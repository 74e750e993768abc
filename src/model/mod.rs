//! Typed wire model for the workspace API.
//!
//! Property values and schema entries arrive keyed by a `type` discriminator.
//! They decode into tagged enums so callers match exhaustively instead of
//! probing untyped JSON bags with runtime casts.

use indexmap::IndexMap;
use serde::Deserialize;

/// A single text run. Only the flattened plain text is consumed; styling and
/// link payloads on the run are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RichText {
    #[serde(default)]
    pub plain_text: String,
}

/// Reference to another page inside a relation property value.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RelationRef {
    pub id: String,
}

/// Where a page lives: inside a database, under another page, or at the
/// workspace root. The two id-carrying variants are mutually exclusive on
/// the wire.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Parent {
    DatabaseId { database_id: String },
    PageId { page_id: String },
    Workspace,
    #[serde(other)]
    Other,
}

/// Option payload for select-style properties.
#[derive(Debug, Clone, Deserialize)]
pub struct SelectOption {
    pub name: String,
}

/// A property value on a page, discriminated by the wire `type` field.
///
/// The variants the graph engine consumes (title, relation) carry full
/// payloads; the rest are decoded for display and anything unknown folds
/// into `Other`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PropertyValue {
    Title {
        #[serde(default)]
        title: Vec<RichText>,
    },
    RichText {
        #[serde(default)]
        rich_text: Vec<RichText>,
    },
    Relation {
        #[serde(default)]
        relation: Vec<RelationRef>,
    },
    Select {
        select: Option<SelectOption>,
    },
    MultiSelect {
        #[serde(default)]
        multi_select: Vec<SelectOption>,
    },
    Number {
        number: Option<f64>,
    },
    Checkbox {
        checkbox: bool,
    },
    Url {
        url: Option<String>,
    },
    #[serde(other)]
    Other,
}

/// A page: opaque id, parent reference, ordered map of typed properties.
///
/// Exactly one property is title-typed; its name varies per database and is
/// discovered by scanning, never assumed.
#[derive(Debug, Clone, Deserialize)]
pub struct Page {
    pub id: String,
    pub parent: Parent,
    #[serde(default)]
    pub properties: IndexMap<String, PropertyValue>,
    #[serde(default)]
    pub archived: bool,
}

/// Target declaration carried by a relation schema entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RelationTarget {
    pub database_id: Option<String>,
}

/// Database schema entry, discriminated by `type`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PropertySchema {
    Title,
    Relation {
        #[serde(default)]
        relation: RelationTarget,
    },
    #[serde(other)]
    Other,
}

/// A database: a typed container of pages sharing a schema.
#[derive(Debug, Clone, Deserialize)]
pub struct Database {
    pub id: String,
    #[serde(default)]
    pub title: Vec<RichText>,
    #[serde(default)]
    pub properties: IndexMap<String, PropertySchema>,
}

/// Paginated list envelope returned by the query and search endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct PageList {
    #[serde(default)]
    pub results: Vec<Page>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}
