//! Typed operations over the remote client, plus the pure projections the
//! graph engine builds on: title extraction and relation-property scanning.

use serde_json::json;

use crate::api::Remote;
use crate::error::Result;
use crate::model::{Database, Page, PageList, PropertySchema, PropertyValue, RelationRef};

/// Typed view of the workspace API: one method per endpoint, each decoding
/// into the model types. Holds the remote client as an explicit dependency.
pub struct Workspace<R> {
    remote: R,
}

impl<R: Remote> Workspace<R> {
    pub fn new(remote: R) -> Self {
        Self { remote }
    }

    /// Fetch a single page by id.
    pub async fn page(&self, id: &str) -> Result<Page> {
        let raw = self.remote.get(&format!("pages/{}", id)).await?;
        Ok(serde_json::from_value(raw)?)
    }

    /// Fetch a database (schema container) by id.
    pub async fn database(&self, id: &str) -> Result<Database> {
        let raw = self.remote.get(&format!("databases/{}", id)).await?;
        Ok(serde_json::from_value(raw)?)
    }

    /// Query a single page of a database's entries. Deliberately no
    /// exhaustive pagination: callers pass the bound they are willing to scan.
    pub async fn query_database(&self, id: &str, page_size: usize) -> Result<Vec<Page>> {
        let raw = self
            .remote
            .post(
                &format!("databases/{}/query", id),
                json!({ "page_size": page_size }),
            )
            .await?;
        let list: PageList = serde_json::from_value(raw)?;
        Ok(list.results)
    }

    /// Full-text search restricted to pages, single bounded page of results.
    pub async fn search_pages(&self, query: &str, page_size: usize) -> Result<Vec<Page>> {
        let raw = self
            .remote
            .post(
                "search",
                json!({
                    "query": query,
                    "filter": { "property": "object", "value": "page" },
                    "page_size": page_size,
                }),
            )
            .await?;
        let list: PageList = serde_json::from_value(raw)?;
        Ok(list.results)
    }

    /// Partial update writing exactly one relation property. Every other
    /// property on the page is untouched by construction of the body.
    pub async fn update_relation(&self, page_id: &str, property: &str, ids: &[String]) -> Result<Page> {
        let refs: Vec<_> = ids.iter().map(|id| json!({ "id": id })).collect();
        let body = json!({ "properties": { property: { "relation": refs } } });
        let raw = self.remote.patch(&format!("pages/{}", page_id), body).await?;
        Ok(serde_json::from_value(raw)?)
    }
}

/// Resolve a page's display title.
///
/// The title-typed property's name varies per database, so the property map
/// is scanned for the single title entry and its text runs are concatenated
/// in order. A page with no title property, or an empty run list, resolves
/// to `"Untitled"`.
pub fn title(page: &Page) -> String {
    for value in page.properties.values() {
        if let PropertyValue::Title { title } = value {
            if title.is_empty() {
                break;
            }
            return title.iter().map(|run| run.plain_text.as_str()).collect();
        }
    }
    "Untitled".to_string()
}

/// Relation-typed schema entries that declare a target collection, as
/// (property name, target database id) pairs in schema declaration order.
pub fn relation_properties(db: &Database) -> Vec<(String, String)> {
    db.properties
        .iter()
        .filter_map(|(name, schema)| match schema {
            PropertySchema::Relation { relation } => relation
                .database_id
                .as_ref()
                .map(|target| (name.clone(), target.clone())),
            _ => None,
        })
        .collect()
}

/// Relation-typed property values on a page: (property name, references).
pub fn page_relations(page: &Page) -> Vec<(&str, &[RelationRef])> {
    page.properties
        .iter()
        .filter_map(|(name, value)| match value {
            PropertyValue::Relation { relation } => Some((name.as_str(), relation.as_slice())),
            _ => None,
        })
        .collect()
}

/// Current reference ids for a named relation property, or `None` when the
/// property is absent or not relation-typed.
pub fn relation_ids(page: &Page, property: &str) -> Option<Vec<String>> {
    match page.properties.get(property) {
        Some(PropertyValue::Relation { relation }) => {
            Some(relation.iter().map(|r| r.id.clone()).collect())
        }
        _ => None,
    }
}
