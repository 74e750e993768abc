//! In-memory stand-in for the workspace API, used by the engine tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::api::Remote;
use crate::error::{PagelinkError, Result};

/// Route-mapped fake: GET paths resolve from a map, POST routes from another,
/// PATCH bodies are recorded and folded back into the stored page so
/// follow-up reads observe the write.
#[derive(Default)]
pub struct FakeRemote {
    gets: Mutex<HashMap<String, Value>>,
    posts: HashMap<String, Value>,
    missing: HashSet<String>,
    patches: Mutex<Vec<(String, Value)>>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `value` for `GET pages/{id}`; the id is read from the fixture.
    pub fn with_page(self, value: Value) -> Self {
        let id = value["id"].as_str().expect("page fixture needs an id").to_string();
        self.gets
            .lock()
            .unwrap()
            .insert(format!("pages/{}", id), value);
        self
    }

    /// Serve `value` for `GET databases/{id}`.
    pub fn with_database(self, value: Value) -> Self {
        let id = value["id"]
            .as_str()
            .expect("database fixture needs an id")
            .to_string();
        self.gets
            .lock()
            .unwrap()
            .insert(format!("databases/{}", id), value);
        self
    }

    /// Serve `results` (a JSON array of pages) for `POST databases/{id}/query`.
    pub fn with_query(mut self, database_id: &str, results: Value) -> Self {
        self.posts.insert(
            format!("databases/{}/query", database_id),
            json!({ "results": results }),
        );
        self
    }

    /// Serve `results` (a JSON array of pages) for `POST search`.
    pub fn with_search(mut self, results: Value) -> Self {
        self.posts
            .insert("search".to_string(), json!({ "results": results }));
        self
    }

    /// Make `path` fail: NotFound for GETs, a 403 API error for POSTs.
    pub fn with_missing(mut self, path: &str) -> Self {
        self.missing.insert(path.to_string());
        self
    }

    pub fn patch_count(&self) -> usize {
        self.patches.lock().unwrap().len()
    }

    pub fn patch_bodies(&self) -> Vec<(String, Value)> {
        self.patches.lock().unwrap().clone()
    }
}

#[async_trait]
impl Remote for FakeRemote {
    async fn get(&self, path: &str) -> Result<Value> {
        if self.missing.contains(path) {
            return Err(PagelinkError::NotFound(path.to_string()));
        }
        self.gets
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| PagelinkError::NotFound(path.to_string()))
    }

    async fn post(&self, path: &str, _body: Value) -> Result<Value> {
        if self.missing.contains(path) {
            return Err(PagelinkError::Api {
                status: 403,
                message: "restricted".to_string(),
            });
        }
        self.posts
            .get(path)
            .cloned()
            .ok_or_else(|| PagelinkError::NotFound(path.to_string()))
    }

    async fn patch(&self, path: &str, body: Value) -> Result<Value> {
        self.patches
            .lock()
            .unwrap()
            .push((path.to_string(), body.clone()));

        let mut gets = self.gets.lock().unwrap();
        let page = gets
            .get_mut(path)
            .ok_or_else(|| PagelinkError::NotFound(path.to_string()))?;
        if let Some(props) = body.get("properties").and_then(Value::as_object) {
            for (name, value) in props {
                let slot = &mut page["properties"][name];
                if let Some(fields) = value.as_object() {
                    for (key, field) in fields {
                        slot[key] = field.clone();
                    }
                }
            }
        }
        Ok(page.clone())
    }
}

/// Page fixture living in `database_id`, with a `Name` title property and
/// the given relation properties.
pub fn page_fixture(id: &str, database_id: &str, title: &str, relations: &[(&str, &[&str])]) -> Value {
    let mut properties = serde_json::Map::new();
    properties.insert(
        "Name".to_string(),
        json!({ "type": "title", "title": [{ "plain_text": title }] }),
    );
    for (name, ids) in relations {
        let refs: Vec<Value> = ids.iter().map(|id| json!({ "id": id })).collect();
        properties.insert(
            (*name).to_string(),
            json!({ "type": "relation", "relation": refs }),
        );
    }
    json!({
        "id": id,
        "parent": { "type": "database_id", "database_id": database_id },
        "properties": properties
    })
}

/// Database fixture with a title schema entry plus the given relation schema
/// entries as (property name, target database id).
pub fn database_fixture(id: &str, title: &str, relations: &[(&str, &str)]) -> Value {
    let mut properties = serde_json::Map::new();
    properties.insert("Name".to_string(), json!({ "type": "title", "title": {} }));
    for (name, target) in relations {
        properties.insert(
            (*name).to_string(),
            json!({ "type": "relation", "relation": { "database_id": target } }),
        );
    }
    json!({
        "id": id,
        "title": [{ "plain_text": title }],
        "properties": properties
    })
}
