//! Backlink resolution: find every page referencing a target by combining a
//! relation-property scan with a title search.

use std::collections::HashSet;

use serde::Serialize;

use crate::api::Remote;
use crate::error::Result;
use crate::model::{Page, Parent};
use crate::workspace::{page_relations, relation_properties, title, Workspace};

use super::{Backlink, BacklinkKind};

/// Resolution output. `skipped_databases` and `search_failed` signal partial
/// coverage: some evidence sources were unreachable and silently skipped, so
/// an empty `records` does not necessarily mean no backlinks exist.
#[derive(Debug, Clone, Serialize)]
pub struct BacklinkReport {
    pub target_id: String,
    pub target_title: String,
    pub records: Vec<Backlink>,
    pub skipped_databases: Vec<String>,
    pub search_failed: bool,
}

impl BacklinkReport {
    /// True when at least one evidence source was skipped.
    pub fn partial(&self) -> bool {
        self.search_failed || !self.skipped_databases.is_empty()
    }
}

/// Find every page referencing `target_id`, deduplicated by source id with
/// relation evidence taking precedence over textual mention. Order is
/// first-seen; a relation record is never demoted by a later mention of the
/// same source.
///
/// The relation pass only runs when the target lives in a database, and reads
/// a single page (`collection_page_size`) of each candidate collection, so
/// large collections are under-reported. The remote API has no inbound
/// reference query; this bound keeps resolution to a handful of requests.
///
/// The target fetch failing is fatal. Schema and per-collection failures are
/// swallowed per collection, and a search failure skips the mention pass;
/// both are reported through the partial-coverage fields.
pub async fn find_backlinks<R: Remote>(
    ws: &Workspace<R>,
    target_id: &str,
    collection_page_size: usize,
    search_page_size: usize,
) -> Result<BacklinkReport> {
    let target = ws.page(target_id).await?;
    let target_title = title(&target);

    let mut records: Vec<Backlink> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut skipped_databases: Vec<String> = Vec::new();

    // Relation pass: pages in the collections the target's own database
    // relates to are the candidates that can hold a typed link back to it.
    if let Parent::DatabaseId { database_id } = &target.parent {
        match ws.database(database_id).await {
            Ok(db) => {
                for (_, candidate_db) in relation_properties(&db) {
                    match ws.query_database(&candidate_db, collection_page_size).await {
                        Ok(entries) => {
                            for entry in entries {
                                let Some(matched) = relation_to(&entry, target_id) else {
                                    continue;
                                };
                                let kind = BacklinkKind::Relation {
                                    property: matched.to_string(),
                                };
                                if seen.insert(entry.id.clone()) {
                                    records.push(Backlink {
                                        source_id: entry.id.clone(),
                                        source_title: title(&entry),
                                        kind,
                                    });
                                }
                            }
                        }
                        Err(err) => {
                            log::warn!("Skipping candidate collection {}: {}", candidate_db, err);
                            skipped_databases.push(candidate_db);
                        }
                    }
                }
            }
            Err(err) => {
                log::warn!(
                    "Skipping relation pass, schema for {} unavailable: {}",
                    database_id,
                    err
                );
                skipped_databases.push(database_id.clone());
            }
        }
    }

    // Mention pass: title search. A hit that independently carries a relation
    // link to the target still classifies as a relation backlink.
    if target_title.is_empty() {
        log::warn!(
            "Target {} has an empty title; search degrades to an empty query",
            target_id
        );
    }
    let mut search_failed = false;
    match ws.search_pages(&target_title, search_page_size).await {
        Ok(hits) => {
            for hit in hits {
                if hit.id == target_id || seen.contains(&hit.id) {
                    continue;
                }
                let kind = match relation_to(&hit, target_id) {
                    Some(property) => BacklinkKind::Relation {
                        property: property.to_string(),
                    },
                    None => BacklinkKind::Mention,
                };
                seen.insert(hit.id.clone());
                records.push(Backlink {
                    source_id: hit.id.clone(),
                    source_title: title(&hit),
                    kind,
                });
            }
        }
        Err(err) => {
            log::warn!("Search pass failed for '{}': {}", target_title, err);
            search_failed = true;
        }
    }

    Ok(BacklinkReport {
        target_id: target_id.to_string(),
        target_title,
        records,
        skipped_databases,
        search_failed,
    })
}

/// Name of the first relation property on `page` whose reference set
/// contains `id`.
fn relation_to<'a>(page: &'a Page, id: &str) -> Option<&'a str> {
    page_relations(page)
        .into_iter()
        .find(|(_, refs)| refs.iter().any(|r| r.id == id))
        .map(|(name, _)| name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PagelinkError;
    use crate::testutil::{database_fixture, page_fixture, FakeRemote};
    use serde_json::json;

    fn kinds(report: &BacklinkReport) -> Vec<(&str, &BacklinkKind)> {
        report
            .records
            .iter()
            .map(|r| (r.source_id.as_str(), &r.kind))
            .collect()
    }

    #[tokio::test]
    async fn test_relation_pass_finds_typed_links() {
        // Target T lives in db1; db1 relates to db2; X in db2 links back to T.
        let remote = FakeRemote::new()
            .with_page(page_fixture("T", "db1", "Target", &[]))
            .with_database(database_fixture("db1", "Tasks", &[("Blocked by", "db2")]))
            .with_query(
                "db2",
                json!([
                    page_fixture("X", "db2", "Blocker", &[("Blocks", &["T"])]),
                    page_fixture("Y", "db2", "Unrelated", &[("Blocks", &["other"])]),
                ]),
            )
            .with_search(json!([]));
        let ws = Workspace::new(&remote);

        let report = find_backlinks(&ws, "T", 100, 50).await.unwrap();
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].source_id, "X");
        assert_eq!(
            report.records[0].kind,
            BacklinkKind::Relation {
                property: "Blocks".to_string()
            }
        );
        assert!(!report.partial());
    }

    #[tokio::test]
    async fn test_relation_precedence_over_mention() {
        // X links via relation AND surfaces in the title search: exactly one
        // record, classified as relation.
        let x = page_fixture("X", "db2", "About Target", &[("Blocks", &["T"])]);
        let remote = FakeRemote::new()
            .with_page(page_fixture("T", "db1", "Target", &[]))
            .with_database(database_fixture("db1", "Tasks", &[("Blocked by", "db2")]))
            .with_query("db2", json!([x.clone()]))
            .with_search(json!([x]));
        let ws = Workspace::new(&remote);

        let report = find_backlinks(&ws, "T", 100, 50).await.unwrap();
        assert_eq!(report.records.len(), 1);
        assert!(matches!(
            report.records[0].kind,
            BacklinkKind::Relation { .. }
        ));
    }

    #[tokio::test]
    async fn test_mention_pass_excludes_target_and_classifies() {
        // Search returns the target itself, a relation-linking page, and a
        // plain textual mention.
        let remote = FakeRemote::new()
            .with_page(page_fixture("T", "db1", "Target", &[]))
            .with_database(database_fixture("db1", "Tasks", &[]))
            .with_search(json!([
                page_fixture("T", "db1", "Target", &[]),
                page_fixture("M", "db3", "Mentions Target", &[]),
                page_fixture("L", "db3", "Linker", &[("See also", &["T"])]),
            ]));
        let ws = Workspace::new(&remote);

        let report = find_backlinks(&ws, "T", 100, 50).await.unwrap();
        let got = kinds(&report);
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].0, "M");
        assert_eq!(got[0].1, &BacklinkKind::Mention);
        assert_eq!(got[1].0, "L");
        assert_eq!(
            got[1].1,
            &BacklinkKind::Relation {
                property: "See also".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_inaccessible_collection_is_skipped_not_fatal() {
        let remote = FakeRemote::new()
            .with_page(page_fixture("T", "db1", "Target", &[]))
            .with_database(database_fixture(
                "db1",
                "Tasks",
                &[("Blocked by", "db2"), ("Owned by", "db3")],
            ))
            .with_missing("databases/db2/query")
            .with_query(
                "db3",
                json!([page_fixture("X", "db3", "Owner", &[("Owns", &["T"])])]),
            )
            .with_search(json!([]));
        let ws = Workspace::new(&remote);

        let report = find_backlinks(&ws, "T", 100, 50).await.unwrap();
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].source_id, "X");
        assert_eq!(report.skipped_databases, vec!["db2".to_string()]);
        assert!(report.partial());
    }

    #[tokio::test]
    async fn test_search_failure_reported_as_partial() {
        let remote = FakeRemote::new()
            .with_page(page_fixture("T", "db1", "Target", &[]))
            .with_database(database_fixture("db1", "Tasks", &[]))
            .with_missing("search");
        let ws = Workspace::new(&remote);

        let report = find_backlinks(&ws, "T", 100, 50).await.unwrap();
        assert!(report.records.is_empty());
        assert!(report.search_failed);
        assert!(report.partial());
    }

    #[tokio::test]
    async fn test_target_fetch_failure_is_fatal() {
        let remote = FakeRemote::new();
        let ws = Workspace::new(&remote);

        let result = find_backlinks(&ws, "missing", 100, 50).await;
        assert!(matches!(result, Err(PagelinkError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_page_parent_skips_relation_pass() {
        // Target parented by a page, not a database: only the mention pass runs.
        let remote = FakeRemote::new()
            .with_page(serde_json::from_str::<serde_json::Value>(
                r#"{
                    "id": "T",
                    "parent": { "type": "page_id", "page_id": "parent" },
                    "properties": {
                        "Name": { "type": "title", "title": [{ "plain_text": "Note" }] }
                    }
                }"#,
            )
            .unwrap())
            .with_search(json!([page_fixture("M", "db3", "Note follow-up", &[])]));
        let ws = Workspace::new(&remote);

        let report = find_backlinks(&ws, "T", 100, 50).await.unwrap();
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].kind, BacklinkKind::Mention);
        assert!(report.skipped_databases.is_empty());
    }
}
