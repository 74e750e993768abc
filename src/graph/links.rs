//! Bidirectional relation mutation: add or remove a single reference in a
//! named relation property, optionally on both sides of the link.

use serde::Serialize;

use crate::api::Remote;
use crate::error::{PagelinkError, Result};
use crate::model::Page;
use crate::workspace::{relation_ids, Workspace};

/// What happened on one side of a link or unlink operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkOutcome {
    /// Reference appended and written.
    Linked,
    /// Reference already present; no write was issued.
    AlreadyLinked,
    /// Reference filtered out and the remainder written.
    Unlinked,
    /// Reference was not present; the unchanged set was still written.
    NotLinked,
    /// Reverse leg only: the property is absent or not relation-typed on the
    /// other page, so that side was skipped.
    SkippedNoProperty,
}

/// Outcome of a link or unlink call. The forward leg always runs; the
/// reverse leg is present only for bidirectional calls.
#[derive(Debug, Clone, Serialize)]
pub struct LinkReport {
    pub property: String,
    pub forward: LinkOutcome,
    pub reverse: Option<LinkOutcome>,
}

/// Append `target_id` to the `property` relation on `source_id`.
///
/// Idempotent: when the reference is already present nothing is written.
/// With `bidirectional`, the same property name is mirrored on the target;
/// a missing or non-relation property there skips the reverse leg instead
/// of failing. Only the named property is ever written.
pub async fn link<R: Remote>(
    ws: &Workspace<R>,
    source_id: &str,
    target_id: &str,
    property: &str,
    bidirectional: bool,
) -> Result<LinkReport> {
    let source = ws.page(source_id).await?;
    let target = ws.page(target_id).await?;

    let forward = add_reference(ws, &source, target_id, property).await?;
    let reverse = if bidirectional {
        Some(match relation_ids(&target, property) {
            Some(_) => add_reference(ws, &target, source_id, property).await?,
            None => {
                log::warn!(
                    "Property '{}' is not a relation on {}; reverse link skipped",
                    property,
                    target_id
                );
                LinkOutcome::SkippedNoProperty
            }
        })
    } else {
        None
    };

    Ok(LinkReport {
        property: property.to_string(),
        forward,
        reverse,
    })
}

/// Remove `target_id` from the `property` relation on `source_id`.
///
/// The filtered set is written even when the reference was absent, so
/// repeated calls settle on the same state. Reverse-leg semantics match
/// [`link`].
pub async fn unlink<R: Remote>(
    ws: &Workspace<R>,
    source_id: &str,
    target_id: &str,
    property: &str,
    bidirectional: bool,
) -> Result<LinkReport> {
    let source = ws.page(source_id).await?;
    let target = ws.page(target_id).await?;

    let forward = remove_reference(ws, &source, target_id, property).await?;
    let reverse = if bidirectional {
        Some(match relation_ids(&target, property) {
            Some(_) => remove_reference(ws, &target, source_id, property).await?,
            None => {
                log::warn!(
                    "Property '{}' is not a relation on {}; reverse unlink skipped",
                    property,
                    target_id
                );
                LinkOutcome::SkippedNoProperty
            }
        })
    } else {
        None
    };

    Ok(LinkReport {
        property: property.to_string(),
        forward,
        reverse,
    })
}

async fn add_reference<R: Remote>(
    ws: &Workspace<R>,
    page: &Page,
    add_id: &str,
    property: &str,
) -> Result<LinkOutcome> {
    let mut ids = relation_ids(page, property).ok_or_else(|| property_error(page, property))?;
    if ids.iter().any(|id| id == add_id) {
        return Ok(LinkOutcome::AlreadyLinked);
    }
    ids.push(add_id.to_string());
    ws.update_relation(&page.id, property, &ids).await?;
    Ok(LinkOutcome::Linked)
}

async fn remove_reference<R: Remote>(
    ws: &Workspace<R>,
    page: &Page,
    remove_id: &str,
    property: &str,
) -> Result<LinkOutcome> {
    let ids = relation_ids(page, property).ok_or_else(|| property_error(page, property))?;
    let was_present = ids.iter().any(|id| id == remove_id);
    let filtered: Vec<String> = ids.into_iter().filter(|id| id != remove_id).collect();
    ws.update_relation(&page.id, property, &filtered).await?;
    Ok(if was_present {
        LinkOutcome::Unlinked
    } else {
        LinkOutcome::NotLinked
    })
}

fn property_error(page: &Page, property: &str) -> PagelinkError {
    PagelinkError::PropertyType {
        page_id: page.id.clone(),
        property: property.to_string(),
        reason: "missing or not a relation property".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{page_fixture, FakeRemote};

    fn remote_pair(source_rel: &[&str], target_rel: Option<&[&str]>) -> FakeRemote {
        let mut remote =
            FakeRemote::new().with_page(page_fixture("S", "db1", "Source", &[("Blocks", source_rel)]));
        remote = match target_rel {
            Some(rel) => remote.with_page(page_fixture("T", "db1", "Target", &[("Blocks", rel)])),
            None => remote.with_page(page_fixture("T", "db1", "Target", &[])),
        };
        remote
    }

    #[tokio::test]
    async fn test_link_appends_and_preserves_existing() {
        let remote = remote_pair(&["keep"], Some(&[]));
        let ws = Workspace::new(&remote);

        let report = link(&ws, "S", "T", "Blocks", false).await.unwrap();
        assert_eq!(report.forward, LinkOutcome::Linked);
        assert!(report.reverse.is_none());

        let patches = remote.patch_bodies();
        assert_eq!(patches.len(), 1);
        let relation = &patches[0].1["properties"]["Blocks"]["relation"];
        assert_eq!(relation[0]["id"], "keep");
        assert_eq!(relation[1]["id"], "T");
    }

    #[tokio::test]
    async fn test_link_is_idempotent() {
        let remote = remote_pair(&[], Some(&[]));
        let ws = Workspace::new(&remote);

        let first = link(&ws, "S", "T", "Blocks", false).await.unwrap();
        assert_eq!(first.forward, LinkOutcome::Linked);

        // The fake folds the patch back into the stored page, so the second
        // call observes the first write.
        let second = link(&ws, "S", "T", "Blocks", false).await.unwrap();
        assert_eq!(second.forward, LinkOutcome::AlreadyLinked);
        assert_eq!(remote.patch_count(), 1);
    }

    #[tokio::test]
    async fn test_link_writes_only_the_named_property() {
        let remote = FakeRemote::new()
            .with_page(page_fixture(
                "S",
                "db1",
                "Source",
                &[("Blocks", &[]), ("Owner", &["o1"])],
            ))
            .with_page(page_fixture("T", "db1", "Target", &[]));
        let ws = Workspace::new(&remote);

        link(&ws, "S", "T", "Blocks", false).await.unwrap();

        let patches = remote.patch_bodies();
        let props = patches[0].1["properties"].as_object().unwrap().clone();
        assert_eq!(props.len(), 1);
        assert!(props.contains_key("Blocks"));
    }

    #[tokio::test]
    async fn test_link_missing_property_is_fatal() {
        let remote = remote_pair(&[], Some(&[]));
        let ws = Workspace::new(&remote);

        let result = link(&ws, "S", "T", "Nope", false).await;
        assert!(matches!(
            result,
            Err(PagelinkError::PropertyType { property, .. }) if property == "Nope"
        ));
        assert_eq!(remote.patch_count(), 0);
    }

    #[tokio::test]
    async fn test_bidirectional_link_mirrors_property() {
        let remote = remote_pair(&[], Some(&[]));
        let ws = Workspace::new(&remote);

        let report = link(&ws, "S", "T", "Blocks", true).await.unwrap();
        assert_eq!(report.forward, LinkOutcome::Linked);
        assert_eq!(report.reverse, Some(LinkOutcome::Linked));

        let patches = remote.patch_bodies();
        assert_eq!(patches.len(), 2);
        assert_eq!(patches[0].0, "pages/S");
        assert_eq!(patches[1].0, "pages/T");
        assert_eq!(patches[1].1["properties"]["Blocks"]["relation"][0]["id"], "S");
    }

    #[tokio::test]
    async fn test_bidirectional_reverse_skip_when_property_absent() {
        let remote = remote_pair(&[], None);
        let ws = Workspace::new(&remote);

        let report = link(&ws, "S", "T", "Blocks", true).await.unwrap();
        assert_eq!(report.forward, LinkOutcome::Linked);
        assert_eq!(report.reverse, Some(LinkOutcome::SkippedNoProperty));
        assert_eq!(remote.patch_count(), 1);
    }

    #[tokio::test]
    async fn test_unlink_filters_and_keeps_others() {
        let remote = remote_pair(&["keep", "T"], Some(&[]));
        let ws = Workspace::new(&remote);

        let report = unlink(&ws, "S", "T", "Blocks", false).await.unwrap();
        assert_eq!(report.forward, LinkOutcome::Unlinked);

        let patches = remote.patch_bodies();
        let relation = patches[0].1["properties"]["Blocks"]["relation"]
            .as_array()
            .unwrap()
            .clone();
        assert_eq!(relation.len(), 1);
        assert_eq!(relation[0]["id"], "keep");
    }

    #[tokio::test]
    async fn test_unlink_absent_reference_still_writes() {
        let remote = remote_pair(&["keep"], Some(&[]));
        let ws = Workspace::new(&remote);

        let first = unlink(&ws, "S", "T", "Blocks", false).await.unwrap();
        assert_eq!(first.forward, LinkOutcome::NotLinked);
        let second = unlink(&ws, "S", "T", "Blocks", false).await.unwrap();
        assert_eq!(second.forward, LinkOutcome::NotLinked);
        // Idempotent on repeat calls, but each call writes unconditionally
        assert_eq!(remote.patch_count(), 2);
    }
}
