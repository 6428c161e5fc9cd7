//! CaseStore - actor that owns the case journal
//!
//! Appends are the only mutation. All commands go through one task, so
//! concurrent pipelines never interleave writes; the journal's file lock
//! extends the same guarantee to other processes sharing the file.

use std::path::{Path, PathBuf};

use casestore::Journal;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use super::messages::{StateCommand, StateError, StateResponse};
use crate::domain::{Case, Category};

/// Handle to send commands to the CaseStore actor
#[derive(Clone)]
pub struct CaseStore {
    tx: mpsc::Sender<StateCommand>,
    path: PathBuf,
}

impl CaseStore {
    /// Spawn a CaseStore actor over the journal at `path`
    ///
    /// A missing journal is created empty.
    pub fn spawn(path: impl AsRef<Path>) -> StateResponse<Self> {
        let path = path.as_ref().to_path_buf();
        debug!(path = %path.display(), "CaseStore::spawn: called");
        let journal: Journal<Case> = Journal::open(&path)?;
        info!(path = %path.display(), cases = journal.len(), "Case store opened");

        let (tx, rx) = mpsc::channel(256);
        tokio::spawn(actor_loop(journal, rx));

        Ok(Self { tx, path })
    }

    /// Path of the backing journal
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a case
    pub async fn append(&self, case: Case) -> StateResponse<()> {
        debug!(case_id = %case.case_id, "append: called");
        self.request(|reply| StateCommand::Append {
            case: Box::new(case),
            reply,
        })
        .await
    }

    /// All cases in append order
    pub async fn list_all(&self) -> StateResponse<Vec<Case>> {
        debug!("list_all: called");
        self.request(|reply| StateCommand::ListAll { category: None, reply }).await
    }

    /// Cases of one category, in append order
    pub async fn list_by_category(&self, category: Category) -> StateResponse<Vec<Case>> {
        debug!(%category, "list_by_category: called");
        self.request(|reply| StateCommand::ListAll {
            category: Some(category),
            reply,
        })
        .await
    }

    /// Find a case by exact id or unique id prefix
    pub async fn get(&self, id_or_prefix: &str) -> StateResponse<Case> {
        debug!(%id_or_prefix, "get: called");
        self.request(|reply| StateCommand::Resolve {
            id_or_prefix: id_or_prefix.to_string(),
            reply,
        })
        .await
    }

    pub async fn count(&self) -> StateResponse<usize> {
        debug!("count: called");
        self.request(|reply| StateCommand::Count { reply }).await
    }

    /// Stop the actor; later requests fail with `ChannelError`
    pub async fn shutdown(&self) -> StateResponse<()> {
        debug!("shutdown: called");
        self.tx
            .send(StateCommand::Shutdown)
            .await
            .map_err(|_| StateError::ChannelError)
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<StateResponse<T>>) -> StateCommand) -> StateResponse<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(build(reply_tx))
            .await
            .map_err(|_| StateError::ChannelError)?;
        reply_rx.await.map_err(|_| StateError::ChannelError)?
    }
}

async fn actor_loop(mut journal: Journal<Case>, mut rx: mpsc::Receiver<StateCommand>) {
    debug!("CaseStore actor started");

    while let Some(cmd) = rx.recv().await {
        match cmd {
            StateCommand::Append { case, reply } => {
                debug!(case_id = %case.case_id, "actor_loop: Append command");
                let result = journal.append(*case).map_err(StateError::from);
                if let Err(e) = &result {
                    warn!(error = %e, "actor_loop: append failed");
                }
                let _ = reply.send(result);
            }

            StateCommand::ListAll { category, reply } => {
                debug!(?category, "actor_loop: ListAll command");
                let result = journal.reload().map_err(StateError::from).map(|_| {
                    journal
                        .records()
                        .iter()
                        .filter(|c| category.is_none_or(|cat| c.category == cat))
                        .cloned()
                        .collect()
                });
                let _ = reply.send(result);
            }

            StateCommand::Resolve { id_or_prefix, reply } => {
                debug!(%id_or_prefix, "actor_loop: Resolve command");
                let result = match journal.reload() {
                    Ok(()) => match journal.resolve(&id_or_prefix) {
                        Ok(Some(case)) => Ok(case.clone()),
                        Ok(None) => Err(StateError::NotFound(id_or_prefix)),
                        Err(e) => Err(StateError::from(e)),
                    },
                    Err(e) => Err(StateError::from(e)),
                };
                let _ = reply.send(result);
            }

            StateCommand::Count { reply } => {
                debug!("actor_loop: Count command");
                let result = journal.reload().map(|_| journal.len()).map_err(StateError::from);
                let _ = reply.send(result);
            }

            StateCommand::Shutdown => {
                debug!("actor_loop: Shutdown command");
                break;
            }
        }
    }

    debug!("CaseStore actor stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CaseId, CaseStatus, Classification, DraftDocument, ValidationResult};
    use tempfile::tempdir;

    fn case(id: &str, category: Category) -> Case {
        let classification = Classification {
            category,
            tags: Default::default(),
            summary: format!("summary {}", id),
        };
        Case::assemble(
            CaseId::from(id),
            &classification,
            classification.summary.clone(),
            "Unknown",
            "Request compliance",
            DraftDocument {
                purpose: String::new(),
                letter: "Dear [NAME]".to_string(),
                next_steps: String::new(),
            },
            ValidationResult::heuristic("Dear [NAME]"),
            0,
            CaseStatus::Drafted,
        )
    }

    #[tokio::test]
    async fn test_append_and_list_in_order() {
        let temp = tempdir().unwrap();
        let store = CaseStore::spawn(temp.path().join("cases.json")).unwrap();

        assert!(store.list_all().await.unwrap().is_empty());

        for id in ["c3", "a1", "b2"] {
            store.append(case(id, Category::Other)).await.unwrap();
        }

        let ids: Vec<String> = store
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.case_id.to_string())
            .collect();
        assert_eq!(ids, vec!["c3", "a1", "b2"]);
        assert_eq!(store.count().await.unwrap(), 3);

        store.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_duplicate_is_reported() {
        let temp = tempdir().unwrap();
        let store = CaseStore::spawn(temp.path().join("cases.json")).unwrap();

        store.append(case("same", Category::Other)).await.unwrap();
        let err = store.append(case("same", Category::Other)).await.unwrap_err();
        assert!(err.is_duplicate());
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_get_by_prefix_and_category_filter() {
        let temp = tempdir().unwrap();
        let store = CaseStore::spawn(temp.path().join("cases.json")).unwrap();
        store.append(case("aaaa1111", Category::Family)).await.unwrap();
        store.append(case("bbbb2222", Category::Consumer)).await.unwrap();

        assert_eq!(store.get("aaaa").await.unwrap().case_id.as_str(), "aaaa1111");
        assert!(matches!(store.get("zzzz").await, Err(StateError::NotFound(_))));

        let family = store.list_by_category(Category::Family).await.unwrap();
        assert_eq!(family.len(), 1);
        assert_eq!(family[0].case_id.as_str(), "aaaa1111");
    }

    #[tokio::test]
    async fn test_survives_restart() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("cases.json");

        let store = CaseStore::spawn(&path).unwrap();
        store.append(case("first", Category::Contract)).await.unwrap();
        store.append(case("second", Category::Contract)).await.unwrap();
        store.shutdown().await.unwrap();

        let reopened = CaseStore::spawn(&path).unwrap();
        let cases = reopened.list_all().await.unwrap();
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0], case_with_time("first", &cases[0]));
    }

    fn case_with_time(id: &str, stored: &Case) -> Case {
        let mut expected = case(id, Category::Contract);
        expected.created_at = stored.created_at;
        expected
    }

    #[tokio::test]
    async fn test_requests_after_shutdown_fail() {
        let temp = tempdir().unwrap();
        let store = CaseStore::spawn(temp.path().join("cases.json")).unwrap();
        store.shutdown().await.unwrap();
        // let the actor observe the shutdown
        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        assert!(matches!(store.count().await, Err(StateError::ChannelError)));
    }
}
