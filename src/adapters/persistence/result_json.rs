//! Implements ResultCachePort using a JSON file.
//!
//! Keeps the last result per (quiz, user) for redisplay without resubmitting.

use crate::domain::{CachedResult, DomainError};
use crate::ports::ResultCachePort;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Cache file contents: "lastResult:{quiz_id}:{user}" -> result.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ResultData {
    last_results: HashMap<String, CachedResult>,
}

fn cache_key(quiz_id: &str, user: &str) -> String {
    format!("lastResult:{}:{}", quiz_id, user)
}

/// JSON file-based result cache.
pub struct ResultJson {
    path: std::path::PathBuf,
    cache: tokio::sync::RwLock<ResultData>,
}

impl ResultJson {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            cache: tokio::sync::RwLock::new(ResultData::default()),
        }
    }

    /// Load cached results from disk. A missing or corrupt file starts empty.
    pub async fn load(&self) -> Result<(), DomainError> {
        let data = match fs::read_to_string(&self.path).await {
            Ok(s) => serde_json::from_str(&s).unwrap_or_else(|e| {
                warn!(path = %self.path.display(), error = %e, "result cache unreadable, starting empty");
                ResultData::default()
            }),
            Err(_) => ResultData::default(),
        };
        *self.cache.write().await = data;
        Ok(())
    }

    /// Write to a temp file, fsync, then rename over the target.
    async fn save(&self) -> Result<(), DomainError> {
        let data = self.cache.read().await;
        let json =
            serde_json::to_string_pretty(&*data).map_err(|e| DomainError::Cache(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| DomainError::Cache(format!("create cache dir: {}", e)))?;
            }
        }

        let temp_path = self.path.with_extension("json.tmp");
        let mut f = fs::File::create(&temp_path)
            .await
            .map_err(|e| DomainError::Cache(format!("create temp file: {}", e)))?;
        f.write_all(json.as_bytes())
            .await
            .map_err(|e| DomainError::Cache(format!("write temp file: {}", e)))?;
        f.sync_all()
            .await
            .map_err(|e| DomainError::Cache(format!("sync temp file: {}", e)))?;
        drop(f);

        fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| DomainError::Cache(format!("atomic rename failed: {}", e)))?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl ResultCachePort for ResultJson {
    async fn get(&self, quiz_id: &str, user: &str) -> Result<Option<CachedResult>, DomainError> {
        let cache = self.cache.read().await;
        Ok(cache.last_results.get(&cache_key(quiz_id, user)).cloned())
    }

    async fn put(&self, entry: CachedResult) -> Result<(), DomainError> {
        let key = cache_key(&entry.quiz_id, &entry.user);
        {
            let mut cache = self.cache.write().await;
            cache.last_results.insert(key, entry);
        }
        self.save().await?;
        debug!(path = %self.path.display(), "result cache saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ScoreResult;
    use chrono::Utc;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("quiz-session-{}-{}", std::process::id(), name))
            .join("results.json")
    }

    fn entry(quiz_id: &str, user: &str, points: u32) -> CachedResult {
        CachedResult {
            quiz_id: quiz_id.into(),
            user: user.into(),
            result: ScoreResult {
                points,
                correct_count: points / 10,
                total_questions: 3,
                position: Some(2),
            },
            cached_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn persists_across_instances() {
        let path = temp_path("persist");
        let first = ResultJson::new(&path);
        first.load().await.unwrap();
        first.put(entry("quiz", "alice", 20)).await.unwrap();

        let second = ResultJson::new(&path);
        second.load().await.unwrap();
        let got = second.get("quiz", "alice").await.unwrap().unwrap();
        assert_eq!(got.result.points, 20);
        assert_eq!(got.result.position, Some(2));
        assert!(second.get("quiz", "bob").await.unwrap().is_none());

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn corrupt_file_starts_empty() {
        let path = temp_path("corrupt");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{ not json").unwrap();

        let cache = ResultJson::new(&path);
        cache.load().await.unwrap();
        assert!(cache.get("quiz", "alice").await.unwrap().is_none());

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn newer_result_replaces_older() {
        let path = temp_path("replace");
        let cache = ResultJson::new(&path);
        cache.put(entry("quiz", "alice", 10)).await.unwrap();
        cache.put(entry("quiz", "alice", 30)).await.unwrap();
        assert_eq!(
            cache.get("quiz", "alice").await.unwrap().unwrap().result.points,
            30
        );

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
