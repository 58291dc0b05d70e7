pub mod schema;
mod seed;

use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::engine::assessment::Outcome;
use crate::engine::catalog::{ConceptCatalog, ConceptDef};
use crate::engine::difficulty::preferred_difficulty;
use crate::engine::KnowledgeProfile;
use crate::tutor::types::{Learner, Preferences};

/// Rows kept in a learner's recent history.
const HISTORY_LIMIT: usize = 10;
/// Catalog concepts above this difficulty are never suggested as gaps.
const MAX_RECOMMENDED_DIFFICULTY: u8 = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub email: Option<String>,
    pub name: Option<String>,
    pub subscription: Option<String>,
    pub interests: Vec<String>,
    pub frequency: i64,
    pub granularity: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i64,
    pub email: Option<String>,
    pub name: Option<String>,
    pub created_at: String,
}

/// Partial profile update; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub interests: Option<Vec<String>>,
    pub frequency: Option<i64>,
    pub granularity: Option<String>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.interests.is_none() && self.frequency.is_none() && self.granularity.is_none()
    }
}

/// A learner's stored data as served to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerView {
    pub id: i64,
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(flatten)]
    pub learner: Learner,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeRow {
    pub id: i64,
    pub user_id: i64,
    pub topic: String,
    pub concept: String,
    pub proficiency_level: i64,
    pub confidence_score: f64,
    pub last_practiced: Option<String>,
    pub description: Option<String>,
    pub difficulty_level: Option<i64>,
    pub prerequisites: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeUpdate {
    pub knowledge_id: i64,
    pub proficiency_level: i64,
    pub confidence_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogConcept {
    pub id: i64,
    pub topic: String,
    pub concept: String,
    pub description: Option<String>,
    pub difficulty_level: i64,
    pub prerequisites: Vec<String>,
    pub granularity_required: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRecord {
    pub id: i64,
    pub topic: String,
    pub concept: Option<String>,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub granularity: String,
    pub difficulty: i64,
    pub options: Vec<String>,
    pub correct_answer: Option<i64>,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewContent {
    pub topic: String,
    pub concept: Option<String>,
    pub content: String,
    pub kind: String,
    pub granularity: String,
    pub difficulty: u8,
    pub options: Vec<String>,
    pub correct_answer: Option<i64>,
}

/// A progress row joined with the content it refers to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: i64,
    pub user_id: i64,
    pub content_id: i64,
    pub completed: bool,
    pub score: Option<i64>,
    pub timestamp: String,
    pub topic: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedUser {
    pub user_deleted: bool,
    pub deleted_knowledge: usize,
    pub deleted_progress: usize,
}

fn decode_list(raw: Option<String>, what: &str) -> Vec<String> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Vec::new(),
        Some(text) => serde_json::from_str(text).unwrap_or_else(|e| {
            warn!("Database: Ignoring malformed {} list {:?}: {}", what, text, e);
            Vec::new()
        }),
    }
}

fn encode_list(items: &[String]) -> Option<String> {
    if items.is_empty() {
        None
    } else {
        serde_json::to_string(items).ok()
    }
}

const USER_COLUMNS: &str = "id, email, name, subscription, interests, COALESCE(frequency, 3), \
     COALESCE(granularity, 'auto'), created_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        subscription: row.get(3)?,
        interests: decode_list(row.get(4)?, "interests"),
        frequency: row.get(5)?,
        granularity: row.get(6)?,
        created_at: row.get(7)?,
    })
}

const CONTENT_COLUMNS: &str = "id, topic, concept, content, type, COALESCE(granularity, 'auto'), \
     COALESCE(difficulty, 25), options, correct_answer, created_at";

fn content_from_row(row: &Row<'_>) -> rusqlite::Result<ContentRecord> {
    Ok(ContentRecord {
        id: row.get(0)?,
        topic: row.get(1)?,
        concept: row.get(2)?,
        content: row.get(3)?,
        kind: row.get(4)?,
        granularity: row.get(5)?,
        difficulty: row.get(6)?,
        options: decode_list(row.get(7)?, "options"),
        correct_answer: row.get(8)?,
        created_at: row.get(9)?,
    })
}

fn catalog_from_row(row: &Row<'_>) -> rusqlite::Result<CatalogConcept> {
    Ok(CatalogConcept {
        id: row.get(0)?,
        topic: row.get(1)?,
        concept: row.get(2)?,
        description: row.get(3)?,
        difficulty_level: row.get(4)?,
        prerequisites: decode_list(row.get(5)?, "prerequisites"),
        granularity_required: row.get(6)?,
    })
}

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let conn = Connection::open(&config.database_url)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> anyhow::Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("Database connection lock poisoned"))
    }

    /// Run a blocking query off the async executor.
    pub async fn run_blocking<F, T>(&self, f: F) -> anyhow::Result<T>
    where
        F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.clone();
        tokio::task::spawn_blocking(move || f(&db)).await?
    }

    pub fn execute_init(&self) -> anyhow::Result<()> {
        info!("Database: Initializing schema...");
        let conn = self.conn()?;
        conn.execute_batch(schema::SCHEMA)?;
        debug!("Database: Schema initialized successfully");
        Ok(())
    }

    // --- Users ---

    pub fn create_user(&self, email: &str, name: &str) -> anyhow::Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO users (email, name, subscription) VALUES (?1, ?2, 'free')",
            (email, name),
        )?;
        let id = conn.last_insert_rowid();
        debug!("Database: Created user {} <{}>", id, email);
        Ok(id)
    }

    pub fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE email = ?1", USER_COLUMNS),
                [email],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    pub fn get_user(&self, user_id: i64) -> anyhow::Result<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
                [user_id],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    /// Complete account setup. Returns the number of rows changed.
    pub fn register_interests(
        &self,
        user_id: i64,
        interests: &[String],
        frequency: i64,
        granularity: &str,
    ) -> anyhow::Result<usize> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE users SET interests = ?1, frequency = ?2, granularity = ?3 WHERE id = ?4",
            (serde_json::to_string(interests)?, frequency, granularity, user_id),
        )?;
        Ok(changed)
    }

    pub fn update_user(&self, user_id: i64, update: &UserUpdate) -> anyhow::Result<usize> {
        let mut assignments: Vec<&str> = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(interests) = &update.interests {
            assignments.push("interests = ?");
            values.push(Box::new(serde_json::to_string(interests)?));
        }
        if let Some(frequency) = update.frequency {
            assignments.push("frequency = ?");
            values.push(Box::new(frequency));
        }
        if let Some(granularity) = &update.granularity {
            assignments.push("granularity = ?");
            values.push(Box::new(granularity.clone()));
        }
        if assignments.is_empty() {
            return Ok(0);
        }
        values.push(Box::new(user_id));

        let sql = format!("UPDATE users SET {} WHERE id = ?", assignments.join(", "));
        let params: Vec<&dyn rusqlite::ToSql> = values.iter().map(|v| v.as_ref()).collect();

        let conn = self.conn()?;
        Ok(conn.execute(&sql, &params[..])?)
    }

    pub fn list_users(&self) -> anyhow::Result<Vec<UserSummary>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, email, name, created_at FROM users ORDER BY created_at DESC, id DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(UserSummary {
                id: row.get(0)?,
                email: row.get(1)?,
                name: row.get(2)?,
                created_at: row.get(3)?,
            })
        })?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    /// Remove a user together with their knowledge and progress rows.
    pub fn delete_user(&self, user_id: i64) -> anyhow::Result<DeletedUser> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let deleted_knowledge =
            tx.execute("DELETE FROM knowledge_profile WHERE user_id = ?1", [user_id])?;
        let deleted_progress = tx.execute("DELETE FROM progress WHERE user_id = ?1", [user_id])?;
        let deleted_users = tx.execute("DELETE FROM users WHERE id = ?1", [user_id])?;
        tx.commit()?;

        info!(
            "Database: Deleted user {} ({} knowledge rows, {} progress rows)",
            user_id, deleted_knowledge, deleted_progress
        );
        Ok(DeletedUser {
            user_deleted: deleted_users > 0,
            deleted_knowledge,
            deleted_progress,
        })
    }

    // --- Knowledge profile ---

    /// Replace the (user, topic, concept) entry outright.
    pub fn upsert_knowledge(
        &self,
        user_id: i64,
        topic: &str,
        concept: &str,
        proficiency: i64,
        confidence: f64,
    ) -> anyhow::Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO knowledge_profile
             (user_id, topic, concept, proficiency_level, confidence_score, last_practiced)
             VALUES (?1, ?2, ?3, ?4, ?5, CURRENT_TIMESTAMP)",
            (user_id, topic, concept, proficiency, confidence),
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Apply an assessment outcome against the current entry in one step.
    pub fn record_outcome(
        &self,
        user_id: i64,
        topic: &str,
        concept: &str,
        outcome: &Outcome,
    ) -> anyhow::Result<KnowledgeUpdate> {
        let conn = self.conn()?;
        let existing = conn
            .query_row(
                "SELECT proficiency_level, confidence_score, last_practiced FROM knowledge_profile
                 WHERE user_id = ?1 AND topic = ?2 AND concept = ?3",
                (user_id, topic, concept),
                |row| {
                    Ok(crate::engine::ConceptKnowledge {
                        proficiency: row.get(0)?,
                        confidence: row.get(1)?,
                        last_practiced: row.get(2)?,
                    })
                },
            )
            .optional()?;

        let (proficiency, confidence) = outcome.apply(existing.as_ref());
        conn.execute(
            "INSERT OR REPLACE INTO knowledge_profile
             (user_id, topic, concept, proficiency_level, confidence_score, last_practiced)
             VALUES (?1, ?2, ?3, ?4, ?5, CURRENT_TIMESTAMP)",
            (user_id, topic, concept, proficiency, confidence),
        )?;

        debug!(
            "Database: {} / {} for user {} -> proficiency {}, confidence {:.2}",
            topic, concept, user_id, proficiency, confidence
        );
        Ok(KnowledgeUpdate {
            knowledge_id: conn.last_insert_rowid(),
            proficiency_level: proficiency,
            confidence_score: confidence,
        })
    }

    /// Profile rows joined with catalog metadata, strongest concepts first.
    pub fn knowledge_rows(&self, user_id: i64) -> anyhow::Result<Vec<KnowledgeRow>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT kp.id, kp.user_id, kp.topic, kp.concept, kp.proficiency_level, kp.confidence_score,
                    kp.last_practiced, kc.description, kc.difficulty_level, kc.prerequisites
             FROM knowledge_profile kp
             LEFT JOIN knowledge_concepts kc ON kp.topic = kc.topic AND kp.concept = kc.concept
             WHERE kp.user_id = ?1
             ORDER BY kp.topic, kp.proficiency_level DESC",
        )?;
        let rows = stmt.query_map([user_id], |row| {
            Ok(KnowledgeRow {
                id: row.get(0)?,
                user_id: row.get(1)?,
                topic: row.get(2)?,
                concept: row.get(3)?,
                proficiency_level: row.get(4)?,
                confidence_score: row.get(5)?,
                last_practiced: row.get(6)?,
                description: row.get(7)?,
                difficulty_level: row.get(8)?,
                prerequisites: decode_list(row.get(9)?, "prerequisites"),
            })
        })?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    pub fn knowledge_profile(&self, user_id: i64) -> anyhow::Result<KnowledgeProfile> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT topic, concept, proficiency_level, confidence_score, last_practiced
             FROM knowledge_profile WHERE user_id = ?1",
        )?;
        let mut rows = stmt.query([user_id])?;

        let mut profile = KnowledgeProfile::default();
        while let Some(row) = rows.next()? {
            let topic: String = row.get(0)?;
            let concept: String = row.get(1)?;
            profile.insert(&topic, &concept, row.get(2)?, row.get(3)?, row.get(4)?);
        }
        Ok(profile)
    }

    // --- Concept catalog ---

    /// Insert catalog concepts for a topic, keeping existing rows.
    pub fn seed_concepts(&self, topic: &str, concepts: &[ConceptDef]) -> anyhow::Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO knowledge_concepts
                 (topic, concept, description, difficulty_level, prerequisites, granularity_required)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for concept in concepts {
                inserted += stmt.execute((
                    topic,
                    &concept.name,
                    &concept.description,
                    concept.difficulty,
                    encode_list(&concept.prerequisites),
                    &concept.granularity,
                ))?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    pub fn seed_catalog(&self, catalog: &ConceptCatalog) -> anyhow::Result<usize> {
        let mut inserted = 0;
        for topic in &catalog.topics {
            inserted += self.seed_concepts(&topic.name, &topic.concepts)?;
        }
        info!("Database: Seeded {} catalog concepts", inserted);
        Ok(inserted)
    }

    /// Easy catalog concepts of `topic` the learner has no entry for yet.
    pub fn recommend_concepts(
        &self,
        user_id: i64,
        topic: &str,
    ) -> anyhow::Result<Vec<CatalogConcept>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, topic, concept, description, difficulty_level, prerequisites,
                    COALESCE(granularity_required, 'high')
             FROM knowledge_concepts
             WHERE topic = ?1 AND difficulty_level <= ?2
               AND concept NOT IN (
                   SELECT concept FROM knowledge_profile WHERE user_id = ?3 AND topic = ?1
               )
             ORDER BY difficulty_level ASC, concept ASC",
        )?;
        let rows = stmt.query_map((topic, MAX_RECOMMENDED_DIFFICULTY, user_id), catalog_from_row)?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    // --- Content ---

    pub fn insert_content(&self, content: &NewContent) -> anyhow::Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO content (topic, concept, content, type, granularity, difficulty, options, correct_answer)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            (
                &content.topic,
                &content.concept,
                &content.content,
                &content.kind,
                &content.granularity,
                content.difficulty,
                encode_list(&content.options),
                content.correct_answer,
            ),
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Content for a topic. `auto` matches every row; any other value matches
    /// rows with that granularity or `auto`.
    pub fn content_for_topic(
        &self,
        topic: &str,
        granularity: &str,
    ) -> anyhow::Result<Vec<ContentRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM content
             WHERE topic = ?1 AND (?2 = 'auto' OR granularity = ?2 OR granularity = 'auto')
             ORDER BY id",
            CONTENT_COLUMNS
        ))?;
        let rows = stmt.query_map((topic, granularity), content_from_row)?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    pub fn get_content(&self, content_id: i64) -> anyhow::Result<Option<ContentRecord>> {
        let conn = self.conn()?;
        let record = conn
            .query_row(
                &format!("SELECT {} FROM content WHERE id = ?1", CONTENT_COLUMNS),
                [content_id],
                content_from_row,
            )
            .optional()?;
        Ok(record)
    }

    /// Insert the bundled sample lessons when the content table is empty.
    pub fn seed_sample_content(&self) -> anyhow::Result<usize> {
        let existing: i64 = {
            let conn = self.conn()?;
            conn.query_row("SELECT COUNT(*) FROM content", [], |row| row.get(0))?
        };
        if existing > 0 {
            debug!("Database: Content table already populated ({} rows)", existing);
            return Ok(0);
        }

        let samples = seed::sample_content();
        for sample in &samples {
            self.insert_content(sample)?;
        }
        info!("Database: Seeded {} sample lessons", samples.len());
        Ok(samples.len())
    }

    // --- Progress ---

    pub fn insert_progress(
        &self,
        user_id: i64,
        content_id: i64,
        completed: bool,
        score: Option<i64>,
    ) -> anyhow::Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO progress (user_id, content_id, completed, score) VALUES (?1, ?2, ?3, ?4)",
            (user_id, content_id, completed, score),
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Progress joined with content, newest first.
    pub fn progress_for_user(
        &self,
        user_id: i64,
        limit: Option<usize>,
    ) -> anyhow::Result<Vec<HistoryEntry>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT p.id, p.user_id, p.content_id, COALESCE(p.completed, 0), p.score, p.timestamp,
                    c.topic, c.content, c.type
             FROM progress p
             JOIN content c ON p.content_id = c.id
             WHERE p.user_id = ?1
             ORDER BY p.timestamp DESC, p.id DESC
             LIMIT ?2",
        )?;
        // SQLite treats a negative LIMIT as unbounded
        let limit = limit.map_or(-1, |l| l as i64);
        let rows = stmt.query_map((user_id, limit), |row| {
            Ok(HistoryEntry {
                id: row.get(0)?,
                user_id: row.get(1)?,
                content_id: row.get(2)?,
                completed: row.get(3)?,
                score: row.get(4)?,
                timestamp: row.get(5)?,
                topic: row.get(6)?,
                content: row.get(7)?,
                kind: row.get(8)?,
            })
        })?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    // --- Learner aggregate ---

    /// Interests, knowledge, recent history and preferences for one user.
    pub fn load_learner(
        &self,
        user_id: i64,
        default_difficulty: u8,
    ) -> anyhow::Result<Option<LearnerView>> {
        let Some(user) = self.get_user(user_id)? else {
            return Ok(None);
        };
        let knowledge_profile = self.knowledge_profile(user_id)?;
        let learning_history = self.progress_for_user(user_id, Some(HISTORY_LIMIT))?;
        let difficulty =
            preferred_difficulty(&knowledge_profile, &user.interests, default_difficulty);

        Ok(Some(LearnerView {
            id: user.id,
            name: user.name,
            email: user.email,
            learner: Learner {
                interests: user.interests,
                knowledge_profile,
                learning_history,
                preferences: Preferences {
                    difficulty,
                    granularity: user.granularity,
                },
            },
            created_at: user.created_at,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::engine::catalog;

    fn test_db() -> Database {
        let db = Database::new(&test_config()).unwrap();
        db.execute_init().unwrap();
        db
    }

    #[test]
    fn test_db_init_is_idempotent() {
        let db = test_db();
        db.execute_init().unwrap();
        assert!(db.list_users().unwrap().is_empty());
    }

    #[test]
    fn test_user_lifecycle() {
        let db = test_db();
        let id = db.create_user("ada@example.com", "Ada").unwrap();
        assert!(db.create_user("ada@example.com", "Again").is_err());

        let user = db.find_user_by_email("ada@example.com").unwrap().unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.subscription.as_deref(), Some("free"));
        assert!(user.interests.is_empty());
        assert_eq!(user.frequency, 3);
        assert_eq!(user.granularity, "auto");

        let interests = vec!["Rust".to_string(), "Cooking".to_string()];
        assert_eq!(db.register_interests(id, &interests, 5, "high").unwrap(), 1);
        let user = db.get_user(id).unwrap().unwrap();
        assert_eq!(user.interests, interests);
        assert_eq!(user.frequency, 5);

        let update = UserUpdate {
            granularity: Some("low".into()),
            ..UserUpdate::default()
        };
        assert_eq!(db.update_user(id, &update).unwrap(), 1);
        assert_eq!(db.get_user(id).unwrap().unwrap().granularity, "low");
        assert_eq!(db.update_user(999, &update).unwrap(), 0);
        assert_eq!(db.update_user(id, &UserUpdate::default()).unwrap(), 0);

        assert!(db.get_user(999).unwrap().is_none());
    }

    #[test]
    fn test_knowledge_rows_are_replaced() {
        let db = test_db();
        let id = db.create_user("a@b.c", "A").unwrap();
        db.upsert_knowledge(id, "JavaScript", "Variables", 1, 0.5).unwrap();
        db.upsert_knowledge(id, "JavaScript", "Variables", 2, 0.9).unwrap();

        let rows = db.knowledge_rows(id).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].proficiency_level, 2);
        assert!(rows[0].last_practiced.is_some());
        assert!(rows[0].description.is_none());

        db.seed_catalog(&catalog::builtin()).unwrap();
        let rows = db.knowledge_rows(id).unwrap();
        assert_eq!(rows[0].difficulty_level, Some(1));

        let profile = db.knowledge_profile(id).unwrap();
        assert_eq!(profile.proficiency("JavaScript", "Variables"), 2);
    }

    #[test]
    fn test_correct_outcome_never_lowers() {
        let db = test_db();
        let id = db.create_user("a@b.c", "A").unwrap();

        db.record_outcome(id, "Cooking", "Heat Control", &Outcome::mastered()).unwrap();
        let update = db
            .record_outcome(id, "Cooking", "Heat Control", &Outcome::quiz(true))
            .unwrap();
        assert_eq!(update.proficiency_level, 2);
        assert_eq!(update.confidence_score, 0.9);

        let update = db
            .record_outcome(id, "Cooking", "Heat Control", &Outcome::quiz(false))
            .unwrap();
        assert_eq!(update.proficiency_level, 0);
        assert_eq!(db.knowledge_rows(id).unwrap().len(), 1);
    }

    #[test]
    fn test_catalog_seed_and_recommendations() {
        let db = test_db();
        let first = db.seed_catalog(&catalog::builtin()).unwrap();
        assert!(first > 0);
        assert_eq!(db.seed_catalog(&catalog::builtin()).unwrap(), 0);

        let id = db.create_user("a@b.c", "A").unwrap();
        db.upsert_knowledge(id, "JavaScript", "Variables", 1, 0.8).unwrap();

        let recs = db.recommend_concepts(id, "JavaScript").unwrap();
        let names: Vec<&str> = recs.iter().map(|c| c.concept.as_str()).collect();
        assert_eq!(names, vec!["Arrays", "Functions", "Loops", "Objects"]);
        assert_eq!(recs[3].prerequisites, vec!["Variables", "Functions"]);
        assert!(recs.iter().all(|c| c.difficulty_level <= 3));
    }

    #[test]
    fn test_content_granularity_filter() {
        let db = test_db();
        assert!(db.seed_sample_content().unwrap() > 0);
        assert_eq!(db.seed_sample_content().unwrap(), 0);

        let all = db.content_for_topic("Cooking", "auto").unwrap();
        assert_eq!(all.len(), 2);
        let low = db.content_for_topic("Cooking", "low").unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].kind, "tip");

        db.insert_content(&NewContent {
            topic: "Cooking".into(),
            content: "Rest meat after cooking.".into(),
            kind: "tip".into(),
            granularity: "auto".into(),
            difficulty: 40,
            ..NewContent::default()
        })
        .unwrap();
        assert_eq!(db.content_for_topic("Cooking", "low").unwrap().len(), 2);

        let quiz = db
            .content_for_topic("JavaScript", "high")
            .unwrap()
            .into_iter()
            .find(|c| c.kind == "quiz")
            .unwrap();
        assert_eq!(quiz.options.len(), 3);
        assert_eq!(quiz.correct_answer, Some(1));
    }

    #[test]
    fn test_progress_history_and_cascade_delete() {
        let db = test_db();
        db.seed_sample_content().unwrap();
        let id = db.create_user("a@b.c", "A").unwrap();
        db.register_interests(id, &["JavaScript".to_string()], 3, "auto").unwrap();

        let content = db.content_for_topic("JavaScript", "auto").unwrap();
        db.insert_progress(id, content[0].id, true, Some(100)).unwrap();
        db.insert_progress(id, content[1].id, false, None).unwrap();
        db.upsert_knowledge(id, "JavaScript", "Variables", 2, 0.9).unwrap();

        let history = db.progress_for_user(id, None).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content_id, content[1].id);
        assert!(history[1].completed);

        let view = db.load_learner(id, 50).unwrap().unwrap();
        assert_eq!(view.learner.interests, vec!["JavaScript"]);
        assert_eq!(view.learner.preferences.difficulty, 75);
        assert_eq!(view.learner.learning_history.len(), 2);

        let deleted = db.delete_user(id).unwrap();
        assert!(deleted.user_deleted);
        assert_eq!(deleted.deleted_knowledge, 1);
        assert_eq!(deleted.deleted_progress, 2);
        assert!(db.load_learner(id, 50).unwrap().is_none());

        let again = db.delete_user(id).unwrap();
        assert!(!again.user_deleted);
    }
}
