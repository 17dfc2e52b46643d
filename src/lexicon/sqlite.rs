use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{MatchError, Result};
use crate::lexicon::{LexicalKnowledgeBase, LexiconEntry};
use crate::text::stem;

/// On-disk WordNet-style lexicon.
///
/// Schema:
/// ```sql
/// CREATE TABLE lexicon (
///     word TEXT NOT NULL,
///     synset_id TEXT NOT NULL,
///     lemma TEXT NOT NULL,
///     synonyms TEXT NOT NULL,          -- JSON array
///     added_at TEXT NOT NULL,
///     PRIMARY KEY (word, synset_id)
/// );
/// ```
pub struct SqliteLexicon {
    conn: Arc<Mutex<Connection>>,
}

/// Lexicon statistics
#[derive(Debug, Clone)]
pub struct LexiconStats {
    pub total_words: u64,
    pub total_senses: u64,
    pub newest_entry: Option<DateTime<Utc>>,
}

impl SqliteLexicon {
    /// Open (or create) a lexicon database
    pub async fn open(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS lexicon (
                word TEXT NOT NULL,
                synset_id TEXT NOT NULL,
                lemma TEXT NOT NULL,
                synonyms TEXT NOT NULL,
                added_at TEXT NOT NULL,
                PRIMARY KEY (word, synset_id)
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_lexicon_lemma ON lexicon(lemma)",
            [],
        )?;

        tracing::debug!("Opened lexicon database {}", db_path);

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| MatchError::Lexicon {
            backend: "sqlite".to_string(),
            message: "connection mutex poisoned".to_string(),
        })
    }

    fn normalize_word(word: &str) -> String {
        word.trim().to_lowercase()
    }

    /// Record one sense of `word`. Single words are also indexed under
    /// their stem so normalized tokens resolve.
    pub async fn insert(&self, word: &str, entry: &LexiconEntry) -> Result<()> {
        let key = Self::normalize_word(word);
        if key.is_empty() {
            return Ok(());
        }

        let mut keys = vec![key.clone()];
        if !key.contains(char::is_whitespace) {
            let stemmed = stem(&key);
            if stemmed != key {
                keys.push(stemmed);
            }
        }

        let synonyms_json = serde_json::to_string(&entry.synonyms)?;
        let added_at = Utc::now().to_rfc3339();
        let conn = self.conn()?;

        for key in keys {
            conn.execute(
                "INSERT OR REPLACE INTO lexicon (word, synset_id, lemma, synonyms, added_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![key, entry.synset_id, entry.lemma, synonyms_json, added_at],
            )?;
        }

        Ok(())
    }

    /// Import synonym groups; returns the number of senses written.
    pub async fn import_groups<G, S>(&self, groups: G) -> Result<usize>
    where
        G: IntoIterator,
        G::Item: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut written = 0;
        for (index, group) in groups.into_iter().enumerate() {
            let members: Vec<String> = group
                .into_iter()
                .map(|w| Self::normalize_word(w.as_ref()))
                .filter(|w| !w.is_empty())
                .collect();
            let synset_id = format!("group-{}", index);
            for word in &members {
                let entry = LexiconEntry::new(&synset_id, word, members.clone());
                self.insert(word, &entry).await?;
                written += 1;
            }
        }
        Ok(written)
    }

    /// Remove every sense of `word`
    pub async fn remove(&self, word: &str) -> Result<u64> {
        let key = Self::normalize_word(word);
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM lexicon WHERE word = ?", params![key])?;
        Ok(deleted as u64)
    }

    /// Get lexicon statistics
    pub async fn stats(&self) -> Result<LexiconStats> {
        let conn = self.conn()?;

        let total_words: u64 = conn.query_row(
            "SELECT COUNT(DISTINCT word) FROM lexicon",
            [],
            |row| row.get(0),
        )?;

        let total_senses: u64 = conn.query_row("SELECT COUNT(*) FROM lexicon", [], |row| row.get(0))?;

        let newest_entry: Option<DateTime<Utc>> = conn
            .query_row("SELECT MAX(added_at) FROM lexicon", [], |row| {
                row.get::<_, Option<String>>(0)
            })?
            .and_then(|s| {
                DateTime::parse_from_rfc3339(&s)
                    .ok()
                    .map(|dt| dt.with_timezone(&Utc))
            });

        Ok(LexiconStats {
            total_words,
            total_senses,
            newest_entry,
        })
    }
}

#[async_trait]
impl LexicalKnowledgeBase for SqliteLexicon {
    async fn lookup(&self, word: &str) -> Result<Vec<LexiconEntry>> {
        let key = Self::normalize_word(word);
        let conn = self.conn()?;

        let mut stmt = conn.prepare_cached(
            "SELECT synset_id, lemma, synonyms FROM lexicon WHERE word = ? ORDER BY synset_id",
        )?;

        let rows = stmt.query_map(params![key], |row| {
            let synset_id: String = row.get(0)?;
            let lemma: String = row.get(1)?;
            let synonyms_json: String = row.get(2)?;
            Ok((synset_id, lemma, synonyms_json))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (synset_id, lemma, synonyms_json) = row?;
            let synonyms: Vec<String> = serde_json::from_str(&synonyms_json)?;
            entries.push(LexiconEntry {
                synset_id,
                lemma,
                synonyms,
            });
        }

        Ok(entries)
    }

    fn name(&self) -> &str {
        "sqlite"
    }

    async fn is_available(&self) -> bool {
        match self.conn() {
            Ok(conn) => conn
                .query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
                .is_ok(),
            Err(_) => false,
        }
    }
}
