use std::fs;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{LEDGER_CAPACITY, MAX_NAME_LENGTH};
use crate::types::{Difficulty, ScoreEntry};

// One fixed-capacity ranked table per difficulty tier. Tables are pre-filled
// with blank zero-score entries so the high-score comparison against the
// last slot is always defined.
#[derive(Clone, Debug)]
pub struct ScoreLedgers {
    tables: [Vec<ScoreEntry>; 3],
}

impl ScoreLedgers {
    pub fn new() -> Self {
        Self {
            tables: [blank_table(), blank_table(), blank_table()],
        }
    }

    pub fn entries(&self, tier: Difficulty) -> &[ScoreEntry] {
        &self.tables[tier_index(tier)]
    }

    pub fn is_high_score(&self, score: i32, tier: Difficulty) -> bool {
        let table = &self.tables[tier_index(tier)];
        table
            .last()
            .map(|entry| score > entry.score)
            .unwrap_or(true)
    }

    // Writes the entry at the first slot with a strictly smaller score,
    // shifting the tail down and discarding the previous last entry. A
    // score that beats nothing leaves the table unchanged.
    pub fn insert(&mut self, name: &str, score: i32, tier: Difficulty) -> bool {
        let table = &mut self.tables[tier_index(tier)];
        for idx in 0..table.len() {
            if score > table[idx].score {
                table.insert(
                    idx,
                    ScoreEntry {
                        name: truncate_name(name),
                        score,
                    },
                );
                table.truncate(LEDGER_CAPACITY);
                return true;
            }
        }
        false
    }

    pub fn build_response(&self, tier: Difficulty) -> ScoresResponse {
        ScoresResponse {
            generated_at_iso: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            tier,
            entries: self.entries(tier).to_vec(),
        }
    }
}

impl Default for ScoreLedgers {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ScoresResponse {
    #[serde(rename = "generatedAt")]
    pub generated_at_iso: String,
    pub tier: Difficulty,
    pub entries: Vec<ScoreEntry>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct StoredEntry {
    name: String,
    score: i32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct LedgerFile {
    version: u8,
    easy: Vec<StoredEntry>,
    normal: Vec<StoredEntry>,
    hard: Vec<StoredEntry>,
}

// Durable JSON store for the ledgers. Read and parse failures degrade to
// blank tables, write failures are logged and skipped; the session itself
// never sees an error.
pub struct LedgerStore {
    file_path: PathBuf,
}

impl LedgerStore {
    pub fn new(file_path: PathBuf) -> Self {
        Self { file_path }
    }

    pub fn load(&self) -> ScoreLedgers {
        load_tables(&self.file_path)
    }

    pub fn save(&self, ledgers: &ScoreLedgers) {
        if let Some(parent) = self.file_path.parent() {
            if let Err(error) = fs::create_dir_all(parent) {
                log::error!(
                    "[score-ledger] failed to create parent dir {}: {error}",
                    parent.display()
                );
                return;
            }
        }

        let payload = LedgerFile {
            version: 1,
            easy: stored_table(ledgers, Difficulty::Easy),
            normal: stored_table(ledgers, Difficulty::Normal),
            hard: stored_table(ledgers, Difficulty::Hard),
        };
        match serde_json::to_string_pretty(&payload) {
            Ok(text) => {
                if let Err(error) = fs::write(&self.file_path, text) {
                    log::error!(
                        "[score-ledger] failed to write {}: {error}",
                        self.file_path.display()
                    );
                }
            }
            Err(error) => {
                log::error!(
                    "[score-ledger] failed to serialize payload for {}: {error}",
                    self.file_path.display()
                );
            }
        }
    }
}

fn tier_index(tier: Difficulty) -> usize {
    match tier {
        Difficulty::Easy => 0,
        Difficulty::Normal => 1,
        Difficulty::Hard => 2,
    }
}

fn blank_table() -> Vec<ScoreEntry> {
    vec![
        ScoreEntry {
            name: String::new(),
            score: 0,
        };
        LEDGER_CAPACITY
    ]
}

fn truncate_name(name: &str) -> String {
    name.chars().take(MAX_NAME_LENGTH).collect()
}

fn stored_table(ledgers: &ScoreLedgers, tier: Difficulty) -> Vec<StoredEntry> {
    ledgers
        .entries(tier)
        .iter()
        .map(|entry| StoredEntry {
            name: entry.name.clone(),
            score: entry.score,
        })
        .collect()
}

fn load_tables(path: &Path) -> ScoreLedgers {
    let text = match fs::read_to_string(path) {
        Ok(value) => value,
        Err(error) => {
            if error.kind() != std::io::ErrorKind::NotFound {
                log::warn!("[score-ledger] failed to read {}: {error}", path.display());
            }
            return ScoreLedgers::new();
        }
    };
    let parsed: LedgerFile = match serde_json::from_str(&text) {
        Ok(value) => value,
        Err(error) => {
            log::warn!("[score-ledger] failed to parse {}: {error}", path.display());
            return ScoreLedgers::new();
        }
    };
    if parsed.version != 1 {
        log::warn!(
            "[score-ledger] unsupported version {} at {}",
            parsed.version,
            path.display()
        );
        return ScoreLedgers::new();
    }

    let mut ledgers = ScoreLedgers::new();
    for (tier, stored) in [
        (Difficulty::Easy, parsed.easy),
        (Difficulty::Normal, parsed.normal),
        (Difficulty::Hard, parsed.hard),
    ] {
        ledgers.tables[tier_index(tier)] = sanitize_table(stored);
    }
    ledgers
}

// Entries with negative scores are dropped, names are truncated, ordering
// and capacity are re-imposed, and short tables are padded back to capacity
// with blanks.
fn sanitize_table(stored: Vec<StoredEntry>) -> Vec<ScoreEntry> {
    let mut table: Vec<ScoreEntry> = stored
        .into_iter()
        .filter(|entry| entry.score >= 0)
        .map(|entry| ScoreEntry {
            name: truncate_name(entry.name.trim()),
            score: entry.score,
        })
        .collect();
    table.sort_by(|a, b| b.score.cmp(&a.score));
    table.truncate(LEDGER_CAPACITY);
    while table.len() < LEDGER_CAPACITY {
        table.push(ScoreEntry {
            name: String::new(),
            score: 0,
        });
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file(name: &str) -> PathBuf {
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        let unique = format!(
            "{}-{}-{}",
            name,
            std::process::id(),
            now_ms.saturating_add(rand::random::<u32>() as u64)
        );
        std::env::temp_dir().join(unique).join("scores.json")
    }

    #[test]
    fn tables_start_blank_at_capacity() {
        let ledgers = ScoreLedgers::new();
        for tier in Difficulty::TIERS {
            let entries = ledgers.entries(tier);
            assert_eq!(entries.len(), LEDGER_CAPACITY);
            assert!(entries.iter().all(|entry| entry.score == 0));
        }
    }

    #[test]
    fn insertion_keeps_descending_order_and_capacity() {
        let mut ledgers = ScoreLedgers::new();
        for score in [10, 50, 30, 5] {
            ledgers.insert("p", score, Difficulty::Normal);
        }
        let scores: Vec<i32> = ledgers
            .entries(Difficulty::Normal)
            .iter()
            .map(|entry| entry.score)
            .collect();
        assert_eq!(scores, vec![50, 30, 10]);
    }

    #[test]
    fn high_score_requires_strictly_beating_the_last_slot() {
        let mut ledgers = ScoreLedgers::new();
        for score in [50, 40, 30] {
            ledgers.insert("p", score, Difficulty::Hard);
        }
        assert!(!ledgers.is_high_score(30, Difficulty::Hard));
        assert!(!ledgers.is_high_score(5, Difficulty::Hard));
        assert!(ledgers.is_high_score(31, Difficulty::Hard));
    }

    #[test]
    fn non_qualifying_insert_is_a_no_op() {
        let mut ledgers = ScoreLedgers::new();
        for score in [50, 40, 30] {
            ledgers.insert("p", score, Difficulty::Easy);
        }
        assert!(!ledgers.insert("late", 30, Difficulty::Easy));
        let scores: Vec<i32> = ledgers
            .entries(Difficulty::Easy)
            .iter()
            .map(|entry| entry.score)
            .collect();
        assert_eq!(scores, vec![50, 40, 30]);
    }

    #[test]
    fn tiers_keep_independent_tables() {
        let mut ledgers = ScoreLedgers::new();
        ledgers.insert("easy", 10, Difficulty::Easy);
        ledgers.insert("hard", 90, Difficulty::Hard);
        assert_eq!(ledgers.entries(Difficulty::Easy)[0].score, 10);
        assert_eq!(ledgers.entries(Difficulty::Hard)[0].score, 90);
        assert_eq!(ledgers.entries(Difficulty::Normal)[0].score, 0);
    }

    #[test]
    fn names_are_truncated_on_insert() {
        let mut ledgers = ScoreLedgers::new();
        ledgers.insert("abcdefghijklmnop", 10, Difficulty::Easy);
        assert_eq!(ledgers.entries(Difficulty::Easy)[0].name, "abcdefghijkl");
    }

    #[test]
    fn save_then_load_round_trips_the_tables() {
        let path = temp_file("ledger-roundtrip");
        let store = LedgerStore::new(path.clone());
        let mut ledgers = ScoreLedgers::new();
        ledgers.insert("Alice", 120, Difficulty::Normal);
        ledgers.insert("Bob", 80, Difficulty::Normal);
        store.save(&ledgers);

        let loaded = store.load();
        let entries = loaded.entries(Difficulty::Normal);
        assert_eq!(entries[0].name, "Alice");
        assert_eq!(entries[0].score, 120);
        assert_eq!(entries[1].name, "Bob");
        assert_eq!(entries[1].score, 80);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn missing_file_loads_blank_tables() {
        let store = LedgerStore::new(temp_file("ledger-missing"));
        let loaded = store.load();
        assert_eq!(loaded.entries(Difficulty::Easy)[0].score, 0);
    }

    #[test]
    fn load_sanitizes_disordered_and_invalid_entries() {
        let path = temp_file("ledger-sanitize");
        let parent = path.parent().expect("parent exists").to_path_buf();
        fs::create_dir_all(&parent).expect("create dir");
        let raw = r#"{
  "version": 1,
  "easy": [
    {"name": "low", "score": 10},
    {"name": " spaced-and-overlong-name ", "score": 90},
    {"name": "bad", "score": -5}
  ],
  "normal": [],
  "hard": []
}"#;
        fs::write(&path, raw).expect("write file");

        let loaded = LedgerStore::new(path.clone()).load();
        let entries = loaded.entries(Difficulty::Easy);
        assert_eq!(entries.len(), LEDGER_CAPACITY);
        assert_eq!(entries[0].score, 90);
        assert_eq!(entries[0].name, "spaced-and-o");
        assert_eq!(entries[1].score, 10);
        assert_eq!(entries[2].score, 0);

        let _ = fs::remove_file(&path);
        let _ = fs::remove_dir_all(&parent);
    }

    #[test]
    fn unsupported_version_loads_blank_tables() {
        let path = temp_file("ledger-version");
        let parent = path.parent().expect("parent exists").to_path_buf();
        fs::create_dir_all(&parent).expect("create dir");
        let raw = r#"{"version": 9, "easy": [], "normal": [], "hard": []}"#;
        fs::write(&path, raw).expect("write file");

        let loaded = LedgerStore::new(path.clone()).load();
        assert_eq!(loaded.entries(Difficulty::Hard)[0].score, 0);

        let _ = fs::remove_file(&path);
        let _ = fs::remove_dir_all(&parent);
    }

    #[test]
    fn build_response_reports_the_requested_tier() {
        let mut ledgers = ScoreLedgers::new();
        ledgers.insert("Top", 70, Difficulty::Hard);
        let response = ledgers.build_response(Difficulty::Hard);
        assert_eq!(response.tier, Difficulty::Hard);
        assert_eq!(response.entries[0].name, "Top");
        assert!(!response.generated_at_iso.is_empty());
    }
}
