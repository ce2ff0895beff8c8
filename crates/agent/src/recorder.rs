use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::{params, Connection};

use crate::actor::GameResult;

/// Minimal session recorder that writes `metadata.db` with `runs` and
/// `session` tables.
///
/// Schema:
/// - runs(id INTEGER PRIMARY KEY, seed BIGINT, moves INT, score INT,
///   max_tile INT, win INT, total_reward REAL)
/// - session(meta_key TEXT PRIMARY KEY, meta_value TEXT)
pub struct SessionRecorder {
    session_dir: PathBuf,
    conn: Connection,
}

impl SessionRecorder {
    /// Create or open a session at `dir`, ensuring the schema exists.
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let session_dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&session_dir)
            .with_context(|| format!("failed to create session dir {}", session_dir.display()))?;
        let db_path = session_dir.join("metadata.db");
        let conn = Connection::open(&db_path)
            .with_context(|| format!("failed to open {}", db_path.display()))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS runs (
                id INTEGER PRIMARY KEY,
                seed BIGINT NOT NULL,
                moves INT NOT NULL,
                score INT NOT NULL,
                max_tile INT NOT NULL,
                win INT NOT NULL,
                total_reward REAL NOT NULL
            );
            CREATE TABLE IF NOT EXISTS session (
                meta_key TEXT PRIMARY KEY,
                meta_value TEXT NOT NULL
            );
            "#,
        )
        .context("failed to create session schema")?;
        Ok(Self { session_dir, conn })
    }

    /// Directory this session lives in.
    pub fn session_dir(&self) -> &Path {
        &self.session_dir
    }

    /// Insert or update a run summary row.
    pub fn upsert_run(&mut self, r: &GameResult) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO runs (id, seed, moves, score, max_tile, win, total_reward) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
                 ON CONFLICT(id) DO UPDATE SET seed=excluded.seed, moves=excluded.moves, \
                 score=excluded.score, max_tile=excluded.max_tile, win=excluded.win, \
                 total_reward=excluded.total_reward",
                params![
                    i64::from(r.game_id),
                    r.seed as i64,
                    r.moves as i64,
                    r.score as i64,
                    i64::from(r.max_tile),
                    i64::from(r.win),
                    f64::from(r.total_reward),
                ],
            )
            .with_context(|| format!("failed to record run {}", r.game_id))?;
        Ok(())
    }

    /// Insert or update a session metadata entry.
    pub fn set_meta(&mut self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO session (meta_key, meta_value) VALUES (?1, ?2) \
                 ON CONFLICT(meta_key) DO UPDATE SET meta_value=excluded.meta_value",
                params![key, value],
            )
            .with_context(|| format!("failed to set session meta {key}"))?;
        Ok(())
    }

    /// Number of recorded runs.
    pub fn run_count(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM runs", [], |row| row.get(0))
            .context("failed to count runs")?;
        Ok(count as u64)
    }

    /// Load a recorded run back, if present.
    pub fn load_run(&self, game_id: u32) -> Result<Option<GameResult>> {
        use rusqlite::OptionalExtension;
        let row = self
            .conn
            .query_row(
                "SELECT id, seed, moves, score, max_tile, win, total_reward \
                 FROM runs WHERE id = ?1",
                params![i64::from(game_id)],
                |row| {
                    Ok(GameResult {
                        game_id: row.get::<_, i64>(0)? as u32,
                        seed: row.get::<_, i64>(1)? as u64,
                        moves: row.get::<_, i64>(2)? as u64,
                        score: row.get::<_, i64>(3)? as u64,
                        max_tile: row.get::<_, i64>(4)? as u32,
                        win: row.get::<_, i64>(5)? != 0,
                        total_reward: row.get::<_, f64>(6)? as f32,
                    })
                },
            )
            .optional()
            .with_context(|| format!("failed to load run {game_id}"))?;
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(game_id: u32) -> GameResult {
        GameResult {
            game_id,
            seed: 1000 + u64::from(game_id),
            moves: 240,
            score: 3612,
            max_tile: 256,
            win: false,
            total_reward: 101.5,
        }
    }

    #[test]
    fn runs_round_trip_through_the_database() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut recorder = SessionRecorder::new(dir.path().join("session")).expect("recorder");

        for id in 0..3 {
            recorder.upsert_run(&result(id)).expect("upsert");
        }
        assert_eq!(recorder.run_count().expect("count"), 3);
        assert_eq!(recorder.load_run(1).expect("load"), Some(result(1)));
        assert_eq!(recorder.load_run(9).expect("load"), None);

        // Upserting the same id replaces the row instead of duplicating it.
        let mut updated = result(1);
        updated.score = 9999;
        updated.win = true;
        recorder.upsert_run(&updated).expect("upsert");
        assert_eq!(recorder.run_count().expect("count"), 3);
        assert_eq!(recorder.load_run(1).expect("load"), Some(updated));
    }

    #[test]
    fn session_metadata_is_upserted() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut recorder = SessionRecorder::new(dir.path()).expect("recorder");
        recorder.set_meta("policy", "lookahead").expect("meta");
        recorder.set_meta("policy", "random").expect("meta");
        assert!(recorder.session_dir().join("metadata.db").exists());
    }
}
