//! V003: last_record — the most recent attributable observation per unit.

pub const MIGRATION_SQL: &str = r#"
-- One row per unit: the freshest observation that could be attributed to
-- it, with the record's age at assessment time. Rebuilt per compile run.
CREATE TABLE IF NOT EXISTS last_record (
    unit_key TEXT PRIMARY KEY,
    record_id TEXT NOT NULL,
    event_date TEXT NOT NULL,
    weight REAL NOT NULL,
    age_weeks INTEGER NOT NULL,
    assessed_date TEXT NOT NULL
) STRICT;
"#;
