//! V002: Evidence schema — the reconciled opinion table and the
//! per-(unit, category, period) evidence map.

pub const MIGRATION_SQL: &str = r#"
-- One reconciled opinion per (unit, year, category). Replaced wholesale
-- for the span being recomputed.
CREATE TABLE IF NOT EXISTS adjusted_opinions (
    unit_key TEXT NOT NULL,
    year INTEGER NOT NULL,
    category TEXT NOT NULL,
    status TEXT NOT NULL,
    weight REAL NOT NULL,
    PRIMARY KEY (unit_key, year, category)
) STRICT;

-- The evidence map: one row per (unit, category, period) carrying every
-- per-period value the compiler reads or writes.
CREATE TABLE IF NOT EXISTS evidence (
    unit_key TEXT NOT NULL,
    category TEXT NOT NULL,
    period INTEGER NOT NULL,
    recent_weight REAL,
    historical_weight REAL,
    documented INTEGER NOT NULL DEFAULT 0,
    previously_documented INTEGER NOT NULL DEFAULT 0,
    opinion_status TEXT,
    opinion_weight REAL,
    presence_code INTEGER,
    extralimital INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (unit_key, category, period)
) STRICT;

CREATE INDEX IF NOT EXISTS idx_evidence_cat_period
    ON evidence(category, period);

-- Simplified binary view of compiled codes for downstream consumers.
CREATE TABLE IF NOT EXISTS simplified_results (
    unit_key TEXT NOT NULL,
    category TEXT NOT NULL,
    period INTEGER NOT NULL,
    present INTEGER,
    PRIMARY KEY (unit_key, category, period)
) STRICT;
"#;
