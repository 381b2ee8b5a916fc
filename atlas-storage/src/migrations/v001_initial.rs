//! V001: Initial schema — source tables.
//! grid_units, units, legacy_range, observations, opinions, compile_runs.

pub const MIGRATION_SQL: &str = r#"
-- Reference grid: every assessable tile with its geometry and centroid.
-- Loaded once from the external grid source; read-only afterwards.
CREATE TABLE IF NOT EXISTS grid_units (
    unit_key TEXT PRIMARY KEY,
    geometry_json TEXT NOT NULL,
    centroid_x REAL NOT NULL,
    centroid_y REAL NOT NULL,
    min_x REAL NOT NULL,
    min_y REAL NOT NULL,
    max_x REAL NOT NULL,
    max_y REAL NOT NULL
) STRICT;

CREATE INDEX IF NOT EXISTS idx_grid_units_bbox
    ON grid_units(min_x, max_x, min_y, max_y);

-- Spatial units referenced by any evidence source. Created on first
-- reference, never deleted. Geometry is filled lazily from grid_units.
CREATE TABLE IF NOT EXISTS units (
    unit_key TEXT PRIMARY KEY,
    geometry_json TEXT,
    centroid_x REAL,
    centroid_y REAL
) STRICT;

-- Legacy baseline classification, one-time external feed.
CREATE TABLE IF NOT EXISTS legacy_range (
    unit_key TEXT PRIMARY KEY,
    presence INTEGER NOT NULL,
    origin INTEGER,
    reproduction INTEGER,
    season INTEGER
) STRICT;

-- Occurrence records with pre-computed footprints.
CREATE TABLE IF NOT EXISTS observations (
    record_id TEXT PRIMARY KEY,
    event_date TEXT NOT NULL,
    event_year INTEGER NOT NULL,
    event_month INTEGER NOT NULL,
    weight REAL NOT NULL,
    weight_notes TEXT,
    footprint_json TEXT NOT NULL,
    footprint_area REAL NOT NULL,
    min_x REAL NOT NULL,
    min_y REAL NOT NULL,
    max_x REAL NOT NULL,
    max_y REAL NOT NULL
) STRICT;

CREATE INDEX IF NOT EXISTS idx_observations_year
    ON observations(event_year, event_month);

-- Raw expert opinions, append-only as delivered.
CREATE TABLE IF NOT EXISTS opinions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    unit_key TEXT NOT NULL,
    year INTEGER NOT NULL,
    category TEXT NOT NULL,
    expert TEXT NOT NULL,
    status TEXT NOT NULL,
    expert_rank INTEGER NOT NULL,
    confidence INTEGER NOT NULL,
    justification TEXT,
    entry_time TEXT NOT NULL
) STRICT;

CREATE INDEX IF NOT EXISTS idx_opinions_key
    ON opinions(unit_key, year, category);

-- Compile run bookkeeping: append-only log of pipeline runs.
CREATE TABLE IF NOT EXISTS compile_runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at INTEGER NOT NULL,
    completed_at INTEGER,
    categories TEXT NOT NULL,
    period_count INTEGER NOT NULL,
    status TEXT NOT NULL DEFAULT 'running',
    stage_errors INTEGER,
    error TEXT
) STRICT;

CREATE INDEX IF NOT EXISTS idx_compile_runs_time
    ON compile_runs(started_at DESC);
"#;
