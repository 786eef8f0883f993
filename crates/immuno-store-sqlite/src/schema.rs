//! SQL schema for the immunization SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Catalog entries mirrored from inventory. Write-once.
CREATE TABLE IF NOT EXISTS stock (
    stock_id       INTEGER PRIMARY KEY,
    vaccine_id     INTEGER NOT NULL,
    name           TEXT NOT NULL,
    expiry_date    TEXT,            -- YYYY-MM-DD or NULL
    total_doses    INTEGER NOT NULL CHECK (total_doses >= 0),
    dosing_json    TEXT NOT NULL,   -- JSON-encoded Dosing
    registered_at  TEXT NOT NULL    -- ISO 8601 UTC
);

-- Administered doses are strictly append-only.
CREATE TABLE IF NOT EXISTS vaccinations (
    record_id             TEXT PRIMARY KEY,
    patient_id            INTEGER NOT NULL,
    vaccine_id            INTEGER NOT NULL,
    stock_id              INTEGER NOT NULL,
    dose_number           INTEGER NOT NULL CHECK (dose_number > 0),
    administered_on       TEXT NOT NULL,  -- YYYY-MM-DD
    total_doses           INTEGER NOT NULL,
    follow_up_date        TEXT,
    follow_up_description TEXT,
    vitals_json           TEXT NOT NULL DEFAULT '{}',
    remarks               TEXT,
    recorded_by           TEXT NOT NULL,
    recorded_at           TEXT NOT NULL   -- ISO 8601 UTC; server-assigned
);

CREATE TRIGGER IF NOT EXISTS stock_no_update BEFORE UPDATE ON stock
BEGIN SELECT RAISE(ABORT, 'stock entries are immutable'); END;

CREATE TRIGGER IF NOT EXISTS vaccinations_no_update BEFORE UPDATE ON vaccinations
BEGIN SELECT RAISE(ABORT, 'vaccination records are append-only'); END;

CREATE TRIGGER IF NOT EXISTS vaccinations_no_delete BEFORE DELETE ON vaccinations
BEGIN SELECT RAISE(ABORT, 'vaccination records are append-only'); END;

CREATE INDEX IF NOT EXISTS vaccinations_patient_idx
    ON vaccinations(patient_id, vaccine_id);
CREATE INDEX IF NOT EXISTS vaccinations_administered_idx
    ON vaccinations(administered_on);

PRAGMA user_version = 1;
";
