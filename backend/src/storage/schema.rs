/// Tables backing the roster and scan collections.
///
/// `scans.code` is UNIQUE: the constraint is what keeps two concurrent scans of
/// the same code from both being recorded.
pub(super) const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS roster (
    id           TEXT PRIMARY KEY,
    code         TEXT NOT NULL,
    name         TEXT NOT NULL,
    admission_id TEXT NOT NULL,
    email        TEXT,
    phone        TEXT,
    course       TEXT,
    status       TEXT,
    ingested_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS roster_code_idx ON roster (code);

CREATE TABLE IF NOT EXISTS scans (
    id                TEXT PRIMARY KEY,
    code              TEXT NOT NULL UNIQUE,
    name              TEXT NOT NULL,
    admission_id      TEXT NOT NULL,
    scanned_at        TEXT NOT NULL,
    roster_record_ref TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS roster_ingestions (
    id             INTEGER PRIMARY KEY CHECK (id = 1),
    digest         TEXT NOT NULL,
    accepted_count INTEGER NOT NULL,
    ingested_at    TEXT NOT NULL
);
";
