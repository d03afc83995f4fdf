//! SQL schema for the Krishi SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! the `PRAGMA user_version` number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS admins (
    admin_id      TEXT PRIMARY KEY,
    username      TEXT NOT NULL UNIQUE,
    name          TEXT NOT NULL,
    password_hash TEXT NOT NULL,
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS executives (
    executive_id  TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    email         TEXT NOT NULL UNIQUE,
    mobile        TEXT,
    region        TEXT,
    password_hash TEXT NOT NULL,
    created_at    TEXT NOT NULL
);

-- assigned_executive is the single source of truth for the
-- executive<->farmer link; the executive side is derived by query.
CREATE TABLE IF NOT EXISTS farmers (
    farmer_id          TEXT PRIMARY KEY,
    name               TEXT NOT NULL,
    mobile             TEXT NOT NULL UNIQUE,
    village            TEXT,
    panchayat          TEXT,
    caste              TEXT,
    gender             TEXT,            -- 'male' | 'female' | 'other'
    income             INTEGER,
    estimated_income   INTEGER,
    credit_score       INTEGER,
    crops              TEXT NOT NULL DEFAULT '[]',  -- JSON array of strings
    assigned_executive TEXT REFERENCES executives(executive_id),
    password_hash      TEXT NOT NULL,
    created_at         TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS field_photos (
    photo_id     TEXT PRIMARY KEY,
    farmer_id    TEXT NOT NULL REFERENCES farmers(farmer_id) ON DELETE CASCADE,
    path         TEXT NOT NULL,
    content_hash TEXT NOT NULL,          -- SHA-256 hex of the file bytes
    media_type   TEXT NOT NULL,
    uploaded_by  TEXT NOT NULL,          -- role wire name
    latitude     REAL,
    longitude    REAL,
    uploaded_at  TEXT NOT NULL
);

-- farmer_id is immutable after creation; no UPDATE ever touches it.
CREATE TABLE IF NOT EXISTS requests (
    request_id         TEXT PRIMARY KEY,
    farmer_id          TEXT NOT NULL REFERENCES farmers(farmer_id) ON DELETE CASCADE,
    assigned_executive TEXT REFERENCES executives(executive_id) ON DELETE SET NULL,
    title              TEXT NOT NULL,
    description        TEXT NOT NULL,
    category           TEXT,
    priority           TEXT NOT NULL,    -- 'low' | 'medium' | 'high'
    status             TEXT NOT NULL,    -- 'pending' | 'in-progress' | 'resolved' | 'rejected'
    created_at         TEXT NOT NULL,
    resolved_at        TEXT
);

-- Comments are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS request_comments (
    comment_id  TEXT PRIMARY KEY,
    request_id  TEXT NOT NULL REFERENCES requests(request_id) ON DELETE CASCADE,
    author_role TEXT NOT NULL,
    author_id   TEXT NOT NULL,
    body        TEXT NOT NULL,
    posted_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS schemes (
    scheme_id            TEXT PRIMARY KEY,
    title                TEXT NOT NULL,
    category             TEXT,
    description          TEXT NOT NULL,
    eligibility          TEXT NOT NULL DEFAULT '[]',  -- JSON array of strings
    benefits             TEXT NOT NULL DEFAULT '[]',
    application_process  TEXT NOT NULL DEFAULT '[]',
    required_documents   TEXT NOT NULL DEFAULT '[]',
    application_deadline TEXT,                        -- ISO calendar date
    contact_info         TEXT,
    status               TEXT NOT NULL,  -- 'active' | 'inactive' | 'upcoming'
    relevance            TEXT NOT NULL,  -- 'high' | 'medium' | 'low'
    created_at           TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS saved_schemes (
    farmer_id TEXT NOT NULL REFERENCES farmers(farmer_id) ON DELETE CASCADE,
    scheme_id TEXT NOT NULL REFERENCES schemes(scheme_id) ON DELETE CASCADE,
    saved_at  TEXT NOT NULL,
    PRIMARY KEY (farmer_id, scheme_id)
);

CREATE TABLE IF NOT EXISTS scheme_applications (
    application_id TEXT PRIMARY KEY,
    reference      TEXT NOT NULL UNIQUE,  -- 'APP-YYYYMMDD-NNNN'
    farmer_id      TEXT NOT NULL REFERENCES farmers(farmer_id) ON DELETE CASCADE,
    scheme_id      TEXT NOT NULL REFERENCES schemes(scheme_id),
    status         TEXT NOT NULL,  -- 'pending' | 'under-review' | 'approved' | 'rejected' | 'on-hold'
    reviewed_by    TEXT,           -- admin id; stamped once, never overwritten
    review_date    TEXT,
    submitted_at   TEXT NOT NULL
);

-- At most one live (non-rejected) application per farmer and scheme.
CREATE UNIQUE INDEX IF NOT EXISTS applications_live_unique
    ON scheme_applications(farmer_id, scheme_id)
    WHERE status != 'rejected';

-- History rows are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS application_history (
    history_id     TEXT PRIMARY KEY,
    application_id TEXT NOT NULL REFERENCES scheme_applications(application_id) ON DELETE CASCADE,
    status         TEXT NOT NULL,
    remarks        TEXT,
    actor_role     TEXT NOT NULL,
    actor_id       TEXT NOT NULL,
    changed_at     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS application_documents (
    document_id    TEXT PRIMARY KEY,
    application_id TEXT NOT NULL REFERENCES scheme_applications(application_id) ON DELETE CASCADE,
    name           TEXT NOT NULL,
    verified       INTEGER NOT NULL DEFAULT 0,
    position       INTEGER NOT NULL     -- submission order
);

CREATE TABLE IF NOT EXISTS field_statuses (
    farmer_id  TEXT PRIMARY KEY REFERENCES farmers(farmer_id) ON DELETE CASCADE,
    health     TEXT NOT NULL,            -- 'green' | 'yellow' | 'red'
    notes      TEXT,
    updated_at TEXT NOT NULL
);

-- The dispatch log is strictly append-only.
CREATE TABLE IF NOT EXISTS sms_log (
    entry_id     TEXT PRIMARY KEY,
    executive_id TEXT NOT NULL REFERENCES executives(executive_id) ON DELETE CASCADE,
    message      TEXT NOT NULL,
    recipients   TEXT NOT NULL DEFAULT '[]',  -- JSON array of normalised numbers
    sent         INTEGER NOT NULL,
    failed       INTEGER NOT NULL,
    simulated    INTEGER NOT NULL,
    sent_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS settings (
    id                     INTEGER PRIMARY KEY CHECK (id = 1),
    notification_templates TEXT NOT NULL DEFAULT '[]',  -- JSON array of {name, body}
    sms_enabled            INTEGER NOT NULL DEFAULT 1,
    maintenance_mode       INTEGER NOT NULL DEFAULT 0,
    updated_at             TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS farmers_executive_idx   ON farmers(assigned_executive);
CREATE INDEX IF NOT EXISTS photos_farmer_idx       ON field_photos(farmer_id);
CREATE INDEX IF NOT EXISTS requests_farmer_idx     ON requests(farmer_id);
CREATE INDEX IF NOT EXISTS requests_executive_idx  ON requests(assigned_executive);
CREATE INDEX IF NOT EXISTS requests_status_idx     ON requests(status);
CREATE INDEX IF NOT EXISTS comments_request_idx    ON request_comments(request_id);
CREATE INDEX IF NOT EXISTS applications_farmer_idx ON scheme_applications(farmer_id);
CREATE INDEX IF NOT EXISTS applications_status_idx ON scheme_applications(status);
CREATE INDEX IF NOT EXISTS history_application_idx ON application_history(application_id);
CREATE INDEX IF NOT EXISTS documents_application_idx ON application_documents(application_id);
CREATE INDEX IF NOT EXISTS sms_log_executive_idx   ON sms_log(executive_id);

PRAGMA user_version = 1;
";
