//! SQL schema for the cardlink SQLite store.
//!
//! Timestamps are fixed-width RFC 3339 strings (microseconds, `Z`), so text
//! comparison orders them chronologically. Dates are `YYYY-MM-DD`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS contacts (
    contact_id                     TEXT PRIMARY KEY,
    name                           TEXT NOT NULL,
    phone_number                   TEXT,
    email_address                  TEXT,
    secondary_phone_number         TEXT,
    secondary_email                TEXT,
    dob                            TEXT,
    gender                         TEXT,
    nationality                    TEXT,
    marital_status                 TEXT,
    category                       TEXT CHECK (category IN ('A', 'B', 'C')),
    emergency_contact_name         TEXT,
    emergency_contact_relationship TEXT,
    emergency_contact_phone_number TEXT,
    skills                         TEXT,
    linkedin_url                   TEXT,
    logger                         TEXT,
    rejected                       INTEGER NOT NULL DEFAULT 0,
    created_by                     TEXT,
    created_at                     TEXT NOT NULL,
    updated_at                     TEXT
);

-- Live contacts may not share an email address or a phone number.
CREATE UNIQUE INDEX IF NOT EXISTS contacts_live_email
    ON contacts (email_address)
    WHERE rejected = 0 AND email_address IS NOT NULL;
CREATE UNIQUE INDEX IF NOT EXISTS contacts_live_phone
    ON contacts (phone_number)
    WHERE rejected = 0 AND phone_number IS NOT NULL;

CREATE TABLE IF NOT EXISTS contact_addresses (
    contact_id TEXT PRIMARY KEY REFERENCES contacts(contact_id),
    street     TEXT,
    city       TEXT,
    state      TEXT,
    country    TEXT,
    zipcode    TEXT
);

CREATE TABLE IF NOT EXISTS contact_education (
    contact_id         TEXT PRIMARY KEY REFERENCES contacts(contact_id),
    pg_course_name     TEXT,
    pg_college_name    TEXT,
    pg_university_type TEXT,
    pg_start_date      TEXT,
    pg_end_date        TEXT,
    ug_course_name     TEXT,
    ug_college_name    TEXT,
    ug_university_type TEXT,
    ug_start_date      TEXT,
    ug_end_date        TEXT
);

CREATE TABLE IF NOT EXISTS contact_experience (
    experience_id   TEXT PRIMARY KEY,
    contact_id      TEXT NOT NULL REFERENCES contacts(contact_id),
    position        INTEGER NOT NULL,
    job_title       TEXT,
    company_name    TEXT,
    department_type TEXT,
    from_date       TEXT,
    to_date         TEXT,
    company_skills  TEXT
);
CREATE INDEX IF NOT EXISTS contact_experience_contact
    ON contact_experience (contact_id, position);

-- contact_id is NULL for photo-derived events awaiting a contact.
CREATE TABLE IF NOT EXISTS events (
    event_id                TEXT PRIMARY KEY,
    contact_id              TEXT REFERENCES contacts(contact_id),
    photo_id                TEXT,
    event_name              TEXT NOT NULL,
    event_role              TEXT,
    event_date              TEXT,
    event_held_organization TEXT,
    event_location          TEXT,
    verified                INTEGER NOT NULL DEFAULT 0,
    contact_status          TEXT NOT NULL DEFAULT 'pending'
                            CHECK (contact_status IN ('pending', 'approved', 'rejected')),
    created_by              TEXT,
    created_at              TEXT NOT NULL,
    updated_at              TEXT
);
CREATE INDEX IF NOT EXISTS events_contact ON events (contact_id);
CREATE INDEX IF NOT EXISTS events_photo   ON events (photo_id, event_name);

CREATE TABLE IF NOT EXISTS user_assignments (
    assignment_id TEXT PRIMARY KEY,
    event_id      TEXT NOT NULL REFERENCES events(event_id) ON DELETE CASCADE,
    assigned_to   TEXT NOT NULL,
    assigned_by   TEXT NOT NULL,
    completed     INTEGER NOT NULL DEFAULT 0,
    created_at    TEXT NOT NULL
);
-- At most one active assignment per event.
CREATE UNIQUE INDEX IF NOT EXISTS user_assignments_active
    ON user_assignments (event_id)
    WHERE completed = 0;
CREATE INDEX IF NOT EXISTS user_assignments_to ON user_assignments (assigned_to);
CREATE INDEX IF NOT EXISTS user_assignments_by ON user_assignments (assigned_by);

-- Append-only. No UPDATE or DELETE is ever issued against this table, and it
-- deliberately has no foreign key so records outlive what they describe.
CREATE TABLE IF NOT EXISTS contact_modification_history (
    history_id        TEXT PRIMARY KEY,
    contact_id        TEXT NOT NULL,
    modified_by       TEXT NOT NULL,   -- user uuid or 'system'
    modification_type TEXT NOT NULL CHECK (modification_type IN (
        'CREATE', 'UPDATE', 'USER UPDATE', 'USER VERIFY',
        'ASSIGN', 'DELETE', 'CONTACT', 'UPDATE USER EVENT'
    )),
    description       TEXT NOT NULL,
    created_at        TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS history_contact
    ON contact_modification_history (contact_id, modification_type, created_at);

CREATE TABLE IF NOT EXISTS tasks (
    task_id                TEXT PRIMARY KEY,
    task_title             TEXT NOT NULL,
    task_description       TEXT,
    task_deadline          TEXT NOT NULL,
    task_assigned_category TEXT,
    task_type              TEXT NOT NULL CHECK (task_type IN ('assigned', 'automated')),
    task_completion        INTEGER NOT NULL DEFAULT 0,
    contact_id             TEXT,
    created_at             TEXT NOT NULL,
    updated_at             TEXT
);
CREATE INDEX IF NOT EXISTS tasks_open
    ON tasks (contact_id, task_type, task_completion);
";
