//! SQLite schema definitions
//!
//! Initial schema with all tables. No migrations needed for first version.

/// Complete schema SQL
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL CHECK(length(name) >= 1 AND length(name) <= 200),
    image_url TEXT,
    like_count INTEGER NOT NULL DEFAULT 0 CHECK(like_count >= 0),
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);
"#;
