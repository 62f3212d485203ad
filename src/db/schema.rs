pub const SCHEMA: &str = r#"
-- sources table (administrative data; the refresh flows only read it)
CREATE TABLE IF NOT EXISTS sources (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    clone_url TEXT NOT NULL,
    web_url TEXT,
    kind TEXT NOT NULL DEFAULT 'git',
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_sources_name ON sources(name);

-- banner_events table (derived snapshot, fully rewritten each refresh)
CREATE TABLE IF NOT EXISTS banner_events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    version TEXT NOT NULL,
    name TEXT NOT NULL,
    locale TEXT NOT NULL,
    sort_order INTEGER NOT NULL,
    active_from TEXT NOT NULL,
    active_to TEXT NOT NULL,
    banner_type INTEGER NOT NULL,
    featured_rare TEXT NOT NULL,
    featured_epic TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_banner_events_sort_order ON banner_events(sort_order);

-- known_items table (derived snapshot, fully rewritten each refresh)
CREATE TABLE IF NOT EXISTS known_items (
    id INTEGER PRIMARY KEY,
    quality INTEGER NOT NULL
);
"#;
