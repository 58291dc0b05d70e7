//! Table definitions, applied idempotently at start-up.

pub const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        email TEXT UNIQUE,
        name TEXT,
        subscription TEXT DEFAULT 'free',
        interests TEXT,
        frequency INTEGER DEFAULT 3,
        granularity TEXT DEFAULT 'auto',
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP
    );

    CREATE TABLE IF NOT EXISTS content (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        topic TEXT NOT NULL,
        concept TEXT,
        content TEXT NOT NULL,
        type TEXT NOT NULL DEFAULT 'info',
        granularity TEXT DEFAULT 'auto',
        difficulty INTEGER DEFAULT 25,
        options TEXT,
        correct_answer INTEGER,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP
    );
    CREATE INDEX IF NOT EXISTS idx_content_topic ON content (topic, granularity);

    CREATE TABLE IF NOT EXISTS progress (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        content_id INTEGER NOT NULL,
        completed BOOLEAN DEFAULT FALSE,
        score INTEGER,
        timestamp DATETIME DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY(user_id) REFERENCES users(id),
        FOREIGN KEY(content_id) REFERENCES content(id)
    );
    CREATE INDEX IF NOT EXISTS idx_progress_user ON progress (user_id, timestamp);

    CREATE TABLE IF NOT EXISTS knowledge_profile (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        topic TEXT NOT NULL,
        concept TEXT NOT NULL,
        proficiency_level INTEGER DEFAULT 0,
        last_practiced DATETIME,
        confidence_score REAL DEFAULT 0.0,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
        UNIQUE(user_id, topic, concept),
        FOREIGN KEY(user_id) REFERENCES users(id)
    );

    CREATE TABLE IF NOT EXISTS knowledge_concepts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        topic TEXT NOT NULL,
        concept TEXT NOT NULL,
        description TEXT,
        difficulty_level INTEGER DEFAULT 1,
        prerequisites TEXT,
        granularity_required TEXT DEFAULT 'high',
        UNIQUE(topic, concept)
    );
";
