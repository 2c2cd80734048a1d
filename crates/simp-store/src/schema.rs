use rusqlite::{Connection, params};
use simp_core::ConstantKind;

use crate::error::Result;

pub const SCHEMA_VERSION: i64 = 2;

/// Default SQLite busy timeout; a locked database errors after this.
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 2000;

/// Units recorded for each constant definition:
/// (reference, secondary reference, value).
fn units(kind: ConstantKind) -> (&'static str, Option<&'static str>, Option<&'static str>) {
    match kind {
        ConstantKind::Sef => ("mm", None, Some("m²")),
        ConstantKind::Kp => ("mm", Some("mm"), None),
        ConstantKind::Densidade => ("°C", None, Some("kg/m³")),
    }
}

pub fn initialize(conn: &Connection, busy_timeout_ms: u64) -> Result<()> {
    conn.execute_batch("PRAGMA journal_mode = WAL;")?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.pragma_update(None, "busy_timeout", busy_timeout_ms as i64)?;

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS metadata (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS constante_fisica (
            cd_chave                INTEGER PRIMARY KEY,
            ds_nome                 TEXT NOT NULL UNIQUE,
            ds_unidade_referencia   TEXT NOT NULL DEFAULT '',
            ds_unidade_referencia_b TEXT,
            ds_unidade_valor        TEXT
        );

        CREATE TABLE IF NOT EXISTS constante_fisica_tabela (
            cd_chave            INTEGER PRIMARY KEY AUTOINCREMENT,
            cd_constante_fisica INTEGER NOT NULL REFERENCES constante_fisica(cd_chave),
            vl_referencia       REAL NOT NULL,
            vl_referencia_b     REAL,
            vl_valor            REAL NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_cft_constante_ref
            ON constante_fisica_tabela(cd_constante_fisica, vl_referencia);
        ",
    )?;

    // v1 databases keyed every row by a single reference value
    if conn
        .prepare("SELECT vl_referencia_b FROM constante_fisica_tabela LIMIT 0")
        .is_err()
    {
        conn.execute_batch("ALTER TABLE constante_fisica_tabela ADD COLUMN vl_referencia_b REAL;")?;
        tracing::info!("added vl_referencia_b to constante_fisica_tabela");
    }

    for kind in ConstantKind::ALL {
        let (reference, reference_b, value) = units(kind);
        conn.execute(
            "INSERT OR IGNORE INTO constante_fisica
                (ds_nome, ds_unidade_referencia, ds_unidade_referencia_b, ds_unidade_valor)
             VALUES (?1, ?2, ?3, ?4)",
            params![kind.name(), reference, reference_b, value],
        )?;
    }

    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES ('schema_version', ?1)",
        [SCHEMA_VERSION.to_string()],
    )?;

    Ok(())
}

pub fn get_schema_version(conn: &Connection) -> Result<Option<i64>> {
    let mut stmt = conn.prepare("SELECT value FROM metadata WHERE key = 'schema_version'")?;
    let version = stmt
        .query_row([], |row| {
            let v: String = row.get(0)?;
            Ok(v.parse::<i64>().unwrap_or(0))
        })
        .ok();
    Ok(version)
}
