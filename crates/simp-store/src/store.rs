use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use simp_core::{
    ConstantKind, ConstantStore, DENSITY_TABLE, KP_TABLE, LookupResult, ReferencePoint, SEF_TABLE,
};

use crate::config::DatabaseConfig;
use crate::error::{Result, StoreError};
use crate::schema::{self, DEFAULT_BUSY_TIMEOUT_MS};

/// One calibrated value in `constante_fisica_tabela`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceRow {
    pub id: i64,
    pub kind: ConstantKind,
    pub reference: f64,
    pub reference_b: Option<f64>,
    pub value: f64,
}

/// A row of `constante_fisica`: the constant and its units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstantDefinition {
    pub id: i64,
    pub name: String,
    pub reference_unit: String,
    pub reference_b_unit: Option<String>,
    pub value_unit: Option<String>,
}

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with(path, &DatabaseConfig::default())
    }

    pub fn open_with(path: &Path, config: &DatabaseConfig) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        schema::initialize(&conn, config.busy_timeout_ms)?;
        tracing::info!("opened reference store at {}", path.display());
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn, DEFAULT_BUSY_TIMEOUT_MS)?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    // --- Definitions ---

    pub fn definitions(&self) -> Result<Vec<ConstantDefinition>> {
        let mut stmt = self.conn.prepare(
            "SELECT cd_chave, ds_nome, ds_unidade_referencia, ds_unidade_referencia_b, ds_unidade_valor
             FROM constante_fisica ORDER BY cd_chave",
        )?;
        stmt.query_map([], |row| {
            Ok(ConstantDefinition {
                id: row.get(0)?,
                name: row.get(1)?,
                reference_unit: row.get(2)?,
                reference_b_unit: row.get(3)?,
                value_unit: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<_, _>>()
        .map_err(StoreError::from)
    }

    fn definition_id(&self, kind: ConstantKind) -> Result<i64> {
        self.conn
            .query_row(
                "SELECT cd_chave FROM constante_fisica WHERE ds_nome = ?1",
                [kind.name()],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| StoreError::InvalidData(format!("no definition for {}", kind.name())))
    }

    // --- Reference rows ---

    /// Insert or update the row keyed by (`reference`, `reference_b`).
    pub fn upsert_reference(
        &self,
        kind: ConstantKind,
        reference: f64,
        reference_b: Option<f64>,
        value: f64,
    ) -> Result<i64> {
        validate_key(kind, reference, reference_b)?;
        if !value.is_finite() {
            return Err(StoreError::InvalidData(format!("value must be finite, got {value}")));
        }
        let constant_id = self.definition_id(kind)?;

        let tx = self.conn.unchecked_transaction()?;
        let existing: Option<i64> = tx
            .query_row(
                "SELECT cd_chave FROM constante_fisica_tabela
                 WHERE cd_constante_fisica = ?1 AND vl_referencia = ?2 AND vl_referencia_b IS ?3
                 ORDER BY cd_chave LIMIT 1",
                params![constant_id, reference, reference_b],
                |row| row.get(0),
            )
            .optional()?;

        let id = match existing {
            Some(id) => {
                tx.execute(
                    "UPDATE constante_fisica_tabela SET vl_valor = ?1 WHERE cd_chave = ?2",
                    params![value, id],
                )?;
                id
            }
            None => {
                tx.execute(
                    "INSERT INTO constante_fisica_tabela
                        (cd_constante_fisica, vl_referencia, vl_referencia_b, vl_valor)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![constant_id, reference, reference_b, value],
                )?;
                tx.last_insert_rowid()
            }
        };
        tx.commit()?;

        tracing::debug!("{} [{reference}, {reference_b:?}] = {value} (row {id})", kind.name());
        Ok(id)
    }

    /// Delete the rows keyed by (`reference`, `reference_b`). Returns whether
    /// anything was removed.
    pub fn delete_reference(
        &self,
        kind: ConstantKind,
        reference: f64,
        reference_b: Option<f64>,
    ) -> Result<bool> {
        validate_key(kind, reference, reference_b)?;
        let constant_id = self.definition_id(kind)?;
        let rows = self.conn.execute(
            "DELETE FROM constante_fisica_tabela
             WHERE cd_constante_fisica = ?1 AND vl_referencia = ?2 AND vl_referencia_b IS ?3",
            params![constant_id, reference, reference_b],
        )?;
        Ok(rows > 0)
    }

    /// All reference rows, optionally for one kind only.
    pub fn list_references(&self, kind: Option<ConstantKind>) -> Result<Vec<ReferenceRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT cft.cd_chave, cf.ds_nome, cft.vl_referencia, cft.vl_referencia_b, cft.vl_valor
             FROM constante_fisica_tabela cft
             INNER JOIN constante_fisica cf ON cf.cd_chave = cft.cd_constante_fisica
             WHERE ?1 IS NULL OR cf.ds_nome = ?1
             ORDER BY cf.cd_chave, cft.vl_referencia, cft.vl_referencia_b",
        )?;

        let rows: Vec<(i64, String, f64, Option<f64>, f64)> = stmt
            .query_map([kind.map(ConstantKind::name)], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
            })?
            .collect::<std::result::Result<_, _>>()?;

        rows.into_iter()
            .map(|(id, name, reference, reference_b, value)| {
                Ok(ReferenceRow {
                    id,
                    kind: parse_kind(&name)?,
                    reference,
                    reference_b,
                    value,
                })
            })
            .collect()
    }

    /// Load the standard reference tables into the store.
    ///
    /// Densities are written in kg/m³. Without `overwrite`, keys that already
    /// have a row are left alone. Returns the number of rows written.
    pub fn seed_standard_tables(&self, overwrite: bool) -> Result<usize> {
        let mut entries: Vec<(ConstantKind, f64, Option<f64>, f64)> = Vec::new();
        entries.extend(SEF_TABLE.iter().map(|&(dn, v)| (ConstantKind::Sef, dn, None, v)));
        for row in KP_TABLE {
            entries.extend(
                row.by_diameter
                    .iter()
                    .map(|&(dn, v)| (ConstantKind::Kp, row.projection, Some(dn), v)),
            );
        }
        entries.extend(
            DENSITY_TABLE
                .iter()
                .map(|&(t, v)| (ConstantKind::Densidade, t, None, v)),
        );

        let mut written = 0;
        for (kind, reference, reference_b, value) in entries {
            if !overwrite && self.exact_row(kind, reference, reference_b)?.is_some() {
                continue;
            }
            self.upsert_reference(kind, reference, reference_b, value)?;
            written += 1;
        }

        tracing::info!("seeded {written} reference rows (overwrite={overwrite})");
        Ok(written)
    }

    // --- Resolver lookups ---

    /// Value at exactly `reference`; `reference_b` is only matched when given.
    pub fn exact_row(
        &self,
        kind: ConstantKind,
        reference: f64,
        reference_b: Option<f64>,
    ) -> Result<Option<f64>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT cft.vl_valor
             FROM constante_fisica_tabela cft
             INNER JOIN constante_fisica cf ON cf.cd_chave = cft.cd_constante_fisica
             WHERE cf.ds_nome = ?1 AND cft.vl_referencia = ?2
               AND (?3 IS NULL OR cft.vl_referencia_b = ?3)
             ORDER BY cft.cd_chave LIMIT 1",
        )?;
        let value = stmt
            .query_row(params![kind.name(), reference, reference_b], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    /// Greatest reference at or below `reference`.
    pub fn floor_row(&self, kind: ConstantKind, reference: f64) -> Result<Option<ReferencePoint>> {
        self.bound_row(
            "SELECT cft.vl_referencia, cft.vl_valor
             FROM constante_fisica_tabela cft
             INNER JOIN constante_fisica cf ON cf.cd_chave = cft.cd_constante_fisica
             WHERE cf.ds_nome = ?1 AND cft.vl_referencia <= ?2
             ORDER BY cft.vl_referencia DESC, cft.cd_chave LIMIT 1",
            kind,
            reference,
        )
    }

    /// Least reference at or above `reference`.
    pub fn ceiling_row(&self, kind: ConstantKind, reference: f64) -> Result<Option<ReferencePoint>> {
        self.bound_row(
            "SELECT cft.vl_referencia, cft.vl_valor
             FROM constante_fisica_tabela cft
             INNER JOIN constante_fisica cf ON cf.cd_chave = cft.cd_constante_fisica
             WHERE cf.ds_nome = ?1 AND cft.vl_referencia >= ?2
             ORDER BY cft.vl_referencia ASC, cft.cd_chave LIMIT 1",
            kind,
            reference,
        )
    }

    fn bound_row(
        &self,
        sql: &str,
        kind: ConstantKind,
        reference: f64,
    ) -> Result<Option<ReferencePoint>> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let point = stmt
            .query_row(params![kind.name(), reference], |row| {
                Ok(ReferencePoint::new(row.get(0)?, row.get(1)?))
            })
            .optional()?;
        Ok(point)
    }
}

impl ConstantStore for Store {
    fn exact(
        &self,
        kind: ConstantKind,
        reference: f64,
        reference_b: Option<f64>,
    ) -> LookupResult<Option<f64>> {
        Ok(self.exact_row(kind, reference, reference_b)?)
    }

    fn floor(&self, kind: ConstantKind, reference: f64) -> LookupResult<Option<ReferencePoint>> {
        Ok(self.floor_row(kind, reference)?)
    }

    fn ceiling(&self, kind: ConstantKind, reference: f64) -> LookupResult<Option<ReferencePoint>> {
        Ok(self.ceiling_row(kind, reference)?)
    }
}

fn validate_key(kind: ConstantKind, reference: f64, reference_b: Option<f64>) -> Result<()> {
    if !reference.is_finite() || reference_b.is_some_and(|b| !b.is_finite()) {
        return Err(StoreError::InvalidData("reference keys must be finite".into()));
    }
    match (kind.has_secondary_key(), reference_b) {
        (true, None) => Err(StoreError::InvalidData(format!(
            "{} rows need a secondary reference (nominal diameter)",
            kind.name()
        ))),
        (false, Some(_)) => Err(StoreError::InvalidData(format!(
            "{} rows take a single reference",
            kind.name()
        ))),
        _ => Ok(()),
    }
}

fn parse_kind(name: &str) -> Result<ConstantKind> {
    name.parse()
        .map_err(|_| StoreError::InvalidData(format!("unknown constant '{name}'")))
}
