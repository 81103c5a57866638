//! DataSource backed by a persisted SQLite index of module versions

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row};
use tracing::{debug, info};

use crate::config::{LATEST_VERSION, PAGE_TYPE_MODULE};
use crate::datasource::DataSource;
use crate::error::{Error, Result, ResultExt};
use crate::module::path::candidate_module_paths;
use crate::module::{
    License, LicenseMetadata, Module, ModuleInfo, PackageMeta, UnitMeta, VersionInfo, license,
    stdlib, version,
};

pub struct IndexDataSource {
    conn: Mutex<Connection>,
}

impl IndexDataSource {
    pub fn new(db_path: &Path) -> Result<Self> {
        info!("Opening module index at {:?}", db_path);

        let conn = Connection::open(db_path)?;

        // Enable WAL mode for better concurrency
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        let index = Self {
            conn: Mutex::new(conn),
        };
        index.create_schema()?;
        info!("Module index ready");

        Ok(index)
    }

    /// Acquire database connection lock with proper error handling
    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Internal("index connection lock poisoned".to_string()))
    }

    fn create_schema(&self) -> Result<()> {
        debug!("Creating index schema");

        let conn = self.lock_conn()?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS modules (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                module_path TEXT NOT NULL,
                version TEXT NOT NULL,
                commit_time TEXT NOT NULL,
                is_redistributable INTEGER NOT NULL DEFAULT 0,
                UNIQUE(module_path, version)
            )
            "#,
            [],
        )?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS units (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                module_id INTEGER NOT NULL,
                path TEXT NOT NULL,
                name TEXT NOT NULL DEFAULT '',
                synopsis TEXT NOT NULL DEFAULT '',
                is_redistributable INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY (module_id) REFERENCES modules(id) ON DELETE CASCADE,
                UNIQUE(module_id, path)
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_units_path ON units(path)",
            [],
        )?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS licenses (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                module_id INTEGER NOT NULL,
                file_path TEXT NOT NULL,
                types TEXT NOT NULL,
                contents TEXT NOT NULL DEFAULT '',
                FOREIGN KEY (module_id) REFERENCES modules(id) ON DELETE CASCADE,
                UNIQUE(module_id, file_path)
            )
            "#,
            [],
        )?;

        debug!("Index schema created successfully");
        Ok(())
    }

    /// Stores a module version, replacing any units and licenses previously
    /// stored for it.
    pub fn insert_module(&self, module: &Module) -> Result<()> {
        let mi = &module.info;
        debug!(
            "Indexing {}@{} ({} units, {} licenses)",
            mi.module_path,
            mi.version,
            module.units.len(),
            module.licenses.len()
        );

        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            r#"
            INSERT INTO modules (module_path, version, commit_time, is_redistributable)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(module_path, version) DO UPDATE SET
                commit_time = excluded.commit_time,
                is_redistributable = excluded.is_redistributable
            "#,
            (
                &mi.module_path,
                &mi.version,
                mi.commit_time.to_rfc3339(),
                mi.is_redistributable,
            ),
        )?;

        let module_id: i64 = tx.query_row(
            "SELECT id FROM modules WHERE module_path = ?1 AND version = ?2",
            (&mi.module_path, &mi.version),
            |row| row.get(0),
        )?;

        tx.execute("DELETE FROM units WHERE module_id = ?1", [module_id])?;
        tx.execute("DELETE FROM licenses WHERE module_id = ?1", [module_id])?;

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO units (module_id, path, name, synopsis, is_redistributable)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )?;
            for unit in &module.units {
                stmt.execute((
                    module_id,
                    &unit.path,
                    &unit.name,
                    &unit.synopsis,
                    unit.is_redistributable,
                ))?;
            }
        }

        {
            let mut stmt = tx.prepare(
                "INSERT INTO licenses (module_id, file_path, types, contents) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for license in &module.licenses {
                let types = serde_json::to_string(&license.metadata.types)
                    .map_err(|e| Error::Internal(e.to_string()))?;
                stmt.execute((
                    module_id,
                    &license.metadata.file_path,
                    types,
                    &license.contents,
                ))?;
            }
        }

        tx.commit()?;

        info!("Indexed {}@{}", mi.module_path, mi.version);
        Ok(())
    }

    /// All stored versions of a module
    pub fn versions(&self, module_path: &str) -> Result<Vec<String>> {
        let conn = self.lock_conn()?;
        Self::query_versions(&conn, module_path)
    }

    fn query_versions(conn: &Connection, module_path: &str) -> Result<Vec<String>> {
        let mut stmt = conn.prepare("SELECT version FROM modules WHERE module_path = ?1")?;
        let versions = stmt
            .query_map([module_path], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(versions)
    }

    /// Versions of a module whose unit set contains `path`
    fn query_versions_containing(
        conn: &Connection,
        path: &str,
        module_path: &str,
    ) -> Result<Vec<String>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT m.version FROM modules m
            JOIN units u ON u.module_id = m.id
            WHERE m.module_path = ?1 AND u.path = ?2
            "#,
        )?;
        let versions = stmt
            .query_map((module_path, path), |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(versions)
    }

    /// Maps the latest sentinel to the highest stored version
    fn resolve_version(conn: &Connection, module_path: &str, requested: &str) -> Result<String> {
        if requested != LATEST_VERSION {
            return Ok(requested.to_string());
        }
        version::latest_of(Self::query_versions(conn, module_path)?)
            .ok_or_else(|| Error::NotFound(format!("no versions of module {}", module_path)))
    }

    fn query_module_info(
        conn: &Connection,
        module_path: &str,
        version: &str,
    ) -> Result<Option<(i64, ModuleInfo)>> {
        let row = conn
            .query_row(
                r#"
                SELECT id, module_path, version, commit_time, is_redistributable
                FROM modules WHERE module_path = ?1 AND version = ?2
                "#,
                (module_path, version),
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        ModuleInfo {
                            module_path: row.get(1)?,
                            version: row.get(2)?,
                            commit_time: parse_time(row, 3)?,
                            is_redistributable: row.get(4)?,
                        },
                    ))
                },
            )
            .optional()?;
        Ok(row)
    }

    fn require_module_info(
        conn: &Connection,
        module_path: &str,
        version: &str,
    ) -> Result<(i64, ModuleInfo)> {
        Self::query_module_info(conn, module_path, version)?.ok_or_else(|| {
            Error::NotFound(format!("module {}@{} is not indexed", module_path, version))
        })
    }

    fn query_units(conn: &Connection, module_id: i64) -> Result<Vec<UnitMeta>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT path, name, synopsis, is_redistributable
            FROM units WHERE module_id = ?1 ORDER BY path
            "#,
        )?;
        let units = stmt
            .query_map([module_id], |row| {
                Ok(UnitMeta {
                    path: row.get(0)?,
                    name: row.get(1)?,
                    synopsis: row.get(2)?,
                    is_redistributable: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(units)
    }

    fn query_licenses(conn: &Connection, module_id: i64) -> Result<Vec<License>> {
        let mut stmt = conn.prepare(
            "SELECT file_path, types, contents FROM licenses WHERE module_id = ?1 ORDER BY file_path",
        )?;
        let licenses = stmt
            .query_map([module_id], |row| {
                let types: String = row.get(1)?;
                let types: Vec<String> = serde_json::from_str(&types).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e))
                })?;
                Ok(License {
                    metadata: LicenseMetadata {
                        types,
                        file_path: row.get(0)?,
                    },
                    contents: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(licenses)
    }

    fn unit_exists(conn: &Connection, module_id: i64, path: &str) -> Result<bool> {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM units WHERE module_id = ?1 AND path = ?2)",
            (module_id, path),
            |row| row.get(0),
        )?;
        Ok(exists)
    }
}

fn parse_time(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

#[async_trait::async_trait]
impl DataSource for IndexDataSource {
    async fn get_module(&self, module_path: &str, version: &str) -> Result<Module> {
        let conn = self.lock_conn()?;
        let load = || -> Result<Module> {
            let resolved = Self::resolve_version(&conn, module_path, version)?;
            let (module_id, info) = Self::require_module_info(&conn, module_path, &resolved)?;
            Ok(Module {
                info,
                units: Self::query_units(&conn, module_id)?,
                licenses: Self::query_licenses(&conn, module_id)?,
            })
        };
        load().context(|| format!("get_module({:?}, {:?})", module_path, version))
    }

    async fn get_module_info(&self, module_path: &str, version: &str) -> Result<ModuleInfo> {
        let conn = self.lock_conn()?;
        let load = || -> Result<ModuleInfo> {
            let resolved = Self::resolve_version(&conn, module_path, version)?;
            Ok(Self::require_module_info(&conn, module_path, &resolved)?.1)
        };
        load().context(|| format!("get_module_info({:?}, {:?})", module_path, version))
    }

    async fn find_module(&self, path: &str, version: &str) -> Result<(String, VersionInfo)> {
        let conn = self.lock_conn()?;
        for module_path in candidate_module_paths(path) {
            let resolved = match Self::resolve_version(&conn, &module_path, version) {
                Ok(resolved) => resolved,
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e),
            };
            let Some((module_id, info)) =
                Self::query_module_info(&conn, &module_path, &resolved)?
            else {
                continue;
            };
            if module_path == path || Self::unit_exists(&conn, module_id, path)? {
                return Ok((
                    module_path,
                    VersionInfo {
                        version: info.version,
                        time: info.commit_time,
                    },
                ));
            }
        }
        Err(Error::NotFound(format!(
            "unable to find module for {}@{}",
            path, version
        )))
    }

    async fn get_packages_in_unit(
        &self,
        path: &str,
        module_path: &str,
        version: &str,
    ) -> Result<Vec<PackageMeta>> {
        let conn = self.lock_conn()?;
        let load = || -> Result<Vec<PackageMeta>> {
            let resolved = Self::resolve_version(&conn, module_path, version)?;
            let (module_id, _) = Self::require_module_info(&conn, module_path, &resolved)?;
            let licenses = Self::query_licenses(&conn, module_id)?;

            let whole_module = path == module_path || path == stdlib::MODULE_PATH;
            let mut stmt = conn.prepare(
                r#"
                SELECT path, name, synopsis, is_redistributable
                FROM units
                WHERE module_id = ?1 AND name != ''
                  AND (?3 OR path = ?2 OR substr(path, 1, length(?2) + 1) = ?2 || '/')
                ORDER BY path
                "#,
            )?;
            let packages = stmt
                .query_map((module_id, path, whole_module), |row| {
                    Ok(UnitMeta {
                        path: row.get(0)?,
                        name: row.get(1)?,
                        synopsis: row.get(2)?,
                        is_redistributable: row.get(3)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?
                .into_iter()
                .map(|unit| PackageMeta {
                    licenses: license::applicable(&unit.path, module_path, &licenses)
                        .map(|l| l.metadata.clone())
                        .collect(),
                    path: unit.path,
                    name: unit.name,
                    synopsis: unit.synopsis,
                    is_redistributable: unit.is_redistributable,
                })
                .collect::<Vec<_>>();

            if packages.is_empty() {
                return Err(Error::NotFound(format!(
                    "no packages at or beneath {}",
                    path
                )));
            }
            Ok(packages)
        };
        load().context(|| {
            format!(
                "get_packages_in_unit({:?}, {:?}, {:?})",
                path, module_path, version
            )
        })
    }

    async fn get_latest_version(
        &self,
        path: &str,
        module_path: &str,
        page_type: &str,
    ) -> Result<Option<String>> {
        let conn = self.lock_conn()?;
        let versions = if page_type == PAGE_TYPE_MODULE || path.is_empty() || path == module_path
        {
            Self::query_versions(&conn, module_path)?
        } else {
            Self::query_versions_containing(&conn, path, module_path)?
        };
        Ok(version::latest_of(versions))
    }
}
