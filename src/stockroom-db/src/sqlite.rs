//! SQLite implementation of the inventory store using rusqlite.
//!
//! One connection, synchronous, single operator. Multi-entity mutations run
//! inside a transaction; helpers that take `&Connection` compose into a
//! caller's transaction without nesting.

use crate::repository::*;
use crate::shared::{
    self, FOOTPRINT_COLUMNS, HISTORY_COLUMNS, PART_COLUMNS, PART_TYPE_COLUMNS, PRICE_COLUMNS,
    SOURCE_COLUMNS,
};
use crate::types::*;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use stockroom::HistoryEvent;

/// Default database location.
pub const DEFAULT_DB_PATH: &str = "stockroom.db";

/// SQLite-backed inventory store.
pub struct SqliteDb {
    pub(crate) conn: Connection,
}

pub(crate) fn row_to_footprint(row: &rusqlite::Row<'_>) -> rusqlite::Result<Footprint> {
    Ok(Footprint {
        id: row.get(0)?,
        name: row.get(1)?,
        summary: row.get(2)?,
        description: row.get(3)?,
        pins: row.get(4)?,
        holes: row.get(5)?,
        kicad: row.get(6)?,
    })
}

pub(crate) fn row_to_part_type(row: &rusqlite::Row<'_>) -> rusqlite::Result<PartType> {
    Ok(PartType {
        id: row.get(0)?,
        name: row.get(1)?,
        summary: row.get(2)?,
        description: row.get(3)?,
        manufacturer: row.get(4)?,
        footprint_id: row.get(5)?,
        datasheet: row.get(6)?,
    })
}

pub(crate) fn row_to_source(row: &rusqlite::Row<'_>) -> rusqlite::Result<Source> {
    Ok(Source {
        id: row.get(0)?,
        name: row.get(1)?,
        shortname: row.get(2)?,
        summary: row.get(3)?,
        description: row.get(4)?,
        vat: row.get(5)?,
        home: row.get(6)?,
        url: row.get(7)?,
        prices: row.get(8)?,
        customs: row.get::<_, Option<bool>>(9)?.unwrap_or(false),
    })
}

pub(crate) fn row_to_part(row: &rusqlite::Row<'_>) -> rusqlite::Result<Part> {
    Ok(Part {
        id: row.get(0)?,
        part_type_id: row.get(1)?,
        source_id: row.get(2)?,
        count: row.get(3)?,
        date: row.get(4)?,
        price: row.get(5)?,
        vat: row.get(6)?,
        assignment_id: row.get(7)?,
        history_id: row.get(8)?,
        soldered: row.get::<_, Option<bool>>(9)?.unwrap_or(false),
        usable: row.get::<_, Option<bool>>(10)?.unwrap_or(true),
    })
}

pub(crate) fn row_to_history(row: &rusqlite::Row<'_>) -> rusqlite::Result<History> {
    Ok(History {
        id: row.get(0)?,
        parent_id: row.get(1)?,
        time: row.get(2)?,
        event: HistoryEvent::from_code(row.get(3)?).unwrap_or(HistoryEvent::Updated),
        description: row.get(4)?,
        location_id: row.get(5)?,
    })
}

pub(crate) fn row_to_price(row: &rusqlite::Row<'_>) -> rusqlite::Result<Price> {
    Ok(Price {
        id: row.get(0)?,
        part_source_id: row.get(1)?,
        time: row.get(2)?,
        amount: row.get(3)?,
        price: row.get(4)?,
        vat: row.get(5)?,
        currency: row.get(6)?,
    })
}

// Connection-level helpers, shared with the transactional ledger and intake
// code paths.

pub(crate) fn get_part_on(conn: &Connection, id: i64) -> RepoResult<Option<Part>> {
    let sql = format!("SELECT {} FROM parts WHERE id = ?1", PART_COLUMNS);
    let part = conn
        .query_row(&sql, params![id], row_to_part)
        .optional()?;
    Ok(part)
}

pub(crate) fn get_part_type_on(conn: &Connection, id: i64) -> RepoResult<Option<PartType>> {
    let sql = format!("SELECT {} FROM types WHERE id = ?1", PART_TYPE_COLUMNS);
    let part_type = conn
        .query_row(&sql, params![id], row_to_part_type)
        .optional()?;
    Ok(part_type)
}

pub(crate) fn get_assignment_on(conn: &Connection, id: i64) -> RepoResult<Option<Assignment>> {
    let assignment = conn
        .query_row(
            "SELECT id, part_type_id, item_id, count FROM assignments WHERE id = ?1",
            params![id],
            |row| {
                Ok(Assignment {
                    id: row.get(0)?,
                    part_type_id: row.get(1)?,
                    item_id: row.get(2)?,
                    count: row.get(3)?,
                })
            },
        )
        .optional()?;
    Ok(assignment)
}

pub(crate) fn get_history_on(conn: &Connection, id: i64) -> RepoResult<Option<History>> {
    let sql = format!("SELECT {} FROM history WHERE id = ?1", HISTORY_COLUMNS);
    let record = conn
        .query_row(&sql, params![id], row_to_history)
        .optional()?;
    Ok(record)
}

/// Insert a history record pointing at the previous chain head.
pub(crate) fn insert_history_on(
    conn: &Connection,
    parent_id: Option<i64>,
    entry: &NewHistory,
) -> RepoResult<History> {
    let time = Utc::now();
    conn.execute(
        "INSERT INTO history (parent_id, time, event, description, location_id)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            parent_id,
            time,
            entry.event.code(),
            entry.description,
            entry.location_id
        ],
    )?;
    Ok(History {
        id: conn.last_insert_rowid(),
        parent_id,
        time,
        event: entry.event,
        description: entry.description.clone(),
        location_id: entry.location_id,
    })
}

/// Insert a pile row. Intake attaches the history head; splits copy it.
pub(crate) fn insert_part_on(
    conn: &Connection,
    new: &NewPart,
    history_id: Option<i64>,
) -> RepoResult<Part> {
    conn.execute(
        "INSERT INTO parts (part_type_id, source_id, count, date, price, vat, history_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            new.part_type_id,
            new.source_id,
            new.count,
            new.date,
            new.price,
            new.vat,
            history_id
        ],
    )?;
    Ok(Part {
        id: conn.last_insert_rowid(),
        part_type_id: new.part_type_id,
        source_id: new.source_id,
        count: new.count,
        date: new.date,
        price: new.price,
        vat: new.vat,
        assignment_id: None,
        history_id,
        soldered: false,
        usable: true,
    })
}

impl SqliteDb {
    /// Open or create the database.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open(path.as_ref())?;
        conn.pragma_update(None, "foreign_keys", true)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, rusqlite::Error> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", true)?;
        Ok(Self { conn })
    }

    /// Check if a migration has been applied.
    fn is_migration_applied(&self, version: &str) -> RepoResult<bool> {
        let result: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM schema_migrations WHERE version = ?1",
                params![version],
                |row| row.get(0),
            )
            .optional()?;
        Ok(result.is_some())
    }

    /// Mark a migration as applied.
    fn mark_migration_applied(&self, version: &str) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO schema_migrations (version) VALUES (?1)",
            params![version],
        )?;
        Ok(())
    }

    /// Run pending migrations.
    fn run_migrations(&self) -> RepoResult<()> {
        if !self.is_migration_applied("0001_base_schema")? {
            self.conn.execute_batch(shared::BASE_SCHEMA)?;
            self.mark_migration_applied("0001_base_schema")?;
            tracing::debug!("applied migration 0001_base_schema");
        }

        for index in shared::INDEXES {
            self.conn.execute(index, [])?;
        }

        Ok(())
    }

    /// Refuse stores written by a newer library.
    fn check_schema_version(&self) -> RepoResult<()> {
        if let Some(found) = self.get_meta("schema_version")? {
            let version: i64 = found.parse().unwrap_or(i64::MAX);
            if version > shared::SCHEMA_VERSION {
                return Err(RepoError::SchemaVersion {
                    found,
                    supported: shared::SCHEMA_VERSION.to_string(),
                });
            }
        }
        Ok(())
    }
}

impl InventoryRepository for SqliteDb {
    fn init(&self) -> RepoResult<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version TEXT PRIMARY KEY NOT NULL,
                applied_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;

        self.run_migrations()?;

        if self.get_meta("created")?.is_none() {
            self.set_meta("created", &Utc::now().to_rfc3339())?;
            self.set_meta("schema_version", &shared::SCHEMA_VERSION.to_string())?;
        }

        self.check_schema_version()
    }

    fn add_footprint(&self, new: &NewFootprint) -> RepoResult<Footprint> {
        self.conn.execute(
            "INSERT INTO footprints (name, summary, description, pins, holes, kicad)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                new.name,
                new.summary,
                new.description,
                new.pins,
                new.holes,
                new.kicad
            ],
        )?;
        Ok(Footprint {
            id: self.conn.last_insert_rowid(),
            name: new.name.clone(),
            summary: new.summary.clone(),
            description: new.description.clone(),
            pins: new.pins,
            holes: new.holes,
            kicad: new.kicad.clone(),
        })
    }

    fn get_footprint(&self, id: i64) -> RepoResult<Option<Footprint>> {
        let sql = format!("SELECT {} FROM footprints WHERE id = ?1", FOOTPRINT_COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, params![id], row_to_footprint)
            .optional()?)
    }

    fn find_footprint_by_name(&self, name: &str) -> RepoResult<Option<Footprint>> {
        let sql = format!(
            "SELECT {} FROM footprints WHERE name = ?1 COLLATE NOCASE",
            FOOTPRINT_COLUMNS
        );
        Ok(self
            .conn
            .query_row(&sql, params![name], row_to_footprint)
            .optional()?)
    }

    fn list_footprints(&self) -> RepoResult<Vec<Footprint>> {
        let sql = format!("SELECT {} FROM footprints ORDER BY name", FOOTPRINT_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let footprints = stmt
            .query_map([], row_to_footprint)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(footprints)
    }

    fn add_source(&self, new: &NewSource) -> RepoResult<Source> {
        self.conn.execute(
            "INSERT INTO sources (name, shortname, summary, description, vat, home, url, prices, customs)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                new.name,
                new.shortname,
                new.summary,
                new.description,
                new.vat,
                new.home,
                new.url,
                new.prices,
                new.customs
            ],
        )?;
        Ok(Source {
            id: self.conn.last_insert_rowid(),
            name: new.name.clone(),
            shortname: new.shortname.clone(),
            summary: new.summary.clone(),
            description: new.description.clone(),
            vat: new.vat,
            home: new.home.clone(),
            url: new.url.clone(),
            prices: new.prices.clone(),
            customs: new.customs,
        })
    }

    fn get_source(&self, id: i64) -> RepoResult<Option<Source>> {
        let sql = format!("SELECT {} FROM sources WHERE id = ?1", SOURCE_COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, params![id], row_to_source)
            .optional()?)
    }

    fn find_source_by_shortname(&self, shortname: &str) -> RepoResult<Option<Source>> {
        let sql = format!(
            "SELECT {} FROM sources WHERE shortname = ?1 COLLATE NOCASE",
            SOURCE_COLUMNS
        );
        Ok(self
            .conn
            .query_row(&sql, params![shortname], row_to_source)
            .optional()?)
    }

    fn list_sources(&self) -> RepoResult<Vec<Source>> {
        let sql = format!("SELECT {} FROM sources ORDER BY shortname", SOURCE_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let sources = stmt
            .query_map([], row_to_source)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sources)
    }

    fn add_location(&self, name: &str, summary: Option<&str>) -> RepoResult<Location> {
        self.conn.execute(
            "INSERT INTO locations (name, summary) VALUES (?1, ?2)",
            params![name, summary],
        )?;
        Ok(Location {
            id: self.conn.last_insert_rowid(),
            name: name.to_string(),
            summary: summary.map(str::to_string),
            description: None,
        })
    }

    fn list_locations(&self) -> RepoResult<Vec<Location>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, summary, description FROM locations ORDER BY name")?;
        let locations = stmt
            .query_map([], |row| {
                Ok(Location {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    summary: row.get(2)?,
                    description: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(locations)
    }

    fn add_part_type(&self, new: &NewPartType) -> RepoResult<PartType> {
        self.conn.execute(
            "INSERT INTO types (name, summary, description, manufacturer, footprint_id, datasheet)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                new.name,
                new.summary,
                new.description,
                new.manufacturer,
                new.footprint_id,
                new.datasheet
            ],
        )?;
        Ok(PartType {
            id: self.conn.last_insert_rowid(),
            name: new.name.clone(),
            summary: new.summary.clone(),
            description: new.description.clone(),
            manufacturer: new.manufacturer.clone(),
            footprint_id: new.footprint_id,
            datasheet: new.datasheet.clone(),
        })
    }

    fn get_part_type(&self, id: i64) -> RepoResult<Option<PartType>> {
        get_part_type_on(&self.conn, id)
    }

    fn update_part_type(&self, id: i64, update: &PartTypeUpdate) -> RepoResult<()> {
        self.conn.execute(
            r#"UPDATE types SET
                name = COALESCE(?2, name),
                summary = COALESCE(?3, summary),
                description = COALESCE(?4, description),
                manufacturer = COALESCE(?5, manufacturer),
                datasheet = COALESCE(?6, datasheet)
            WHERE id = ?1"#,
            params![
                id,
                update.name,
                update.summary,
                update.description,
                update.manufacturer,
                update.datasheet
            ],
        )?;
        Ok(())
    }

    fn list_part_types(&self, filter: &PartTypeFilter) -> RepoResult<Vec<PartType>> {
        let (sql, param_values) = shared::build_part_type_query(filter);
        let mut stmt = self.conn.prepare(&sql)?;
        let part_types = stmt
            .query_map(rusqlite::params_from_iter(param_values.iter()), row_to_part_type)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(part_types)
    }

    fn add_part_source(
        &self,
        part_type_id: i64,
        source_id: i64,
        sku: &str,
    ) -> RepoResult<PartSource> {
        self.conn.execute(
            "INSERT INTO types_sources (part_type_id, source_id, sku) VALUES (?1, ?2, ?3)",
            params![part_type_id, source_id, sku],
        )?;
        Ok(PartSource {
            id: self.conn.last_insert_rowid(),
            part_type_id,
            source_id,
            sku: sku.to_string(),
        })
    }

    fn find_part_sources(&self, part_type_id: i64) -> RepoResult<Vec<PartSource>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, part_type_id, source_id, sku FROM types_sources
             WHERE part_type_id = ?1 ORDER BY id",
        )?;
        let links = stmt
            .query_map(params![part_type_id], |row| {
                Ok(PartSource {
                    id: row.get(0)?,
                    part_type_id: row.get(1)?,
                    source_id: row.get(2)?,
                    sku: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(links)
    }

    fn add_price(&self, new: &NewPrice) -> RepoResult<Price> {
        let time = Utc::now();
        self.conn.execute(
            "INSERT INTO prices (part_source_id, time, amount, price, vat, currency)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                new.part_source_id,
                time,
                new.amount.max(1),
                new.price,
                new.vat,
                new.currency
            ],
        )?;
        Ok(Price {
            id: self.conn.last_insert_rowid(),
            part_source_id: new.part_source_id,
            time,
            amount: new.amount.max(1),
            price: new.price,
            vat: new.vat,
            currency: new.currency.clone(),
        })
    }

    fn list_prices(&self, part_source_id: i64) -> RepoResult<Vec<Price>> {
        let sql = format!(
            "SELECT {} FROM prices WHERE part_source_id = ?1 ORDER BY time DESC, amount",
            PRICE_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let prices = stmt
            .query_map(params![part_source_id], row_to_price)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(prices)
    }

    fn best_price(&self, part_source_id: i64, quantity: i64) -> RepoResult<Option<Price>> {
        let sql = format!(
            "SELECT {} FROM prices WHERE part_source_id = ?1 AND amount <= ?2
             ORDER BY time DESC, price ASC LIMIT 1",
            PRICE_COLUMNS
        );
        Ok(self
            .conn
            .query_row(&sql, params![part_source_id, quantity], row_to_price)
            .optional()?)
    }

    fn min_amount(&self, part_source_id: i64) -> RepoResult<i64> {
        let min: Option<i64> = self.conn.query_row(
            "SELECT MIN(amount) FROM prices WHERE part_source_id = ?1",
            params![part_source_id],
            |row| row.get(0),
        )?;
        Ok(min.unwrap_or(1))
    }

    fn add_part(&self, new: &NewPart) -> RepoResult<Part> {
        if new.count <= 0 {
            return Err(RepoError::InvalidCount {
                requested: new.count,
                available: 0,
            });
        }
        insert_part_on(&self.conn, new, None)
    }

    fn get_part(&self, id: i64) -> RepoResult<Option<Part>> {
        get_part_on(&self.conn, id)
    }

    fn list_parts(&self, filter: &PartFilter) -> RepoResult<Vec<Part>> {
        let (sql, param_values) = shared::build_part_query(filter);
        let mut stmt = self.conn.prepare(&sql)?;
        let parts = stmt
            .query_map(rusqlite::params_from_iter(param_values.iter()), row_to_part)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(parts)
    }

    fn add_project(&self, name: &str, summary: &str, description: &str) -> RepoResult<Project> {
        let started = Utc::now().date_naive();
        self.conn.execute(
            "INSERT INTO projects (name, summary, description, started) VALUES (?1, ?2, ?3, ?4)",
            params![name, summary, description, started],
        )?;
        Ok(Project {
            id: self.conn.last_insert_rowid(),
            name: name.to_string(),
            summary: summary.to_string(),
            description: description.to_string(),
            started: Some(started),
        })
    }

    fn get_project(&self, id: i64) -> RepoResult<Option<Project>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, summary, description, started FROM projects WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Project {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        summary: row.get(2)?,
                        description: row.get(3)?,
                        started: row.get(4)?,
                    })
                },
            )
            .optional()?)
    }

    fn list_projects(&self) -> RepoResult<Vec<Project>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, summary, description, started FROM projects ORDER BY started, id",
        )?;
        let projects = stmt
            .query_map([], |row| {
                Ok(Project {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    summary: row.get(2)?,
                    description: row.get(3)?,
                    started: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(projects)
    }

    fn add_item(
        &self,
        project_id: i64,
        serial: &str,
        kit: bool,
        description: Option<&str>,
    ) -> RepoResult<Item> {
        let tx = self.conn.unchecked_transaction()?;
        let history = insert_history_on(&tx, None, &NewHistory::event(HistoryEvent::New))?;
        tx.execute(
            "INSERT INTO items (project_id, serial, kit, description, history_id)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![project_id, serial, kit, description, history.id],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(Item {
            id,
            project_id,
            serial: serial.to_string(),
            kit,
            description: description.map(str::to_string),
            history_id: Some(history.id),
        })
    }

    fn get_item(&self, id: i64) -> RepoResult<Option<Item>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, project_id, serial, kit, description, history_id
                 FROM items WHERE id = ?1",
                params![id],
                row_to_item,
            )
            .optional()?)
    }

    fn list_items(&self, project_id: i64) -> RepoResult<Vec<Item>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, project_id, serial, kit, description, history_id
             FROM items WHERE project_id = ?1 ORDER BY id",
        )?;
        let items = stmt
            .query_map(params![project_id], row_to_item)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    fn add_assignment(
        &self,
        item_id: i64,
        part_type_id: i64,
        count: i64,
    ) -> RepoResult<Assignment> {
        if count <= 0 {
            return Err(RepoError::InvalidCount {
                requested: count,
                available: 0,
            });
        }
        self.conn.execute(
            "INSERT INTO assignments (part_type_id, item_id, count) VALUES (?1, ?2, ?3)",
            params![part_type_id, item_id, count],
        )?;
        Ok(Assignment {
            id: self.conn.last_insert_rowid(),
            part_type_id,
            item_id,
            count,
        })
    }

    fn get_assignment(&self, id: i64) -> RepoResult<Option<Assignment>> {
        get_assignment_on(&self.conn, id)
    }

    fn list_assignments(&self, item_id: i64) -> RepoResult<Vec<Assignment>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, part_type_id, item_id, count FROM assignments
             WHERE item_id = ?1 ORDER BY id",
        )?;
        let assignments = stmt
            .query_map(params![item_id], |row| {
                Ok(Assignment {
                    id: row.get(0)?,
                    part_type_id: row.get(1)?,
                    item_id: row.get(2)?,
                    count: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(assignments)
    }

    fn set_assignment_count(&self, id: i64, count: i64) -> RepoResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        get_assignment_on(&tx, id)?
            .ok_or_else(|| RepoError::NotFound(format!("assignment {id}")))?;
        let assigned = crate::ledger::assignment_count_assigned_on(&tx, id)?;
        if count < assigned {
            return Err(RepoError::InvalidCount {
                requested: count,
                available: assigned,
            });
        }
        tx.execute(
            "UPDATE assignments SET count = ?2 WHERE id = ?1",
            params![id, count],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn get_meta(&self, key: &str) -> RepoResult<Option<String>> {
        let result = self.conn.query_row(
            "SELECT value FROM meta WHERE key = ?1",
            params![key],
            |row| row.get(0),
        );
        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_meta(&self, key: &str, value: &str) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO meta (key, value, changed) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, changed = excluded.changed",
            params![key, value, Utc::now()],
        )?;
        Ok(())
    }

    fn stats(&self) -> RepoResult<DbStats> {
        let count = |table: &str| -> RepoResult<i64> {
            let sql = format!("SELECT COUNT(*) FROM {}", table);
            Ok(self.conn.query_row(&sql, [], |row| row.get(0))?)
        };

        Ok(DbStats {
            footprint_count: count("footprints")?,
            part_type_count: count("types")?,
            source_count: count("sources")?,
            part_count: count("parts")?,
            project_count: count("projects")?,
            item_count: count("items")?,
            assignment_count: count("assignments")?,
            term_count: count("terms")?,
            history_count: count("history")?,
        })
    }
}

fn row_to_item(row: &rusqlite::Row<'_>) -> rusqlite::Result<Item> {
    Ok(Item {
        id: row.get(0)?,
        project_id: row.get(1)?,
        serial: row.get(2)?,
        kit: row.get::<_, Option<bool>>(3)?.unwrap_or(false),
        description: row.get(4)?,
        history_id: row.get(5)?,
    })
}
