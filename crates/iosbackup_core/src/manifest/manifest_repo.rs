//! Manifest repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide lookup APIs over the manifest `Files` table.
//! - Resolve logical paths through their content-addressed blob names.
//!
//! # Invariants
//! - Listing results are ordered by `relativePath` for stable output.
//! - `find_file` tries the hashed blob name before an exact path match.

use super::file_blob::parse_file_blob;
use super::{ManifestError, ManifestResult};
use crate::backup::hash::file_id;
use crate::db::{table_exists, table_has_column};
use crate::model::file::BackupFile;
use rusqlite::{params, Connection, Row};
use serde::Serialize;

const FILES_TABLE: &str = "Files";
const FILES_COLUMNS: &[&str] = &["fileID", "domain", "relativePath", "flags", "file"];

const FILE_SELECT_SQL: &str = "SELECT
    fileID,
    domain,
    relativePath,
    flags,
    file
FROM Files";

/// Number of manifest entries in one domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainCount {
    pub domain: String,
    pub count: u64,
}

/// Repository interface for manifest lookups.
pub trait ManifestRepository {
    /// Lists every entry of one domain.
    fn files_in_domain(&self, domain: &str) -> ManifestResult<Vec<BackupFile>>;
    /// Lists entries of one domain whose `relativePath` matches a SQL `LIKE` pattern.
    fn files_matching(&self, domain: &str, pattern: &str) -> ManifestResult<Vec<BackupFile>>;
    /// Gets one entry by blob name.
    fn file_by_id(&self, file_id: &str) -> ManifestResult<Option<BackupFile>>;
    /// Resolves one logical path.
    fn find_file(&self, domain: &str, relative_path: &str) -> ManifestResult<Option<BackupFile>>;
    fn total_file_count(&self) -> ManifestResult<u64>;
    /// Entry counts per domain, largest first.
    fn domain_stats(&self) -> ManifestResult<Vec<DomainCount>>;

    /// Concatenates [`ManifestRepository::files_in_domain`] over several domains.
    fn files_in_domains(&self, domains: &[&str]) -> ManifestResult<Vec<BackupFile>> {
        let mut files = Vec::new();
        for domain in domains {
            files.extend(self.files_in_domain(domain)?);
        }
        Ok(files)
    }
}

/// SQLite-backed manifest repository.
pub struct SqliteManifestRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteManifestRepository<'conn> {
    /// Wraps an opened `Manifest.db` after checking its `Files` table shape.
    pub fn try_new(conn: &'conn Connection) -> ManifestResult<Self> {
        ensure_manifest_ready(conn)?;
        Ok(Self::from_checked(conn))
    }

    /// Wraps a connection whose `Files` table already passed [`Self::try_new`].
    pub(crate) fn from_checked(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn query_files(
        &self,
        sql: &str,
        bind: impl rusqlite::Params,
    ) -> ManifestResult<Vec<BackupFile>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(bind)?;
        let mut files = Vec::new();
        while let Some(row) = rows.next()? {
            files.push(parse_file_row(row)?);
        }
        Ok(files)
    }
}

impl ManifestRepository for SqliteManifestRepository<'_> {
    fn files_in_domain(&self, domain: &str) -> ManifestResult<Vec<BackupFile>> {
        self.query_files(
            &format!("{FILE_SELECT_SQL} WHERE domain = ?1 ORDER BY relativePath ASC;"),
            [domain],
        )
    }

    fn files_matching(&self, domain: &str, pattern: &str) -> ManifestResult<Vec<BackupFile>> {
        self.query_files(
            &format!(
                "{FILE_SELECT_SQL}
                 WHERE domain = ?1
                   AND relativePath LIKE ?2
                 ORDER BY relativePath ASC;"
            ),
            params![domain, pattern],
        )
    }

    fn file_by_id(&self, file_id: &str) -> ManifestResult<Option<BackupFile>> {
        let found = self.query_files(&format!("{FILE_SELECT_SQL} WHERE fileID = ?1;"), [file_id])?;
        Ok(found.into_iter().next())
    }

    fn find_file(&self, domain: &str, relative_path: &str) -> ManifestResult<Option<BackupFile>> {
        if let Some(file) = self.file_by_id(&file_id(domain, relative_path))? {
            if file.domain == domain && file.relative_path == relative_path {
                return Ok(Some(file));
            }
        }

        let found = self.query_files(
            &format!("{FILE_SELECT_SQL} WHERE domain = ?1 AND relativePath = ?2;"),
            params![domain, relative_path],
        )?;
        Ok(found.into_iter().next())
    }

    fn total_file_count(&self) -> ManifestResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM Files;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| ManifestError::InvalidData(format!("negative file count `{count}`")))
    }

    fn domain_stats(&self) -> ManifestResult<Vec<DomainCount>> {
        let mut stmt = self.conn.prepare(
            "SELECT domain, COUNT(*) AS count
             FROM Files
             GROUP BY domain
             ORDER BY count DESC, domain ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut stats = Vec::new();
        while let Some(row) = rows.next()? {
            let count: i64 = row.get("count")?;
            stats.push(DomainCount {
                domain: row.get("domain")?,
                count: u64::try_from(count).unwrap_or(0),
            });
        }
        Ok(stats)
    }
}

fn parse_file_row(row: &Row<'_>) -> ManifestResult<BackupFile> {
    let file_id: String = row.get("fileID")?;
    if file_id.is_empty() {
        return Err(ManifestError::InvalidData(
            "empty fileID in Files.fileID".to_string(),
        ));
    }

    let blob: Option<Vec<u8>> = row.get("file")?;
    let metadata = blob
        .as_deref()
        .map(parse_file_blob)
        .unwrap_or_default();

    Ok(BackupFile::new(
        file_id,
        row.get::<_, String>("domain")?,
        row.get::<_, Option<String>>("relativePath")?.unwrap_or_default(),
        row.get::<_, Option<i64>>("flags")?.unwrap_or(0),
        metadata,
    ))
}

fn ensure_manifest_ready(conn: &Connection) -> ManifestResult<()> {
    if !table_exists(conn, FILES_TABLE)? {
        return Err(ManifestError::MissingRequiredTable(FILES_TABLE));
    }
    for &column in FILES_COLUMNS {
        if !table_has_column(conn, FILES_TABLE, column)? {
            return Err(ManifestError::MissingRequiredColumn {
                table: FILES_TABLE,
                column,
            });
        }
    }
    Ok(())
}
