use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rusqlite::{Connection, OpenFlags, OptionalExtension, params};

use crate::{
    errors::{FSResult, FedstackError},
    examples::Examples,
    federated::{BlobFormat, ClientStore, decode_examples},
    types::{ClientId, client_id_display},
};

/// Schema of a federated `SQLite` file.
///
/// `data` holds the client's [`Examples`] in one of the [`BlobFormat`]s.
pub const FEDERATED_DATA_SCHEMA: &str = "CREATE TABLE federated_data (
    client_id BLOB NOT NULL PRIMARY KEY,
    data BLOB NOT NULL,
    num_examples INTEGER NOT NULL
)";

/// A read-only [`ClientStore`] over a `SQLite` file.
///
/// Record blobs are decoded with [`decode_examples`], so files written with
/// either [`BlobFormat`] can be read.
///
/// The connection is serialized behind a mutex, so the store may be shared
/// across threads.
#[derive(Debug)]
pub struct SqliteClientStore {
    path: PathBuf,
    conn: Mutex<Connection>,
}

impl SqliteClientStore {
    /// Open an existing federated `SQLite` file.
    ///
    /// ## Errors
    /// Fails if the file cannot be opened, or lacks the `federated_data` table.
    pub fn open<P: AsRef<Path>>(path: P) -> FSResult<Self> {
        let path = path.as_ref();
        log::debug!("opening federated sqlite: {}", path.display());

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        // Fail early on files that are not federated data.
        conn.query_row("SELECT COUNT(*) FROM federated_data", [], |row| {
            row.get::<_, i64>(0)
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            conn: Mutex::new(conn),
        })
    }

    /// Write a new federated `SQLite` file with JSON record blobs.
    ///
    /// ## Errors
    /// Fails if `path` already holds a `federated_data` table,
    /// or a record has inconsistent feature lengths.
    pub fn create<'a, P, I>(
        path: P,
        clients: I,
    ) -> FSResult<()>
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = (&'a [u8], &'a Examples)>,
    {
        Self::create_with_format(path, BlobFormat::Json, clients)
    }

    /// Write a new federated `SQLite` file, encoding records as `format`.
    pub fn create_with_format<'a, P, I>(
        path: P,
        format: BlobFormat,
        clients: I,
    ) -> FSResult<()>
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = (&'a [u8], &'a Examples)>,
    {
        let mut conn = Connection::open(path)?;
        let tx = conn.transaction()?;
        tx.execute(FEDERATED_DATA_SCHEMA, [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO federated_data (client_id, data, num_examples) VALUES (?1, ?2, ?3)",
            )?;
            for (client_id, examples) in clients {
                let num_examples = examples.num_examples()? as i64;
                let data = format.encode(examples)?;
                stmt.execute(params![client_id, data, num_examples])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// The path this store was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored example count of one client, without decoding its data.
    pub fn client_num_examples(
        &self,
        client_id: &[u8],
    ) -> FSResult<usize> {
        let count: Option<i64> = self
            .conn
            .lock()
            .query_row(
                "SELECT num_examples FROM federated_data WHERE client_id = ?1",
                [client_id],
                |row| row.get(0),
            )
            .optional()?;
        count
            .map(|n| n as usize)
            .ok_or_else(|| FedstackError::UnknownClient(client_id_display(client_id)))
    }
}

impl ClientStore for SqliteClientStore {
    fn client_ids(&self) -> FSResult<Vec<ClientId>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT client_id FROM federated_data ORDER BY client_id")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, Vec<u8>>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    fn num_clients(&self) -> FSResult<usize> {
        let count: i64 =
            self.conn
                .lock()
                .query_row("SELECT COUNT(*) FROM federated_data", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn load_client(
        &self,
        client_id: &[u8],
    ) -> FSResult<Examples> {
        let data: Option<Vec<u8>> = self
            .conn
            .lock()
            .query_row(
                "SELECT data FROM federated_data WHERE client_id = ?1",
                [client_id],
                |row| row.get(0),
            )
            .optional()?;
        let data = data.ok_or_else(|| FedstackError::UnknownClient(client_id_display(client_id)))?;
        decode_examples(&data)
    }
}

#[cfg(test)]
mod tests {
    use tempdir::TempDir;

    use super::*;
    use crate::{
        examples::Feature,
        types::{check_is_send, check_is_sync},
    };

    fn client(tokens: &[&str]) -> Examples {
        Examples::new()
            .with_feature("tokens", Feature::bytes_from(tokens))
            .with_feature("score", Feature::Int64(vec![7; tokens.len()]))
    }

    #[test]
    fn test_create_and_open() -> anyhow::Result<()> {
        let dir = TempDir::new("fedstack-sqlite")?;
        let path = dir.path().join("stackoverflow_test.sqlite");

        let c1 = client(&["a b", "c"]);
        let c0 = client(&["d"]);
        SqliteClientStore::create(&path, [(b"c1".as_slice(), &c1), (b"c0".as_slice(), &c0)])?;

        let store = SqliteClientStore::open(&path)?;
        check_is_send(&store);
        check_is_sync(&store);

        assert_eq!(store.path(), path.as_path());
        assert_eq!(store.num_clients()?, 2);
        assert_eq!(store.client_ids()?, vec![b"c0".to_vec(), b"c1".to_vec()]);
        assert_eq!(store.load_client(b"c1")?, c1);
        assert_eq!(store.client_num_examples(b"c1")?, 2);

        assert!(matches!(
            store.load_client(b"nope"),
            Err(FedstackError::UnknownClient(_))
        ));
        assert!(matches!(
            store.client_num_examples(b"nope"),
            Err(FedstackError::UnknownClient(_))
        ));
        Ok(())
    }

    #[test]
    fn test_reads_msgpack_zlib_records() -> anyhow::Result<()> {
        let dir = TempDir::new("fedstack-sqlite")?;
        let path = dir.path().join("stackoverflow_train.sqlite");

        let posts = client(&["q1 tokens", "a1"]).with_feature(
            "type",
            Feature::bytes_from(["question", "answer"]),
        );
        SqliteClientStore::create_with_format(
            &path,
            BlobFormat::MsgpackZlib,
            [(b"00000001".as_slice(), &posts)],
        )?;

        let data = crate::federated::FederatedData::from_sqlite(&path)?;
        assert_eq!(data.num_clients()?, 1);
        assert_eq!(data.get_client(b"00000001")?, posts);
        Ok(())
    }

    #[test]
    fn test_open_rejects_other_files() -> anyhow::Result<()> {
        let dir = TempDir::new("fedstack-sqlite")?;

        assert!(SqliteClientStore::open(dir.path().join("missing.sqlite")).is_err());

        let path = dir.path().join("other.sqlite");
        Connection::open(&path)?.execute("CREATE TABLE other (x INTEGER)", [])?;
        assert!(matches!(
            SqliteClientStore::open(&path),
            Err(FedstackError::Sqlite(_))
        ));
        Ok(())
    }

    #[test]
    fn test_create_rejects_ragged_records() -> anyhow::Result<()> {
        let dir = TempDir::new("fedstack-sqlite")?;
        let ragged = client(&["a"]).with_feature("type", Feature::bytes_from(["q", "a"]));
        assert!(matches!(
            SqliteClientStore::create(dir.path().join("r.sqlite"), [(b"x".as_slice(), &ragged)]),
            Err(FedstackError::LengthMismatch { .. })
        ));
        Ok(())
    }
}
