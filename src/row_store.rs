use std::{
    fmt::Display,
    fs::{self, File, OpenOptions},
    io::{prelude::*, BufReader, BufWriter},
    path::Path,
    str::FromStr,
};

use crate::{
    error::{Error, Result},
    index::RowId,
};

/// A single `key,value` record of the row store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row<K, V> {
    key: K,
    value: V,
}

impl<K, V> Row<K, V> {
    pub fn new(key: K, value: V) -> Self {
        Self { key, value }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn value(&self) -> &V {
        &self.value
    }
}

/// Ordered, append-only sequence of rows. A row's id is its position.
///
/// Indexes only ever read a store; they keep their own structures in sync with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowStore<K, V> {
    rows: Vec<Row<K, V>>,
}

impl<K, V> RowStore<K, V> {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    /// Appends a row and returns its row id.
    pub fn push(&mut self, key: K, value: V) -> RowId {
        self.rows.push(Row::new(key, value));
        self.rows.len() - 1
    }

    pub fn get(&self, row_id: RowId) -> Option<&Row<K, V>> {
        self.rows.get(row_id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Row<K, V>> {
        self.rows.iter()
    }

    /// Row keys in row-id order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.rows.iter().map(Row::key)
    }
}

impl<K, V> Default for RowStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> FromIterator<(K, V)> for RowStore<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            rows: iter
                .into_iter()
                .map(|(key, value)| Row::new(key, value))
                .collect(),
        }
    }
}

impl<K, V> RowStore<K, V>
where
    K: FromStr,
    K::Err: Display,
    V: FromStr,
    V::Err: Display,
{
    /// Loads a store from a two-column `key,value` file, one row per line, in file order.
    ///
    /// Each line is split on its first comma, so values may contain commas but keys may not.
    /// Blank lines are skipped.
    pub fn load_csv(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| Error::Io {
            path: path.to_owned(),
            source,
        })?;
        let reader = BufReader::new(file);

        let mut store = Self::new();
        for (number, line) in reader.lines().enumerate() {
            let line = line.map_err(|source| Error::Io {
                path: path.to_owned(),
                source,
            })?;
            let line_no = number + 1;
            if line.trim().is_empty() {
                continue;
            }

            let (key, value) = line.split_once(',').ok_or_else(|| Error::Parse {
                line: line_no,
                reason: "expected `key,value`".to_string(),
            })?;
            let key = key.parse::<K>().map_err(|err| Error::Parse {
                line: line_no,
                reason: format!("bad key {key:?}: {err}"),
            })?;
            let value = value.parse::<V>().map_err(|err| Error::Parse {
                line: line_no,
                reason: format!("bad value {value:?}: {err}"),
            })?;
            store.push(key, value);
        }

        Ok(store)
    }
}

impl<K: Display, V: Display> RowStore<K, V> {
    /// Writes the store as `key,value` lines in row order, creating parent directories.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let io_err = |source| Error::Io {
            path: path.to_owned(),
            source,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(io_err)?;
        let mut writer = BufWriter::new(file);

        for row in &self.rows {
            writeln!(writer, "{},{}", row.key, row.value).map_err(io_err)?;
        }
        writer.flush().map_err(io_err)
    }
}
