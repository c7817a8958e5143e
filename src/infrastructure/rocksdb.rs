use crate::domain::payment::{Payment, PaymentId};
use crate::domain::ports::LedgerRepository;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Column Family for storing ledger entries.
pub const CF_PAYMENTS: &str = "payments";
/// Column Family mapping a payment id to its position in [`CF_PAYMENTS`].
pub const CF_POSITIONS: &str = "positions";

/// A persistent store implementation using RocksDB.
///
/// Entries are keyed by their big-endian insertion position, so iterating the
/// column family yields the ledger in order. Values are the JSON form of
/// [`Payment`]. A second column family indexes positions by payment id.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the "payments" and "positions" column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_payments = ColumnFamilyDescriptor::new(CF_PAYMENTS, Options::default());
        let cf_positions = ColumnFamilyDescriptor::new(CF_POSITIONS, Options::default());
        let db = DB::open_cf_descriptors(&opts, path, vec![cf_payments, cf_positions])?;

        Ok(Self { db: Arc::new(db) })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            PaymentError::InternalError(Box::new(std::io::Error::other(format!(
                "{name} column family not found"
            ))))
        })
    }

    fn decode(value: &[u8]) -> Result<Payment> {
        serde_json::from_slice(value).map_err(|e| PaymentError::InternalError(Box::new(e)))
    }

    fn decode_position(value: &[u8]) -> Result<u64> {
        let bytes: [u8; 8] = value.try_into().map_err(|_| {
            PaymentError::InternalError(Box::new(std::io::Error::other(
                "Malformed position index entry",
            )))
        })?;
        Ok(u64::from_be_bytes(bytes))
    }

    fn stored_len(&self) -> Result<usize> {
        let cf = self.cf(CF_PAYMENTS)?;
        match self.db.iterator_cf(cf, IteratorMode::End).next() {
            Some(item) => {
                let (key, _) = item?;
                Ok(Self::decode_position(&key)? as usize + 1)
            }
            None => Ok(0),
        }
    }
}

impl From<rocksdb::Error> for PaymentError {
    fn from(err: rocksdb::Error) -> Self {
        PaymentError::InternalError(Box::new(err))
    }
}

#[async_trait]
impl LedgerRepository for RocksDBStore {
    async fn store_all(&self, entries: Vec<(usize, Payment)>) -> Result<()> {
        let cf_payments = self.cf(CF_PAYMENTS)?;
        let cf_positions = self.cf(CF_POSITIONS)?;

        let mut len = self.stored_len()?;
        let mut staged: HashMap<usize, PaymentId> = HashMap::new();
        let mut batch = WriteBatch::default();
        for (position, payment) in entries {
            let key = (position as u64).to_be_bytes();
            if position < len {
                let held = match staged.get(&position) {
                    Some(id) => id.clone(),
                    None => match self.db.get_cf(cf_payments, key)? {
                        Some(value) => Self::decode(&value)?.id,
                        None => payment.id.clone(),
                    },
                };
                if held != payment.id {
                    return Err(PaymentError::PositionConflict(position, held.to_string()));
                }
            } else if position == len {
                len += 1;
            } else {
                return Err(PaymentError::PositionConflict(
                    position,
                    payment.id.to_string(),
                ));
            }

            let value = serde_json::to_vec(&payment)
                .map_err(|e| PaymentError::InternalError(Box::new(e)))?;
            batch.put_cf(cf_payments, key, value);
            batch.put_cf(cf_positions, payment.id.as_str().as_bytes(), key);
            staged.insert(position, payment.id);
        }

        self.db.write(batch)?;
        Ok(())
    }

    async fn get(&self, id: &PaymentId) -> Result<Option<Payment>> {
        let Some(position) = self.db.get_cf(self.cf(CF_POSITIONS)?, id.as_str().as_bytes())? else {
            return Ok(None);
        };
        self.db
            .get_cf(self.cf(CF_PAYMENTS)?, position)?
            .map(|value| Self::decode(&value))
            .transpose()
    }

    async fn all_payments(&self) -> Result<Vec<Payment>> {
        let cf = self.cf(CF_PAYMENTS)?;

        self.db
            .iterator_cf(cf, IteratorMode::Start)
            .map(|item| {
                let (_, value) = item?;
                Self::decode(&value)
            })
            .collect()
    }
}
