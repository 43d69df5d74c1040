//! # Listing and Payment Ledger
//!
//! Node-side records kept next to the chain: content listings submitted by
//! creators and payments the node has seen confirmed. Each table maps an
//! auto-increment id to a JSON document.

use crate::chain::{ContentListing, NewContent, PaymentRecord};
use crate::error::Result;
use redb::{Database, ReadableTable, TableDefinition};
use std::path::Path;
use std::sync::Arc;

const CONTENT_TABLE: TableDefinition<u64, &str> = TableDefinition::new("content");
const PAYMENTS_TABLE: TableDefinition<u64, &str> = TableDefinition::new("payments");

pub struct Storage {
    db: Arc<Database>,
}

fn next_id<T: ReadableTable<u64, &'static str>>(table: &T) -> Result<u64> {
    let mut iter = table.iter()?;
    let last = match iter.next_back() {
        Some(res) => {
            let (k, _) = res?;
            k.value()
        }
        None => 0,
    };
    Ok(last + 1)
}

impl Storage {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Database::create(path)?;
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(CONTENT_TABLE)?;
            let _ = write_txn.open_table(PAYMENTS_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Storage { db: Arc::new(db) })
    }

    pub fn create_content(&self, new: NewContent) -> Result<ContentListing> {
        let write_txn = self.db.begin_write()?;
        let listing = {
            let mut table = write_txn.open_table(CONTENT_TABLE)?;
            let id = next_id(&table)?;
            let listing = ContentListing::from_new(id, new);
            let json = serde_json::to_string(&listing)?;
            table.insert(id, json.as_str())?;
            listing
        };
        write_txn.commit()?;
        Ok(listing)
    }

    pub fn get_content(&self, id: u64) -> Result<Option<ContentListing>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CONTENT_TABLE)?;
        let result = match table.get(id)? {
            Some(guard) => Some(serde_json::from_str(guard.value())?),
            None => None,
        };
        Ok(result)
    }

    /// Newest first
    pub fn list_content(&self) -> Result<Vec<ContentListing>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CONTENT_TABLE)?;
        let mut listings = Vec::new();

        let mut iter = table.iter()?;
        while let Some(res) = iter.next_back() {
            let (_, value) = res?;
            listings.push(serde_json::from_str(value.value())?);
        }
        Ok(listings)
    }

    pub fn record_payment(&self, payment: &PaymentRecord) -> Result<u64> {
        let write_txn = self.db.begin_write()?;
        let id = {
            let mut table = write_txn.open_table(PAYMENTS_TABLE)?;
            let id = next_id(&table)?;
            let json = serde_json::to_string(payment)?;
            table.insert(id, json.as_str())?;
            id
        };
        write_txn.commit()?;
        Ok(id)
    }

    pub fn payments_for_buyer(&self, buyer: &str) -> Result<Vec<PaymentRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PAYMENTS_TABLE)?;
        let mut payments = Vec::new();
        for item in table.iter()? {
            let (_, value) = item?;
            let payment: PaymentRecord = serde_json::from_str(value.value())?;
            if payment.buyer == buyer {
                payments.push(payment);
            }
        }
        Ok(payments)
    }

    pub fn has_recorded_payment(&self, buyer: &str, content_id: u64) -> Result<bool> {
        Ok(self
            .payments_for_buyer(buyer)?
            .iter()
            .any(|p| p.content_id == content_id))
    }
}
