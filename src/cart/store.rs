use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::Mutex,
};

use thiserror::Error;

use super::{CartAction, CartState, reduce};

/// Key the serialised cart is stored under.
pub const STORAGE_KEY: &str = "cart";

#[derive(Debug, Error)]
pub enum CartError {
    #[error("cart storage io error: {0}")]
    Io(#[from] io::Error),

    #[error("cart serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("cart storage unavailable")]
    Poisoned,
}

/// Per-client key/value persistence (browser local storage or equivalent).
pub trait CartStorage {
    fn read(&self, key: &str) -> Result<Option<String>, CartError>;
    fn write(&self, key: &str, value: &str) -> Result<(), CartError>;
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<std::collections::HashMap<String, String>>,
}

impl CartStorage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, CartError> {
        let entries = self.entries.lock().map_err(|_| CartError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), CartError> {
        let mut entries = self.entries.lock().map_err(|_| CartError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl CartStorage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, CartError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), CartError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(key), value)?;
        Ok(())
    }
}

/// Cart state plus its persistence side effect.
///
/// Every transition is written through to storage. Concurrent writers on the
/// same storage are last-write-wins.
pub struct CartStore<S: CartStorage> {
    state: CartState,
    storage: S,
}

impl<S: CartStorage> CartStore<S> {
    /// Load the persisted cart by replaying an `ADD_ITEM` per stored line.
    ///
    /// A missing or unreadable snapshot yields an empty cart.
    pub fn open(storage: S) -> Result<Self, CartError> {
        let persisted = match storage.read(STORAGE_KEY)? {
            Some(raw) => match serde_json::from_str::<CartState>(&raw) {
                Ok(state) => state,
                Err(err) => {
                    tracing::warn!(error = %err, "discarding unreadable persisted cart");
                    CartState::default()
                }
            },
            None => CartState::default(),
        };

        let state = persisted
            .items
            .into_iter()
            .fold(CartState::default(), |state, item| {
                reduce(&state, CartAction::AddItem(item))
            });

        let store = Self { state, storage };
        store.persist()?;
        Ok(store)
    }

    pub fn state(&self) -> &CartState {
        &self.state
    }

    pub fn dispatch(&mut self, action: CartAction) -> Result<&CartState, CartError> {
        self.state = reduce(&self.state, action);
        self.persist()?;
        Ok(&self.state)
    }

    /// Called once an order has been placed.
    pub fn clear(&mut self) -> Result<&CartState, CartError> {
        self.dispatch(CartAction::ClearCart)
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    fn persist(&self) -> Result<(), CartError> {
        let raw = serde_json::to_string(&self.state)?;
        self.storage.write(STORAGE_KEY, &raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::CartItem;

    fn item(id: &str, price: i64, quantity: u32) -> CartItem {
        CartItem {
            product_id: id.to_string(),
            name: id.to_uppercase(),
            price,
            quantity,
            image: String::new(),
            category: "seeds".to_string(),
        }
    }

    #[test]
    fn every_dispatch_is_persisted() {
        let mut store = CartStore::open(MemoryStorage::default()).expect("open");
        store
            .dispatch(CartAction::AddItem(item("a", 100, 2)))
            .expect("add");
        store
            .dispatch(CartAction::AddItem(item("b", 50, 1)))
            .expect("add");

        let storage = store.into_storage();
        let raw = storage.read(STORAGE_KEY).expect("read").expect("stored");
        let saved: CartState = serde_json::from_str(&raw).expect("decode");
        assert_eq!(saved.total, 250);
        assert_eq!(saved.item_count, 3);
    }

    #[test]
    fn reopening_rehydrates_the_same_cart() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = CartStore::open(FileStorage::new(dir.path())).expect("open");
        store
            .dispatch(CartAction::AddItem(item("a", 100, 2)))
            .expect("add");
        store
            .dispatch(CartAction::AddItem(item("b", 50, 1)))
            .expect("add");
        let before = store.state().clone();

        let reopened = CartStore::open(FileStorage::new(dir.path())).expect("reopen");
        assert_eq!(reopened.state(), &before);
    }

    #[test]
    fn rehydrate_recomputes_tampered_totals() {
        let storage = MemoryStorage::default();
        let tampered = serde_json::json!({
            "items": [
                { "productId": "a", "name": "A", "price": 100, "quantity": 2, "image": "", "category": "seeds" },
                { "productId": "a", "name": "A", "price": 100, "quantity": 1, "image": "", "category": "seeds" }
            ],
            "total": 1,
            "itemCount": 1
        });
        storage
            .write(STORAGE_KEY, &tampered.to_string())
            .expect("write");

        let store = CartStore::open(storage).expect("open");
        assert_eq!(store.state().items.len(), 1);
        assert_eq!(store.state().items[0].quantity, 3);
        assert_eq!(store.state().total, 300);
        assert_eq!(store.state().item_count, 3);
    }

    #[test]
    fn corrupt_snapshot_starts_empty() {
        let storage = MemoryStorage::default();
        storage.write(STORAGE_KEY, "{not json").expect("write");
        let store = CartStore::open(storage).expect("open");
        assert!(store.state().is_empty());
    }

    #[test]
    fn clear_after_order_empties_storage() {
        let mut store = CartStore::open(MemoryStorage::default()).expect("open");
        store
            .dispatch(CartAction::AddItem(item("a", 100, 2)))
            .expect("add");
        store.clear().expect("clear");

        let raw = store
            .into_storage()
            .read(STORAGE_KEY)
            .expect("read")
            .expect("stored");
        let saved: CartState = serde_json::from_str(&raw).expect("decode");
        assert!(saved.is_empty());
    }
}
