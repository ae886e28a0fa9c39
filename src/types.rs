use std::sync::{Arc, RwLock};

// Type alias, not a new type, so the underlying methods stay usable.
pub type Pod<T> = Arc<RwLock<T>>;
