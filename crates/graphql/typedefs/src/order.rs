use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_CREATION_ORDER: AtomicU64 = AtomicU64::new(1);

/// Position of a field descriptor in declaration order.
///
/// Values come from a single process-wide counter that is never reset, so they
/// are unique and strictly increasing in the order descriptors are created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CreationOrder(u64);

impl CreationOrder {
    pub fn next() -> Self {
        CreationOrder(NEXT_CREATION_ORDER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}
