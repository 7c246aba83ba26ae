use std::cell::Cell;

/// Hands out symbol ids. `0` is never allocated; it marks "not yet bound".
///
/// One allocator lives in a [`crate::session::Session`] and is shared by every
/// unit that session analyses, so ids stay unique across imports.
#[derive(Debug)]
pub struct IdAllocator {
    next: Cell<u32>,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self { next: Cell::new(1) }
    }

    pub fn allocate(&self) -> u32 {
        let id = self.next.get();
        self.next.set(id + 1);
        id
    }

    /// The id the next call to [`IdAllocator::allocate`] will return.
    #[must_use = "this is a pure lookup with no side effects"]
    pub fn peek(&self) -> u32 {
        self.next.get()
    }
}
