//! Ring Buffer Implementation

/// Default capacity (600 samples = ~37 s of history at 16 fps)
pub const DEFAULT_CAPACITY: usize = 600;

/// Fixed-capacity ring buffer that overwrites the oldest entry when full.
pub struct RingBuffer<T> {
    /// Storage; slots beyond `len` are uninitialized from the caller's view
    storage: Vec<T>,
    capacity: usize,
    /// Index of the next write
    head: usize,
    /// Number of live entries (<= capacity)
    len: usize,
    /// Total entries ever pushed (for statistics)
    total_written: usize,
}

impl<T> RingBuffer<T> {
    /// Create a new ring buffer with the given capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring buffer capacity must be non-zero");
        Self {
            storage: Vec::with_capacity(capacity),
            capacity,
            head: 0,
            len: 0,
            total_written: 0,
        }
    }

    /// Create a buffer with the default capacity (600 entries).
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }

    /// Push an entry, evicting the oldest one if the buffer is full.
    pub fn push(&mut self, entry: T) {
        if self.storage.len() < self.capacity {
            self.storage.push(entry);
        } else {
            self.storage[self.head] = entry;
        }
        self.head = (self.head + 1) % self.capacity;
        self.len = (self.len + 1).min(self.capacity);
        self.total_written += 1;
    }

    /// Number of entries currently stored.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the buffer holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether the buffer is at capacity (next push evicts).
    pub fn is_full(&self) -> bool {
        self.len == self.capacity
    }

    /// Buffer capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Fill ratio (0.0 to 1.0).
    pub fn fill_ratio(&self) -> f64 {
        self.len as f64 / self.capacity as f64
    }

    /// Total entries ever pushed.
    pub fn total_written(&self) -> usize {
        self.total_written
    }

    /// Most recent entry, if any.
    pub fn last(&self) -> Option<&T> {
        if self.len == 0 {
            return None;
        }
        let idx = (self.head + self.capacity - 1) % self.capacity;
        Some(&self.storage[idx])
    }

    /// Iterate entries oldest-first.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        let start = if self.len < self.capacity {
            0
        } else {
            self.head
        };
        (0..self.len).map(move |i| &self.storage[(start + i) % self.capacity])
    }

    /// Read the last `count` entries, most recent first.
    pub fn read_last(&self, count: usize) -> Vec<T>
    where
        T: Clone,
    {
        let count = count.min(self.len);
        let mut out = Vec::with_capacity(count);
        for i in 0..count {
            let idx = (self.head + self.capacity - 1 - i) % self.capacity;
            out.push(self.storage[idx].clone());
        }
        out
    }

    /// Drop all entries (capacity is retained).
    pub fn clear(&mut self) {
        self.storage.clear();
        self.head = 0;
        self.len = 0;
    }
}
