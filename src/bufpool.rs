//! Fixed-size pool of reusable render buffers.
//!
//! Template execution always targets a pooled buffer, never the live output
//! sink, so a mid-render failure leaves the real response untouched.
//! Acquisition blocks while the pool is exhausted; the guard returns its
//! buffer on every path, success or not.

use parking_lot::{Condvar, Mutex};
use std::ops::{Deref, DerefMut};

pub struct BufferPool {
    buffers: Mutex<Vec<String>>,
    available: Condvar,
}

impl BufferPool {
    /// Create a pool holding `count` buffers of `capacity` bytes each.
    /// `count` is clamped to at least one.
    pub fn new(count: usize, capacity: usize) -> BufferPool {
        let count = count.max(1);
        BufferPool {
            buffers: Mutex::new((0..count).map(|_| String::with_capacity(capacity)).collect()),
            available: Condvar::new(),
        }
    }

    /// Take a buffer, blocking until one is free.
    pub fn acquire(&self) -> PooledBuffer<'_> {
        let mut buffers = self.buffers.lock();
        let buf = loop {
            match buffers.pop() {
                Some(buf) => break buf,
                None => self.available.wait(&mut buffers),
            }
        };
        PooledBuffer { pool: self, buf }
    }

    fn release(&self, mut buf: String) {
        buf.clear();
        self.buffers.lock().push(buf);
        self.available.notify_one();
    }
}

/// Guard returning its buffer to the pool on drop.
pub struct PooledBuffer<'a> {
    pool: &'a BufferPool,
    buf: String,
}

impl Deref for PooledBuffer<'_> {
    type Target = String;

    fn deref(&self) -> &String {
        &self.buf
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut String {
        &mut self.buf
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.buf));
    }
}
