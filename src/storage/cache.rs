// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-process LRU cache for the two hot read paths.
//!
//! - Listings: owner id → that owner's files, newest first. Invalidated
//!   whenever the owner uploads. A reader takes a [`ListingGeneration`]
//!   before reading the database; the listing it read is only stored if no
//!   invalidation for that owner happened in between.
//! - Share resolutions: share token → file location and expiry. An entry
//!   never outlives the link it describes.
//!
//! The cache is only an accelerator. A poisoned lock is treated as a miss
//! and the caller falls back to the database.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use lru::LruCache;

use super::repository::{ShareResolution, StoredFile};

struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
    ttl: Duration,
}

impl<V> CacheEntry<V> {
    fn is_fresh(&self) -> bool {
        self.inserted_at.elapsed() < self.ttl
    }
}

/// One TTL-bounded LRU keyspace.
struct Keyspace<V> {
    entries: Mutex<LruCache<String, CacheEntry<V>>>,
    ttl: Duration,
}

impl<V: Clone> Keyspace<V> {
    fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.entries.lock().ok()?;
        if let Some(entry) = entries.get(key) {
            if entry.is_fresh() {
                return Some(entry.value.clone());
            }
            entries.pop(key);
        }
        None
    }

    fn put(&self, key: &str, value: V, ttl: Duration) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.put(
                key.to_string(),
                CacheEntry {
                    value,
                    inserted_at: Instant::now(),
                    ttl: ttl.min(self.ttl),
                },
            );
        }
    }

    fn invalidate(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.pop(key);
        }
    }
}

/// Point in the invalidation history, taken before a listing is read from
/// the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ListingGeneration(u64);

/// Last invalidation generation per owner. Owners pushed out of the LRU
/// raise `floor`, so an evicted owner is treated as invalidated at the
/// newest evicted generation.
struct Invalidations {
    by_owner: LruCache<String, u64>,
    floor: u64,
}

impl Invalidations {
    fn new(capacity: usize) -> Self {
        Self {
            by_owner: LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)),
            floor: 0,
        }
    }

    fn last_for(&self, owner_id: &str) -> u64 {
        self.by_owner.peek(owner_id).copied().unwrap_or(self.floor)
    }

    fn record(&mut self, owner_id: &str, generation: u64) {
        if let Some((evicted, last)) = self.by_owner.push(owner_id.to_string(), generation) {
            if evicted != owner_id {
                self.floor = self.floor.max(last);
            }
        }
    }
}

/// Lookup cache shared by the file store and the share manager.
pub struct LookupCache {
    listings: Keyspace<Vec<StoredFile>>,
    generation: AtomicU64,
    invalidations: Mutex<Invalidations>,
    shares: Keyspace<ShareResolution>,
    enabled: bool,
}

impl LookupCache {
    /// Create a cache holding up to `capacity` entries per keyspace.
    pub fn new(capacity: usize, listing_ttl: Duration, share_ttl: Duration) -> Self {
        Self {
            listings: Keyspace::new(capacity, listing_ttl),
            generation: AtomicU64::new(0),
            invalidations: Mutex::new(Invalidations::new(capacity)),
            shares: Keyspace::new(capacity, share_ttl),
            enabled: true,
        }
    }

    /// A cache that never stores anything.
    pub fn disabled() -> Self {
        Self {
            listings: Keyspace::new(1, Duration::ZERO),
            generation: AtomicU64::new(0),
            invalidations: Mutex::new(Invalidations::new(1)),
            shares: Keyspace::new(1, Duration::ZERO),
            enabled: false,
        }
    }

    pub fn get_listing(&self, owner_id: &str) -> Option<Vec<StoredFile>> {
        if !self.enabled {
            return None;
        }
        self.listings.get(owner_id)
    }

    /// Current generation. Take it before reading a listing from the
    /// database and hand it back to [`Self::put_listing`].
    pub fn listing_generation(&self) -> ListingGeneration {
        ListingGeneration(self.generation.load(Ordering::SeqCst))
    }

    /// Cache a listing read at `read_at`. Skipped if the owner's listing was
    /// invalidated since then.
    pub fn put_listing(&self, owner_id: &str, files: Vec<StoredFile>, read_at: ListingGeneration) {
        if !self.enabled {
            return;
        }
        let Ok(invalidations) = self.invalidations.lock() else {
            return;
        };
        if invalidations.last_for(owner_id) > read_at.0 {
            tracing::debug!(user_id = %owner_id, "listing changed while reading; not cached");
            return;
        }
        self.listings.put(owner_id, files, self.listings.ttl);
    }

    /// Drop an owner's cached listing and reject listings read before now.
    pub fn invalidate_listing(&self, owner_id: &str) {
        match self.invalidations.lock() {
            Ok(mut invalidations) => {
                let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
                invalidations.record(owner_id, generation);
                self.listings.invalidate(owner_id);
            }
            // Poisoned: puts are refused too, so dropping the entry suffices.
            Err(_) => self.listings.invalidate(owner_id),
        }
    }

    /// Cached resolution for a share token. An entry whose link has expired
    /// since insertion is dropped and reported as a miss.
    pub fn get_share(&self, token: &str) -> Option<ShareResolution> {
        if !self.enabled {
            return None;
        }
        let resolution = self.shares.get(token)?;
        if Utc::now() > resolution.expires_at {
            self.shares.invalidate(token);
            return None;
        }
        Some(resolution)
    }

    /// Cache a resolution for at most the share TTL and never past the
    /// link's own expiry.
    pub fn put_share(&self, token: &str, resolution: ShareResolution) {
        if !self.enabled {
            return;
        }
        let Some(remaining) = remaining_until(resolution.expires_at) else {
            return;
        };
        self.shares.put(token, resolution, remaining);
    }
}

fn remaining_until(expires_at: DateTime<Utc>) -> Option<Duration> {
    (expires_at - Utc::now())
        .to_std()
        .ok()
        .filter(|d| !d.is_zero())
}
