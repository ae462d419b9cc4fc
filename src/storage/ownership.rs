// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ownership enforcement for owner-scoped lookups.
//!
//! Ownership failures are indistinguishable from missing
//! records: a resource that belongs to someone else is filtered out, so the
//! caller sees "not found" and learns nothing about other tenants.

/// Trait for resources that have an owner.
pub trait OwnedResource {
    /// Get the owner's user ID.
    fn owner_user_id(&self) -> &str;

    fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_user_id() == user_id
    }
}

/// Filter a lookup result down to resources owned by `user_id`.
pub trait OwnedBy<T> {
    fn owned_by(self, user_id: &str) -> Option<T>;
}

impl<T: OwnedResource> OwnedBy<T> for Option<T> {
    fn owned_by(self, user_id: &str) -> Option<T> {
        self.filter(|resource| resource.is_owned_by(user_id))
    }
}
