// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::model::CollectionRef;

/// Ancestors of the collection currently shown, oldest first. Empty while
/// browsing a top-level collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionStack {
    frames: Vec<CollectionRef>,
}

impl CollectionStack {
    pub fn push(&mut self, collection: CollectionRef) {
        self.frames.push(collection);
    }

    pub fn pop(&mut self) -> Option<CollectionRef> {
        self.frames.pop()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CollectionRef> {
        self.frames.iter()
    }
}
