// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::ops::Range;

pub const DEFAULT_VIEWPORT_HEIGHT: usize = 15;

/// Fixed-height window over a long list that keeps the cursor visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    start: usize,
    height: usize,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(DEFAULT_VIEWPORT_HEIGHT)
    }
}

impl Viewport {
    pub fn new(height: usize) -> Self {
        Self {
            start: 0,
            height: height.max(1),
        }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn reset(&mut self) {
        self.start = 0;
    }

    /// Scrolls the least amount that brings `cursor` into view, then clamps
    /// `start` to `0..=len - height`.
    pub fn follow(&mut self, cursor: usize, len: usize) {
        if len == 0 {
            self.start = 0;
            return;
        }
        let cursor = cursor.min(len - 1);
        if cursor < self.start {
            self.start = cursor;
        } else if cursor >= self.start + self.height {
            self.start = cursor + 1 - self.height;
        }
        self.start = self.start.min(len.saturating_sub(self.height));
    }

    pub fn visible_range(&self, len: usize) -> Range<usize> {
        let start = self.start.min(len);
        start..(start + self.height).min(len)
    }

    pub fn has_more_above(&self) -> bool {
        self.start > 0
    }

    pub fn has_more_below(&self, len: usize) -> bool {
        self.start + self.height < len
    }
}
