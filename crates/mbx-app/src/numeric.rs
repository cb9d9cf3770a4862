// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

/// Digits typed in normal mode, accumulated into a 1-based row number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NumberInput {
    buffer: String,
}

impl NumberInput {
    /// Appends `digit` and returns the zero-based row to hover when the
    /// buffer names a row in `1..=item_count`. Buffers that can no longer
    /// name a row are discarded; `01` through `09` stay alive because a
    /// third digit may still complete them.
    pub fn push(&mut self, digit: char, item_count: usize) -> Option<usize> {
        if !digit.is_ascii_digit() {
            self.clear();
            return None;
        }
        self.buffer.push(digit);
        if let Ok(value) = self.buffer.parse::<usize>()
            && (1..=item_count).contains(&value)
        {
            return Some(value - 1);
        }
        let len = self.buffer.len();
        if len >= 3 || (len == 2 && !self.buffer.starts_with('0')) {
            self.clear();
        }
        None
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }
}
