// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! entity_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(DatabaseId);
entity_id!(TableId);
entity_id!(FieldId);
entity_id!(ItemId);

const ROOT_COLLECTION_KEY: &str = "root";

/// Collections are addressed by number, except the instance-wide root which
/// the API calls `"root"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CollectionId {
    Id(i64),
    Key(String),
}

impl CollectionId {
    pub fn root() -> Self {
        Self::Key(ROOT_COLLECTION_KEY.to_owned())
    }

    pub fn is_root(&self) -> bool {
        matches!(self, Self::Key(key) if key == ROOT_COLLECTION_KEY)
    }
}

impl From<i64> for CollectionId {
    fn from(value: i64) -> Self {
        Self::Id(value)
    }
}

impl From<ItemId> for CollectionId {
    fn from(value: ItemId) -> Self {
        Self::Id(value.get())
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Key(key) => f.write_str(key),
        }
    }
}
