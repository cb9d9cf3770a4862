// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod filter;
pub mod ids;
pub mod load;
pub mod model;
pub mod numeric;
pub mod stack;
pub mod state;
pub mod viewport;
pub mod web;

pub use ids::*;
pub use load::*;
pub use model::*;
pub use numeric::NumberInput;
pub use stack::CollectionStack;
pub use state::*;
pub use viewport::{DEFAULT_VIEWPORT_HEIGHT, Viewport};
