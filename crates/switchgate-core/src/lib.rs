// ABOUTME: Core library for switchgate: the read-only boundary to the switch engine.
// ABOUTME: Defines live records, snapshot projections, streaming accessors, and aggregation.

pub mod aggregate;
pub mod format;
pub mod live;
pub mod memory;
pub mod schema;
pub mod stream;
pub mod switcher;

pub use aggregate::{aggregate, aggregate_at};
pub use memory::{InMemorySwitch, SeedError, SwitchSeed};
pub use schema::Index;
pub use stream::{EntrySink, EntryStream};
pub use switcher::Switcher;
