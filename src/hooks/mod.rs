//! View-facing data hooks: the view-state resolver, list and item queries, mutations and the
//! shared cache they coordinate through.

pub mod cache;
pub mod item;
pub mod list;
pub mod mutation;
pub mod view_state;

pub use cache::{Invalidation, QueryCache};
pub use item::{ItemQuery, ItemState};
pub use list::{ListQuery, ListState, LoadingPolicy, PageInfo, QueryOptions};
pub use mutation::{Mutation, MutationState};
pub use view_state::{resolve, ViewState};
