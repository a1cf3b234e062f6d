mod auth;
mod client;
mod entries;
mod supabase_url;

pub(crate) use supabase_url::*;

pub use auth::*;
pub use client::*;
pub use entries::*;
