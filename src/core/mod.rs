//! Shared concurrency plumbing used across the engine core.

mod mt_resource;

pub use mt_resource::MtResource;
