pub mod client;
pub mod mutation;
pub mod payload;
pub mod spec;

pub use client::{ClientCore, Resource, ResourceClient};
pub use payload::{Checks, NoPayload, Payload};
pub use spec::{BodyEncoding, ResourceSpec, Staleness, UpdateMethod};
