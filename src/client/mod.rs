//! Typed async client for the Swift v1 API.
//!
//! The object model mirrors the storage hierarchy: a [`Connection`] holds
//! auth state, an [`Account`] enumerates containers, a [`Container`]
//! lists and creates objects, and an [`ObjectHandle`] reads and writes
//! one object. Handles borrow the connection, so they are cheap to make
//! and carry no state beyond their names.
//!
//! Failure policy: any non-2xx response surfaces as
//! [`Error::Response`](crate::Error::Response) carrying the status, URL,
//! and body. Nothing in the client retries.

mod account;
mod connection;
mod container;
mod object;

pub use account::Account;
pub use connection::Connection;
pub use container::{Container, CreateOptions, ListFormat, ListParams};
pub use object::{ObjectHandle, WriteOptions};
