//! Dealroom domain core.
//!
//! Holds the NDA lifecycle, the document access gate, upload validation and
//! the collaborator traits (repositories, document store) the services are
//! written against. Nothing in here knows about HTTP or SQL.

pub mod access;
pub mod clock;
pub mod documents;
pub mod error;
pub mod listing;
#[cfg(any(test, feature = "test-support"))]
pub mod memory;
pub mod nda;
pub mod principal;
pub mod repository;
pub mod roles;
pub mod services;
pub mod storage;
pub mod types;
