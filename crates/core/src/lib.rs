//! Domain types and pure logic for the callback desk: the callback request
//! model and validator, the record store capability, upload policy, CSV
//! export, and price estimation.

pub mod attachment;
pub mod callback;
pub mod error;
pub mod estimation;
pub mod export;
pub mod records;
pub mod types;
