//! Core types and trait definitions for the cardlink contact lifecycle.
//!
//! This crate is deliberately free of HTTP and database dependencies. It owns
//! the domain model (contacts, events, assignments, audit records, tasks),
//! the pure decision rules of the verification workflow and the staleness
//! scan, CSV row normalisation, and the [`store::CrmStore`] abstraction that
//! storage backends implement.

#![allow(async_fn_in_trait)]

pub mod actor;
pub mod contact;
pub mod error;
pub mod event;
pub mod history;
pub mod import;
pub mod staleness;
pub mod store;
pub mod task;
pub mod workflow;

pub use error::{Classify, Error, ErrorKind, Result};
