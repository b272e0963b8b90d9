//! # Inksync Testkit
//!
//! Testing utilities for Inksync.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: an in-memory vault with any number of in-memory clients
//! - **Generators**: Proptest strategies for filepaths, contents and edit
//!   scripts
//!
//! ## Test Fixtures
//!
//! ```rust,no_run
//! use inksync_testkit::fixtures::{write_file, TestFixture};
//!
//! async fn example() {
//!     let fixture = TestFixture::new(2);
//!     write_file(fixture.client(0), "a.txt", b"hello").await.unwrap();
//!     fixture.client(0).sync_all().await.unwrap();
//!     fixture.client(1).sync_all().await.unwrap();
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use inksync_testkit::generators::edit_script;
//!
//! proptest! {
//!     #[test]
//!     fn replicas_converge(script in edit_script(2, 20)) {
//!         // apply the script, sync everyone, compare trees
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{
    conflict_files, memory_client, read_file, remove_file, write_file, TestClient, TestFixture,
    TestVault,
};
pub use generators::{edit_script, Edit, PATH_POOL};
