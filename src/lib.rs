//! # onekit
//!
//! Pure Rust library for OpenNebula virtual machine lifecycle management.
//!
//! This crate provides functionality for:
//! - Driving a VM from declared desired state to observed remote state
//!   through the provider's asynchronous, eventually-consistent API
//! - Building template instantiation payloads from a desired-state spec
//! - Bounded polling until a target lifecycle state is reached
//! - Decoding the provider's XML records into typed fields
//! - Converting permission triples between the octal-style string form and
//!   the provider's per-bit representation
//!
//! The transport itself stays outside: everything remote goes through the
//! narrow [`Remote`] trait, one synchronous call at a time.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use onekit::backend::mock::MockRemote;
//! use onekit::{Client, VmHandle, VmSpec};
//!
//! // In production the backend is the surrounding tool's RPC session;
//! // here the scripted mock stands in.
//! let session = Arc::new(MockRemote::new());
//! let client = Client::new(Box::new(session));
//!
//! let spec = VmSpec::new(7, "net0").with_name("vm1").with_size(20480);
//! let mut vm = VmHandle::new(spec);
//!
//! client.create(&mut vm).expect("create failed");
//! assert!(vm.id.is_some());
//! ```
//!
//! ## Convergence model
//!
//! [`Client::read`] is idempotent and safe to call at any time: it fully
//! overwrites the handle's observed attributes from the authoritative
//! remote record, and clears the recorded identity when the VM cannot be
//! located — the signal for out-of-band deletion. Create and delete block
//! on a bounded poll ([`poll::wait_for`]) because remote provisioning and
//! termination complete asynchronously with no push notification.
//! Transport failures are never retried by this crate; only the absence of
//! the target lifecycle state is.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod perm;
pub mod poll;
pub mod template;
pub mod types;

pub use backend::{Arg, Remote};
pub use error::{Error, Result};
pub use lifecycle::{Client, VmHandle, VmObserved};
pub use model::{LifecycleState, VmInfo, VmPool};
pub use perm::Permissions;
pub use template::build_instantiate_template;
pub use types::{DiskSpec, LifecycleConfig, NicSpec, PollConfig, VmSpec};
