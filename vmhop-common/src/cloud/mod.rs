//! Adapters for the two cloud CLIs.
//!
//! Each adapter builds an [`Invocation`](crate::tool::Invocation), runs it
//! through a [`ToolRunner`](crate::tool::ToolRunner), checks the result under
//! the configured failure policy and parses stdout into a typed record.

pub mod azure;
pub mod oci;
