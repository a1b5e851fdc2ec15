//! Typed models and lazy pagination for the Spotify Web API.
//!
//! Every object the API sends or receives is a [Model](model::Model) described by a field table. Raw JSON is checked
//! against the table and [coerced](coerce) into typed values, and typed values are [dumped](dump) back into JSON for
//! request bodies. A coercion failure names the exact path in the document that didn't match.
//!
//! Requests go through a [Client](client::Client) over some [Transport](client::Transport). With the `sync` feature
//! (enabled by default) a blocking HTTPS transport is available in [client::http]. Paged responses are returned as
//! [Pages](model::page::Page) that fetch the following pages only when asked to.
//!
//! # Feature flags
//!
//! - `sync`: the blocking HTTPS transport. Enabled by default.
//! - `native-tls`: use the system's TLS implementation. Enabled by default.
//! - `rustls-tls`: use rustls for TLS.

pub mod client;
pub mod coerce;
pub mod dump;
mod error;
pub mod model;
pub mod schema;
pub mod value;

pub use crate::error::{CoercionError, CoercionErrorKind, Error, Result, TransportError, UnionResolutionError};

/// Re-exports of the traits and types most uses of the library need.
pub mod prelude {
    pub use crate::{
        client::{Client, Method, Request, RequestOptions, Transport},
        model::{page::Page, Model},
        value::{Maybe, Typed},
    };
}
