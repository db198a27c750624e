//! Cross-runtime HTTP request lifecycle orchestration.
//!
//! This crate unifies several native HTTP transports (a standard
//! browser-style client, a legacy ActiveX-style fallback family, and a
//! mobile-runtime HTTP client) behind one future-returning API. It does not
//! implement an HTTP client; it orchestrates an existing transport's event
//! model into a single-resolution outcome.
//!
//! The pieces:
//!
//! * [`transport`] - the [`Transport`](transport::Transport) handle and the
//!   [`Runtime`](transport::Runtime) capability descriptor stating which
//!   transport families the current environment can construct
//! * [`provider`] - transport acquisition with the legacy fallback order
//! * [`guard`] - the poll guard covering the mobile transport's unreliable
//!   error notifications
//! * [`lifecycle`] - the core state machine: [`Xhr`](lifecycle::Xhr) wires a
//!   transport, races its events against the timeout timer, and settles the
//!   outcome exactly once
//! * [`response`] - response body formatting (JSON with graceful fallback,
//!   JSONP hook point)
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use xhr_core::lifecycle::{CallData, CallParams, Xhr};
//! use xhr_core::response::DeclaredType;
//! use xhr_core::settings::StaticSettings;
//! # use xhr_core::transport::{Runtime, Transport};
//! # use xhr_core::Error;
//! # struct MyRuntime;
//! # impl Runtime for MyRuntime {
//! #     fn create_standard(&self) -> Result<Box<dyn Transport>, Error> {
//! #         unimplemented!()
//! #     }
//! # }
//!
//! # async fn run() -> Result<(), xhr_core::Error> {
//! let settings = StaticSettings::new().set("xhr.timeout", "10000");
//! let mut xhr = Xhr::new(Arc::new(MyRuntime), &settings);
//!
//! let outcome = xhr
//!     .call(
//!         CallParams::to("https://api.example.test/users")
//!             .declared_type(DeclaredType::Json)
//!             .data(CallData::Pairs(vec![("page".into(), "2".into())])),
//!     )
//!     .await?;
//!
//! match outcome {
//!     Ok(reply) => println!("{}: {:?}", reply.status, reply.response),
//!     Err(rejection) => println!("failed: {}", rejection.status),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # In scope:
//!
//! * Transport selection with deterministic legacy fallback
//! * Completion detection, including the mobile polling workaround
//! * Success/error/timeout classification with a settle-once guarantee
//! * Response formatting (JSON parse with raw-text fallback, JSONP hook)
//!
//! # Out of scope:
//!
//! * The native transports themselves (the embedder implements
//!   [`Transport`](transport::Transport) per runtime)
//! * The JSONP execution mechanism (only the hook point is defined)
//! * Cookie jars, TLS, redirects

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
pub mod guard;
pub mod headers;
pub mod lifecycle;
pub mod provider;
pub mod response;
pub mod settings;
pub mod transport;

pub use error::Error;
