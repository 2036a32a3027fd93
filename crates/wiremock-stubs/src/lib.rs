//! Stub mapping model and wire-format normalization for WireMock-compatible
//! mock servers.
//!
//! Mappings are built with the [`dsl`] functions or the `*Builder` types,
//! converted to the admin API's JSON with [`normalize`], and read back from
//! server replies or mapping files with [`denormalize`]. The [`client`]
//! module drives the admin API over a caller-supplied transport, and the
//! checker validates mapping files on disk.
//!
//! # Example
//!
//! ```
//! use wiremock_stubs::dsl::*;
//! use wiremock_stubs::{denormalize, normalize, StubMapping};
//!
//! let mapping = post(url_path_equal_to("/orders"))
//!     .with_request_body(matching_json_path("$.items"))
//!     .will_return(a_response().with_status(201).with_header("Location", "/orders/1"))
//!     .build()
//!     .unwrap();
//!
//! let wire = normalize(&mapping).unwrap();
//! assert_eq!(wire["request"]["urlPath"], "/orders");
//!
//! let back: StubMapping = denormalize(wire).unwrap();
//! assert_eq!(back, mapping);
//! ```
//!
//! Checking mapping files:
//!
//! ```no_run
//! use wiremock_stubs::{check_directory, CheckOptions};
//! use std::path::Path;
//!
//! let result = check_directory(Path::new("./mappings"), &CheckOptions::default());
//! if result.has_errors() {
//!     eprintln!("Found {} errors", result.errors);
//! }
//! ```

mod checker;
pub mod client;
pub mod document;
pub mod dsl;
mod error;
pub mod matching;
mod normalizer;
pub mod response;
pub mod stubbing;
mod types;

pub use checker::{check_directory, check_file, check_json, check_value};
pub use error::MappingError;
pub use normalizer::{
    denormalize, normalize, rename_key, AmendsDeserialization, AmendsSerialization, Denormalize,
    Structure,
};
pub use types::{CheckIssue, CheckOptions, CheckResult, Severity};

pub use matching::{RequestPattern, RequestPatternBuilder, ValueMatchingStrategy};
pub use response::{ResponseDefinition, ResponseDefinitionBuilder};
pub use stubbing::{MappingBuilder, StubImport, StubMapping};
