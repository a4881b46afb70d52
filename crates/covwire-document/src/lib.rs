//! covwire Document Model
//!
//! A minimal, order-preserving DOM for build and test-runner descriptors.
//!
//! # Core Operations
//!
//! - **Parse**: markup text into an owned [`Document`]
//! - **Mutate**: lookup by name/attribute, child creation and positional removal
//! - **Serialize**: back to markup text; `parse` is a left inverse of
//!   `serialize` for every tree built through the [`Element`] API
//!
//! # Example
//!
//! ```rust
//! use covwire_document::{Document, Element};
//!
//! let mut doc = Document::parse("<arquillian/>").unwrap();
//! doc.root_mut()
//!     .create_child("container")
//!     .set_attribute("qualifier", "jacoco");
//!
//! let text = doc.to_markup();
//! assert!(text.contains(r#"<container qualifier="jacoco"/>"#));
//! assert_eq!(Document::parse(&text).unwrap(), doc);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

// Core modules
pub mod document;
pub mod error;
pub mod node;
pub mod parser;
pub mod serializer;

// Re-exports for convenience
pub use document::{Declaration, Document};
pub use error::{ParseError, ParseResult};
pub use node::{Attribute, Element, Node};
pub use parser::parse;
pub use serializer::{serialize, serialize_element};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
