//! scorebeat Event - Check events and their result documents
//!
//! A `CheckResult` is lifted into an `Event`, which the encoder turns into
//! three documents: admin, team and generic. Shipping them is up to the
//! caller.

pub mod encoder;
pub mod event;

pub use encoder::{
    admin, encode_all, generic, team, EncodedDocument, EncodingError, FullDocument,
    GenericDocument, INDEX_DATE_FORMAT,
};
pub use event::Event;
