//! Context attribute names.
//!
//! Attribute names are lowercase ASCII as defined by CloudEvents 1.0. The
//! protocol binding decides how each name is spelled on a given transport.

/// The only supported `specversion`.
pub const SPEC_VERSION: &str = "1.0";

pub const ID: &str = "id";
pub const SOURCE: &str = "source";
pub const SPECVERSION: &str = "specversion";
pub const TYPE: &str = "type";
pub const DATACONTENTTYPE: &str = "datacontenttype";
pub const DATASCHEMA: &str = "dataschema";
pub const SUBJECT: &str = "subject";
pub const TIME: &str = "time";

/// Structured-mode payload members (never attributes).
pub const DATA: &str = "data";
pub const DATA_BASE64: &str = "data_base64";

/// Every well-known context attribute, in wire order.
pub const WELL_KNOWN: [&str; 8] = [
    ID,
    SOURCE,
    SPECVERSION,
    TYPE,
    DATACONTENTTYPE,
    DATASCHEMA,
    SUBJECT,
    TIME,
];

pub fn is_well_known(name: &str) -> bool {
    WELL_KNOWN.contains(&name)
}

/// Names that may not be used for extension attributes.
pub fn is_reserved(name: &str) -> bool {
    is_well_known(name) || name == DATA || name == DATA_BASE64
}
