//! Stable error codes for machine-readable failure triage.
//!
//! Every user-facing error message carries one of these codes in brackets so
//! scripts and issue reports can identify a failure without parsing prose.

pub const COND_NOT_COMPARISON: &str = "SDKIFY_COND_001";
pub const COND_UNQUOTED: &str = "SDKIFY_COND_002";
pub const COND_BAD_DIMENSION: &str = "SDKIFY_COND_003";
pub const COND_ARITY: &str = "SDKIFY_COND_004";

pub const XML_PARSE: &str = "SDKIFY_XML_001";
pub const XML_NOT_PROJECT: &str = "SDKIFY_XML_002";
pub const XML_WRITE: &str = "SDKIFY_XML_003";

pub const EVAL_UNTERMINATED: &str = "SDKIFY_EVAL_001";

pub const CONV_UNSUPPORTED_STYLE: &str = "SDKIFY_CONV_001";
pub const CONV_OUTPUT_TYPE: &str = "SDKIFY_CONV_002";
pub const CONV_TARGET_FRAMEWORK: &str = "SDKIFY_CONV_003";
pub const CONV_EVAL: &str = "SDKIFY_CONV_004";

pub const PKG_XML: &str = "SDKIFY_PKG_001";
pub const PKG_MISSING_ID: &str = "SDKIFY_PKG_002";
