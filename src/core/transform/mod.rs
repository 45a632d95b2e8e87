//! Form transformation
//!
//! Turns an uploaded survey form into an XForm bound to one deployment:
//!
//! - [`converter`] - the external XLSForm → XForm step
//! - [`rewrite`] - rebinding of `instance@src` and `data@id`
//! - [`xform`] - the pipeline tying the two together, plus the validity check

pub mod converter;
pub mod rewrite;
pub mod xform;

pub use converter::{Xls2XformCommand, XlsFormConverter};
pub use rewrite::{
    required_media, rewrite_bindings, AttributeChange, InstanceRewrite, RewriteReport, SkipReason,
};
pub use xform::{check_validity, convert, generate_updated_xform, UpdatedXForm};
