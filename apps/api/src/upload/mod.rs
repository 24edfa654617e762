//! Upload relay: decode the browser's multipart form, re-encode it for the
//! matcher service, and hand the matcher's response back untouched.

pub mod form;
pub mod handlers;
pub mod models;
