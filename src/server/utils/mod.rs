pub mod header_utils;
pub mod locator_utils;
pub mod sanitize_utils;
