//! Configuration lookup port.
//!
//! An absent key yields the caller's default. A key that is present but does
//! not parse is a `ConfigInvalid` error. Range checks live in
//! [`crate::domain::config_validation`].

use crate::domain::error::ConfluenceError;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> Result<i64, ConfluenceError>;
    fn get_double(&self, section: &str, key: &str, default: f64) -> Result<f64, ConfluenceError>;
}
