pub mod assert;

pub use assert::{assertion_error, hard_assert};
