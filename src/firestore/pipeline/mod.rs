//! Expression evaluation for pipeline stages.
//!
//! An [`Expr`] is evaluated against one document at a time and yields an [`EvaluateResult`]:
//! a value, `Null`, `Unset` (the field does not exist) or an error. Errors never panic and
//! never abort evaluation of sibling documents; a filter simply drops the document.
//!
//! ```
//! use firestore_core::firestore::pipeline::{field, Expr};
//!
//! let adult = Expr::and(vec![field("age").gte(18), field("name").exists()]);
//! assert_eq!(adult.to_string(), "and(gte(field(age), 18), exists(field(name)))");
//! ```

mod arithmetic;
mod arrays;
mod comparison;
mod evaluate;
mod expr;
mod logical;
mod strings;
mod timestamps;

pub use evaluate::{EvaluateResult, EvaluationContext, EvaluationError};
pub use expr::{constant, field, Expr, FunctionKind};
