//! Tree rewrite passes built on [`Visitor`](crate::visit::Visitor).

mod fold;

pub use self::fold::{fold_constants, ConstantFolder};
