//! Request routing: three matcher tiers with strict priority, plus the
//! middleware pipeline wrapped around every dispatch.

pub(crate) mod core;
pub(crate) mod radix;
pub(crate) mod regex_table;

pub use self::core::{RouteError, Router};
pub use self::radix::{NodeKind, ParamVec};
