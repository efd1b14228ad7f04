mod scoping_value;

pub use scoping_value::{ScopingValue, Variable};
