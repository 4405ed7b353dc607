pub mod account;
pub mod catalog;
pub mod credits;
pub mod macros;

pub use account::*;
pub use catalog::*;
pub use credits::*;
