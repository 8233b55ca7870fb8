pub mod balance;
pub mod expense;
pub mod share;

pub use balance::{Edge, NetBalance, OwedDetail, PairBalance};
pub use expense::Expense;
pub use share::{EdgeDelta, Share};
