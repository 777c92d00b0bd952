pub mod emissions;
pub mod order;

pub use emissions::{ActivityVector, EmissionEntry, EmissionResult};
pub use order::{CanonicalOrder, OrderStatus, MISSING_TEXT};
