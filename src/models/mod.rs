pub mod invoice;
pub mod order;
pub mod proof;

pub use invoice::*;
pub use order::*;
pub use proof::*;
