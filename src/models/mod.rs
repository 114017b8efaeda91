mod address;
mod cart;
mod checkout;
mod order;
mod payment;
mod product;
mod user;

pub use address::*;
pub use cart::*;
pub use checkout::*;
pub use order::*;
pub use payment::*;
pub use product::*;
pub use user::*;
