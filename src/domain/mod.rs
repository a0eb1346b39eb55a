mod cart;
mod client;
mod money;
mod payment;
mod product;
mod sale;
mod statement;

pub use cart::*;
pub use client::*;
pub use money::*;
pub use payment::*;
pub use product::*;
pub use sale::*;
pub use statement::*;
