//! Domain models for the shop service.

pub mod order;
pub mod product;
pub mod session;
pub mod user;

pub use order::{NewOrder, NewOrderItem, Order, OrderItem};
pub use product::Product;
pub use session::{CurrentUser, ProfileEditLock, keys as session_keys};
pub use user::{ProfileUpdate, User};
