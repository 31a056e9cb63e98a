pub mod value;
pub mod bits;
pub mod fragment;
pub mod render;
pub mod engine;
pub mod session;
pub mod error;
#[cfg(feature = "serde")]
pub mod config;

pub use bits::BitVector;
pub use engine::{Changes, Register, ValueSyncEngine};
pub use render::{BitCell, DisplayMode, RowView};
pub use session::{Event, Host, Session};
pub use value::RawValue;
