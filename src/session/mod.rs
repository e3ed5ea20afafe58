//! Reader session: event handling and effect execution
//!
//! ```text
//! engine events ─▶ handle ─┐
//! editor actions ─▶ act ───┼─▶ Vec<Effect> ─▶ drive ─▶ MarkApi
//!                          │                    │
//!           complete ◀─────┴──── outcomes ◀─────┘
//! ```

mod driver;
mod events;
mod reader;


pub use driver::{drive, open, OpenError};
pub use events::{EditorAction, Effect, Notification, NotificationLevel, ReaderEvent, ReaderOptions};
pub use reader::ReaderSession;
