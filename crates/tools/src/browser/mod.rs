//! CDP-based browser automation.
//!
//! - One Chrome process, one page, owned by [`session::SessionManager`]
//! - Full Chrome DevTools Protocol over WebSocket in [`cdp`]
//! - The debug port stays fixed so the audit engine can attach to the page

pub mod cdp;
pub mod session;

pub use session::{BrowserSession, SessionManager};
