pub mod backend;
pub mod chrome;
pub mod console;
pub mod mock;
pub mod types;

pub use backend::{BODY_TEXT_EXPRESSION, BrowserSession};
pub use chrome::ChromeSession;
pub use console::ConsoleLog;
pub use mock::MockSession;
pub use types::{SessionError, SessionResult};
