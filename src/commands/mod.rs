//! Command Interpreter Module
//!
//! This module implements a small line-oriented command language over the
//! engine. It is what the interactive `lapsekv repl` front end speaks, and it
//! doubles as a convenient way to script scenarios.
//!
//! ## Architecture
//!
//! ```text
//!  "add k 0 2"
//!       │
//!       ▼
//! ┌─────────────────┐
//! │ CommandHandler  │  (this module)
//! │                 │
//! │  - Tokenize     │
//! │  - Dispatch     │
//! │  - Execute      │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │     Engine      │  (engine module)
//! └────────┬────────┘
//!          │ Result
//!          ▼
//!       Reply  ──>  "OK" / "VALUE 0" / "ERROR key_exists ..."
//! ```

pub mod handler;
pub mod reply;

// Re-export the main types
pub use handler::CommandHandler;
pub use reply::Reply;
