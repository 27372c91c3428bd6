//! Command Handler
//!
//! Parses one line of text into a command, runs it against the engine and
//! returns a [`Reply`].
//!
//! ## Supported Commands
//!
//! ### Item Commands
//! - `ADD key value [ttl]` - Store only if the key has no live item
//! - `SET key value [ttl]` - Store unconditionally
//! - `GET key` - Read a live value
//! - `CHECK key expected` - Compare the live value
//! - `DELETE key` - Remove a live item
//! - `APPEND key suffix` / `PREPEND key prefix` - Concatenate onto a live value
//! - `INCR key [delta] [initial [ttl]]` - Increment; `initial` creates missing keys
//! - `DECR key [delta] [initial [ttl]]` - Decrement, flooring at zero
//! - `FLUSH` - Drop every item
//!
//! A `ttl` of 0 (or none) means the item never expires.
//!
//! ### Clock and Maintenance Commands
//! - `DELAY seconds` - Advance the clock
//! - `NOW` - Current logical time
//! - `RECLAIM` - Physically remove dead items
//! - `STATS` - Engine counters
//! - `HELP`, `QUIT`
//!
//! Blank lines and lines starting with `#` are ignored.

use super::reply::{Reply, UNKNOWN_COMMAND};
use crate::engine::Engine;
use crate::storage::Expiry;
use bytes::Bytes;
use std::fmt::Write;
use std::sync::Arc;

const HELP: &str = "\
ADD key value [ttl]
SET key value [ttl]
GET key
CHECK key expected
DELETE key
APPEND key suffix
PREPEND key prefix
INCR key [delta] [initial [ttl]]
DECR key [delta] [initial [ttl]]
FLUSH
DELAY seconds
NOW
RECLAIM
STATS
HELP
QUIT
";

/// Handles text commands by dispatching them to the engine.
#[derive(Debug, Clone)]
pub struct CommandHandler {
    engine: Arc<Engine>,
}

impl CommandHandler {
    /// Creates a new command handler over the given engine.
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }

    /// Executes one line of input.
    ///
    /// Returns `None` for blank lines and comments.
    pub fn execute(&self, line: &str) -> Option<Reply> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }

        let mut parts = line.split_whitespace();
        let cmd = parts.next()?.to_uppercase();
        let args: Vec<&str> = parts.collect();

        Some(self.dispatch(&cmd, &args))
    }

    fn dispatch(&self, cmd: &str, args: &[&str]) -> Reply {
        match cmd {
            // Item commands
            "ADD" => self.cmd_store(cmd, args, true),
            "SET" => self.cmd_store(cmd, args, false),
            "GET" => self.cmd_get(args),
            "CHECK" => self.cmd_check(args),
            "DELETE" | "DEL" => self.cmd_delete(args),
            "APPEND" => self.cmd_concat(cmd, args, true),
            "PREPEND" => self.cmd_concat(cmd, args, false),
            "INCR" => self.cmd_arithmetic(cmd, args, true),
            "DECR" => self.cmd_arithmetic(cmd, args, false),
            "FLUSH" => self.cmd_flush(args),

            // Clock and maintenance
            "DELAY" => self.cmd_delay(args),
            "NOW" => Reply::Integer(self.engine.now()),
            "RECLAIM" => Reply::Integer(self.engine.reclaim_expired()),
            "STATS" => self.cmd_stats(),
            "HELP" => Reply::Info(HELP.to_string()),
            "QUIT" | "EXIT" => Reply::Quit,

            _ => Reply::error(UNKNOWN_COMMAND, format!("unknown command '{}'", cmd)),
        }
    }

    // ========================================================================
    // Helper functions
    // ========================================================================

    fn arity(cmd: &str) -> Reply {
        Reply::usage(format!("wrong number of arguments for '{}'", cmd))
    }

    fn parse_u64(arg: &str, what: &str) -> Result<u64, Reply> {
        arg.parse::<u64>()
            .map_err(|_| Reply::usage(format!("invalid {} '{}'", what, arg)))
    }

    /// Turns an optional relative TTL argument into an absolute expiry.
    fn expiry(&self, ttl: Option<&str>) -> Result<Expiry, Reply> {
        match ttl {
            None => Ok(Expiry::Never),
            Some(arg) => Ok(Expiry::after(self.engine.now(), Self::parse_u64(arg, "ttl")?)),
        }
    }

    fn key(arg: &str) -> Bytes {
        Bytes::copy_from_slice(arg.as_bytes())
    }

    // ========================================================================
    // Item Commands
    // ========================================================================

    /// ADD key value [ttl] / SET key value [ttl]
    fn cmd_store(&self, cmd: &str, args: &[&str], only_if_absent: bool) -> Reply {
        if args.len() < 2 || args.len() > 3 {
            return Self::arity(cmd);
        }

        let expiry = match self.expiry(args.get(2).copied()) {
            Ok(e) => e,
            Err(reply) => return reply,
        };
        let key = Self::key(args[0]);
        let value = Bytes::copy_from_slice(args[1].as_bytes());

        let result = if only_if_absent {
            self.engine.add(key, value, expiry)
        } else {
            self.engine.set(key, value, expiry)
        };

        match result {
            Ok(()) => Reply::Ok,
            Err(e) => e.into(),
        }
    }

    /// GET key
    fn cmd_get(&self, args: &[&str]) -> Reply {
        if args.len() != 1 {
            return Self::arity("GET");
        }

        match self.engine.get(args[0].as_bytes()) {
            Ok(value) => Reply::Value(value),
            Err(e) => e.into(),
        }
    }

    /// CHECK key expected
    fn cmd_check(&self, args: &[&str]) -> Reply {
        if args.len() != 2 {
            return Self::arity("CHECK");
        }

        match self.engine.check_value(args[0].as_bytes(), args[1].as_bytes()) {
            Ok(()) => Reply::Ok,
            Err(e) => e.into(),
        }
    }

    /// DELETE key
    fn cmd_delete(&self, args: &[&str]) -> Reply {
        if args.len() != 1 {
            return Self::arity("DELETE");
        }

        match self.engine.delete(&Self::key(args[0])) {
            Ok(()) => Reply::Ok,
            Err(e) => e.into(),
        }
    }

    /// APPEND key suffix / PREPEND key prefix
    fn cmd_concat(&self, cmd: &str, args: &[&str], append: bool) -> Reply {
        if args.len() != 2 {
            return Self::arity(cmd);
        }

        let key = Self::key(args[0]);
        let result = if append {
            self.engine.append(&key, args[1].as_bytes())
        } else {
            self.engine.prepend(&key, args[1].as_bytes())
        };

        match result {
            Ok(len) => Reply::Integer(len as u64),
            Err(e) => e.into(),
        }
    }

    /// INCR key [delta] [initial [ttl]] / DECR key [delta] [initial [ttl]]
    fn cmd_arithmetic(&self, cmd: &str, args: &[&str], up: bool) -> Reply {
        if args.is_empty() || args.len() > 4 {
            return Self::arity(cmd);
        }

        let key = Self::key(args[0]);
        let delta = match args.get(1).map(|a| Self::parse_u64(a, "delta")) {
            None => 1,
            Some(Ok(d)) => d,
            Some(Err(reply)) => return reply,
        };
        let initial = match args.get(2).map(|a| Self::parse_u64(a, "initial value")) {
            None => None,
            Some(Ok(i)) => Some(i),
            Some(Err(reply)) => return reply,
        };

        let result = match initial {
            None => {
                if up {
                    self.engine.incr(&key, delta)
                } else {
                    self.engine.decr(&key, delta)
                }
            }
            Some(initial) => {
                let expiry = match self.expiry(args.get(3).copied()) {
                    Ok(e) => e,
                    Err(reply) => return reply,
                };
                if up {
                    self.engine.incr_with_default(&key, delta, initial, expiry)
                } else {
                    self.engine.decr_with_default(&key, delta, initial, expiry)
                }
            }
        };

        match result {
            Ok(n) => Reply::Integer(n),
            Err(e) => e.into(),
        }
    }

    /// FLUSH
    fn cmd_flush(&self, args: &[&str]) -> Reply {
        if !args.is_empty() {
            return Self::arity("FLUSH");
        }
        self.engine.flush();
        Reply::Ok
    }

    // ========================================================================
    // Clock and Maintenance Commands
    // ========================================================================

    /// DELAY seconds
    ///
    /// Parsed as a signed number so a negative request reaches the engine
    /// and is rejected there.
    fn cmd_delay(&self, args: &[&str]) -> Reply {
        if args.len() != 1 {
            return Self::arity("DELAY");
        }

        let seconds = match args[0].parse::<i64>() {
            Ok(s) => s,
            Err(_) => return Reply::usage(format!("invalid duration '{}'", args[0])),
        };

        match self.engine.advance_clock(seconds) {
            Ok(now) => Reply::Integer(now),
            Err(e) => e.into(),
        }
    }

    /// STATS
    fn cmd_stats(&self) -> Reply {
        let stats = self.engine.stats();
        let mut info = String::new();

        let fields: [(&str, u64); 13] = [
            ("now", stats.now),
            ("entries", stats.entries),
            ("live_entries", stats.live_entries),
            ("generation", stats.generation),
            ("adds", stats.adds),
            ("add_conflicts", stats.add_conflicts),
            ("sets", stats.sets),
            ("gets", stats.gets),
            ("get_misses", stats.get_misses),
            ("deletes", stats.deletes),
            ("arithmetic", stats.arithmetic),
            ("reclaimed", stats.reclaimed),
            ("clock_advances", stats.clock_advances),
        ];
        for (name, value) in fields {
            let _ = writeln!(info, "{}:{}", name, value);
        }

        Reply::Info(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ErrorKind;

    fn create_handler() -> CommandHandler {
        CommandHandler::new(Arc::new(Engine::with_manual_clock()))
    }

    fn run(handler: &CommandHandler, line: &str) -> Reply {
        handler.execute(line).unwrap()
    }

    fn kind(reply: &Reply) -> Option<&str> {
        reply.error_kind()
    }

    #[test]
    fn test_add_add_delay_add() {
        let handler = create_handler();

        assert_eq!(run(&handler, "add testkey 0 2"), Reply::Ok);
        assert_eq!(
            kind(&run(&handler, "add testkey 0 2")),
            Some(ErrorKind::KeyExists.as_str())
        );
        assert_eq!(run(&handler, "delay 3"), Reply::Integer(3));
        assert_eq!(run(&handler, "add testkey 0 2"), Reply::Ok);
        assert_eq!(run(&handler, "check testkey 0"), Reply::Ok);
    }

    #[test]
    fn test_blank_and_comment_lines() {
        let handler = create_handler();
        assert_eq!(handler.execute(""), None);
        assert_eq!(handler.execute("   "), None);
        assert_eq!(handler.execute("# a comment"), None);
    }

    #[test]
    fn test_set_get_case_insensitive() {
        let handler = create_handler();
        assert_eq!(run(&handler, "SET name lapse"), Reply::Ok);
        assert_eq!(run(&handler, "Get name"), Reply::value(Bytes::from("lapse")));
    }

    #[test]
    fn test_get_missing() {
        let handler = create_handler();
        assert_eq!(
            kind(&run(&handler, "get missing")),
            Some(ErrorKind::NotFound.as_str())
        );
    }

    #[test]
    fn test_check_mismatch() {
        let handler = create_handler();
        run(&handler, "set k 1");
        assert_eq!(
            kind(&run(&handler, "check k 0")),
            Some(ErrorKind::Mismatch.as_str())
        );
    }

    #[test]
    fn test_delete() {
        let handler = create_handler();
        run(&handler, "set k v");
        assert_eq!(run(&handler, "delete k"), Reply::Ok);
        assert_eq!(
            kind(&run(&handler, "del k")),
            Some(ErrorKind::NotFound.as_str())
        );
    }

    #[test]
    fn test_append_prepend() {
        let handler = create_handler();
        run(&handler, "set k 0");
        assert_eq!(run(&handler, "append k -suffix"), Reply::Integer(8));
        assert_eq!(run(&handler, "prepend k prefix-"), Reply::Integer(15));
        assert_eq!(run(&handler, "get k"), Reply::value(Bytes::from("prefix-0-suffix")));
    }

    #[test]
    fn test_arithmetic() {
        let handler = create_handler();
        assert_eq!(
            kind(&run(&handler, "incr n")),
            Some(ErrorKind::NotFound.as_str())
        );
        assert_eq!(run(&handler, "incr n 1 10"), Reply::Integer(10));
        assert_eq!(run(&handler, "incr n 5"), Reply::Integer(15));
        assert_eq!(run(&handler, "decr n 20"), Reply::Integer(0));

        // Counter created with a TTL disappears after it
        assert_eq!(run(&handler, "decr m 1 7 2"), Reply::Integer(7));
        run(&handler, "delay 2");
        assert_eq!(
            kind(&run(&handler, "get m")),
            Some(ErrorKind::NotFound.as_str())
        );
    }

    #[test]
    fn test_negative_delay() {
        let handler = create_handler();
        assert_eq!(
            kind(&run(&handler, "delay -1")),
            Some(ErrorKind::InvalidArgument.as_str())
        );
        assert_eq!(run(&handler, "now"), Reply::Integer(0));
    }

    #[test]
    fn test_usage_errors() {
        let handler = create_handler();
        for line in ["get", "add k", "set k v 1 2", "check k", "delay", "delay soon", "incr k x", "flush now"] {
            assert_eq!(kind(&run(&handler, line)), Some("usage"), "line: {}", line);
        }
        assert_eq!(kind(&run(&handler, "frobnicate")), Some("unknown_command"));
    }

    #[test]
    fn test_flush_and_reclaim() {
        let handler = create_handler();
        run(&handler, "set a 1 1");
        run(&handler, "set b 1 1");
        run(&handler, "set c 1");

        run(&handler, "delay 1");
        assert_eq!(run(&handler, "reclaim"), Reply::Integer(2));
        assert_eq!(run(&handler, "flush"), Reply::Ok);
        assert_eq!(
            kind(&run(&handler, "get c")),
            Some(ErrorKind::NotFound.as_str())
        );
    }

    #[test]
    fn test_stats_and_help() {
        let handler = create_handler();
        run(&handler, "add k v");
        run(&handler, "add k v");

        let stats = run(&handler, "stats").to_string();
        assert!(stats.contains("adds:2"));
        assert!(stats.contains("add_conflicts:1"));

        assert!(run(&handler, "help").to_string().contains("ADD key value [ttl]"));
        assert_eq!(run(&handler, "quit"), Reply::Quit);
    }
}
