//! C4: the ordered (prefix, callback) table the dispatcher consults for
//! every framed line (spec.md §4.3).
//!
//! Rendered as a small bounded array with append/prepend/remove-by-key —
//! the idiomatic Rust shape design note in spec.md §9 asks for in place of
//! a fixed-size C array of function pointers — rather than `heapless::Vec`,
//! because URC registration needs to *prepend*, which shifts every other
//! entry one slot to the right; writing that by hand over a plain array
//! keeps the ordering guarantees (spec.md: "matching is first-hit, so
//! entries inserted at the front take precedence") obvious at the call
//! site instead of hidden behind a generic collection method.

use crate::config::MAX_HANDLERS;
use crate::error::{Error, Result};

/// A line handler. Invoked by the dispatcher with the bytes following the
/// matched prefix, leading SP/HT already skipped (spec.md §4.2). Never
/// called while `handler-mutex` is held (spec.md §4.2, §9).
pub trait LineHandler {
    fn on_line(&self, rest: &[u8]);
}

/// What a matched entry invokes. `SrMatched` is the crate-internal sentinel
/// `send_receive` installs for its expected-reply prefix (spec.md §4.4's
/// "sr-callback"); it carries no data because signaling `sr-matched` is its
/// entire job, so there's no borrowed callback object to store.
#[derive(Clone, Copy)]
pub(crate) enum Callback<'a> {
    External(&'a dyn LineHandler),
    SrMatched,
}

struct Entry<'a> {
    prefix: &'a [u8],
    callback: Callback<'a>,
}

pub struct HandlerTable<'a> {
    entries: [Option<Entry<'a>>; MAX_HANDLERS],
    len: usize,
}

impl<'a> HandlerTable<'a> {
    pub const fn new() -> Self {
        const NONE: Option<Entry<'static>> = None;
        Self {
            entries: [NONE; MAX_HANDLERS],
            len: 0,
        }
    }

    fn index_of(&self, prefix: &[u8]) -> Option<usize> {
        self.entries[..self.len]
            .iter()
            .position(|e| e.as_ref().unwrap().prefix == prefix)
    }

    fn remove_at(&mut self, index: usize) {
        for i in index..self.len - 1 {
            self.entries[i] = self.entries[i + 1].take();
        }
        self.entries[self.len - 1] = None;
        self.len -= 1;
    }

    /// Register an ordinary handler. Updates the callback in place if
    /// `prefix` is already registered (by either `register` or
    /// `register_urc`); otherwise appends, so earlier registrations keep
    /// priority over later ones among ordinary handlers.
    pub fn register(&mut self, prefix: &'a [u8], callback: &'a dyn LineHandler) -> Result<()> {
        self.register_callback(prefix, Callback::External(callback))
    }

    /// Register an unsolicited-result-code handler: removes any existing
    /// entry for `prefix` first, then inserts at index 0 so URCs always
    /// win ties against ordinary handlers (spec.md §4.3).
    pub fn register_urc(&mut self, prefix: &'a [u8], callback: &'a dyn LineHandler) -> Result<()> {
        self.register_urc_callback(prefix, Callback::External(callback))
    }

    pub(crate) fn register_callback(&mut self, prefix: &'a [u8], callback: Callback<'a>) -> Result<()> {
        if prefix.is_empty() {
            return Err(Error::InvalidArg);
        }
        if let Some(i) = self.index_of(prefix) {
            self.entries[i] = Some(Entry { prefix, callback });
            return Ok(());
        }
        if self.len == MAX_HANDLERS {
            return Err(Error::Resource);
        }
        self.entries[self.len] = Some(Entry { prefix, callback });
        self.len += 1;
        Ok(())
    }

    pub(crate) fn register_urc_callback(&mut self, prefix: &'a [u8], callback: Callback<'a>) -> Result<()> {
        if prefix.is_empty() {
            return Err(Error::InvalidArg);
        }
        if let Some(i) = self.index_of(prefix) {
            self.remove_at(i);
        }
        if self.len == MAX_HANDLERS {
            return Err(Error::Resource);
        }
        for i in (0..self.len).rev() {
            self.entries[i + 1] = self.entries[i].take();
        }
        self.entries[0] = Some(Entry { prefix, callback });
        self.len += 1;
        Ok(())
    }

    /// Remove the entry for `prefix`. `Err(Error::NotFound)` if absent.
    pub fn unregister(&mut self, prefix: &[u8]) -> Result<()> {
        if prefix.is_empty() {
            return Err(Error::InvalidArg);
        }
        match self.index_of(prefix) {
            Some(i) => {
                self.remove_at(i);
                Ok(())
            }
            None => Err(Error::NotFound),
        }
    }

    /// First-hit scan: the earliest entry whose prefix is a byte-exact
    /// start of `line`, plus the length of that prefix so the caller can
    /// skip past it. `None` if nothing matches.
    pub(crate) fn find(&self, line: &[u8]) -> Option<(usize, Callback<'a>)> {
        for entry in self.entries[..self.len].iter().flatten() {
            if line.len() >= entry.prefix.len() && &line[..entry.prefix.len()] == entry.prefix {
                return Some((entry.prefix.len(), entry.callback));
            }
        }
        None
    }
}

impl<'a> Default for HandlerTable<'a> {
    fn default() -> Self {
        Self::new()
    }
}
