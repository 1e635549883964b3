//! Per-receiver pagination over selectable lists.
//!
//! A receiver is either idle (no cursor) or listing (one cursor). [`CursorMap::open_list`]
//! replaces any previous cursor for the receiver. Cursors never expire and live only in
//! process memory.

use std::collections::HashMap;

use alertbot_routing::ReceiverId;
use parking_lot::Mutex;

use crate::error::{NotifyError, Result};

/// Default number of items per page.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Position in a paged list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor<T> {
    items: Vec<T>,
    page_size: usize,
    page: usize,
}

impl<T> Cursor<T> {
    /// Creates a cursor on the first page. A zero page size is treated as one.
    #[must_use]
    pub fn new(items: Vec<T>, page_size: usize) -> Self {
        Self {
            items,
            page_size: page_size.max(1),
            page: 0,
        }
    }

    /// Zero-based index of the current page.
    #[must_use]
    pub const fn page(&self) -> usize {
        self.page
    }

    /// Number of pages; an empty list has one empty page.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.items.len().div_ceil(self.page_size).max(1)
    }

    /// Items on the current page. The last page may be short.
    #[must_use]
    pub fn current_page_items(&self) -> &[T] {
        let start = (self.page * self.page_size).min(self.items.len());
        let end = (start + self.page_size).min(self.items.len());
        &self.items[start..end]
    }

    /// Returns true if a later page exists.
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.page + 1 < self.page_count()
    }

    /// Returns true if an earlier page exists.
    #[must_use]
    pub const fn has_prev(&self) -> bool {
        self.page > 0
    }

    /// Advances one page.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError::NoNextPage` on the last page.
    pub fn next(&mut self) -> Result<()> {
        if !self.has_next() {
            return Err(NotifyError::NoNextPage);
        }
        self.page += 1;
        Ok(())
    }

    /// Goes back one page.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError::NoPrevPage` on the first page.
    pub fn prev(&mut self) -> Result<()> {
        if !self.has_prev() {
            return Err(NotifyError::NoPrevPage);
        }
        self.page -= 1;
        Ok(())
    }
}

/// Copy of one page, taken while the cursor map was locked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Items on the page.
    pub items: Vec<T>,
    /// Zero-based page index.
    pub number: usize,
    /// Whether an earlier page exists.
    pub has_prev: bool,
    /// Whether a later page exists.
    pub has_next: bool,
}

impl<T: Clone> From<&Cursor<T>> for Page<T> {
    fn from(cursor: &Cursor<T>) -> Self {
        Self {
            items: cursor.current_page_items().to_vec(),
            number: cursor.page(),
            has_prev: cursor.has_prev(),
            has_next: cursor.has_next(),
        }
    }
}

/// Cursors of all receivers.
#[derive(Debug)]
pub struct CursorMap<T> {
    cursors: Mutex<HashMap<ReceiverId, Cursor<T>>>,
}

impl<T> Default for CursorMap<T> {
    fn default() -> Self {
        Self {
            cursors: Mutex::new(HashMap::new()),
        }
    }
}

impl<T: Clone> CursorMap<T> {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a list for `receiver` on its first page, replacing any previous one.
    pub fn open_list(&self, receiver: ReceiverId, items: Vec<T>, page_size: usize) -> Page<T> {
        let cursor = Cursor::new(items, page_size);
        let page = Page::from(&cursor);
        self.cursors.lock().insert(receiver, cursor);
        page
    }

    /// Returns the current page of `receiver`.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError::NoCursor` if no list is open.
    pub fn current(&self, receiver: ReceiverId) -> Result<Page<T>> {
        self.with_cursor(receiver, |cursor| Ok(Page::from(&*cursor)))
    }

    /// Advances `receiver` one page.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError::NoCursor` or `NotifyError::NoNextPage`.
    pub fn next(&self, receiver: ReceiverId) -> Result<Page<T>> {
        self.with_cursor(receiver, |cursor| {
            cursor.next()?;
            Ok(Page::from(&*cursor))
        })
    }

    /// Moves `receiver` back one page.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError::NoCursor` or `NotifyError::NoPrevPage`.
    pub fn prev(&self, receiver: ReceiverId) -> Result<Page<T>> {
        self.with_cursor(receiver, |cursor| {
            cursor.prev()?;
            Ok(Page::from(&*cursor))
        })
    }

    /// Drops the cursor of `receiver`. Returns false if none was open.
    pub fn close(&self, receiver: ReceiverId) -> bool {
        self.cursors.lock().remove(&receiver).is_some()
    }

    /// Number of open cursors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cursors.lock().len()
    }

    /// Returns true if no cursor is open.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cursors.lock().is_empty()
    }

    fn with_cursor<R>(
        &self,
        receiver: ReceiverId,
        f: impl FnOnce(&mut Cursor<T>) -> Result<R>,
    ) -> Result<R> {
        let mut cursors = self.cursors.lock();
        let cursor = cursors.get_mut(&receiver).ok_or_else(|| NotifyError::NoCursor {
            receiver: receiver.name(),
        })?;
        f(cursor)
    }
}
