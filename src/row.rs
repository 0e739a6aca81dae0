//! Row and cell primitives
//!
//! A row is an ordered, mutable sequence of cells. Each cell is either text
//! or absent; an empty string is a valid present cell distinct from absent.
//! Decoding consumes cells from the front, encoding appends cells to the
//! back, and before-decode hooks may prepend. Tokenizing delimited text
//! into rows (and back) belongs to an external reader/writer.
//!
//! A row is exclusively owned by one decode or encode call for its duration;
//! composite schemas pass the same row down the recursion by reference.

use std::collections::VecDeque;

/// One slot in a row: text, or absent.
pub type Cell = Option<String>;

/// An ordered, mutable sequence of cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    cells: VecDeque<Cell>,
}

impl Row {
    /// Creates an empty row.
    pub fn new() -> Row {
        Row::default()
    }

    /// Consumes the leading cell.
    ///
    /// Returns `None` both for an absent leading cell and for an exhausted
    /// row; decoding treats the two identically.
    pub fn take(&mut self) -> Option<String> {
        self.cells.pop_front().flatten()
    }

    /// Appends a cell to the back.
    pub fn push(&mut self, cell: Cell) {
        self.cells.push_back(cell);
    }

    /// Appends a present text cell to the back.
    pub fn push_text(&mut self, text: impl Into<String>) {
        self.cells.push_back(Some(text.into()));
    }

    /// Prepends a cell to the front.
    pub fn push_front(&mut self, cell: Cell) {
        self.cells.push_front(cell);
    }

    /// Moves every cell of `other` onto the back of this row.
    pub fn append(&mut self, other: Row) {
        self.cells.extend(other.cells);
    }

    /// Number of cells currently in the row.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the row holds no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Borrows the cell at `index`, front first.
    pub fn get(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    /// Mutably borrows the cell at `index`; used by after-encode hooks to
    /// post-process emitted cells in place.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Cell> {
        self.cells.get_mut(index)
    }

    /// Iterates the cells front to back.
    pub fn iter(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }
}

impl FromIterator<Cell> for Row {
    fn from_iter<I: IntoIterator<Item = Cell>>(iter: I) -> Row {
        Row {
            cells: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Row {
    type Item = Cell;
    type IntoIter = std::collections::vec_deque::IntoIter<Cell>;

    fn into_iter(self) -> Self::IntoIter {
        self.cells.into_iter()
    }
}

impl<'a> FromIterator<Option<&'a str>> for Row {
    fn from_iter<I: IntoIterator<Item = Option<&'a str>>>(iter: I) -> Row {
        iter.into_iter()
            .map(|cell| cell.map(str::to_string))
            .collect()
    }
}
