use std::fmt;
use std::ops;

use itertools::Itertools;

use crate::force::Force;


pub const NUM_ROWS: i8 = 8;
pub const NUM_COLS: i8 = 8;


// Row form a force's point of view
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct SubjectiveRow {
    idx: i8, // 0-based
}

impl SubjectiveRow {
    pub const fn from_one_based(idx: i8) -> Self {
        assert!(idx >= 1 && idx <= NUM_ROWS);
        Self { idx: idx - 1 }
    }
    pub const fn first() -> Self { Self::from_one_based(1) }
    pub const fn last() -> Self { Self::from_one_based(NUM_ROWS) }
    pub fn to_row(self, force: Force) -> Row {
        match force {
            Force::White => Row::from_zero_based(self.idx),
            Force::Black => Row::from_zero_based(NUM_ROWS - self.idx - 1),
        }
    }
}


#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Row {
    idx: i8, // 0-based
}

impl Row {
    pub const fn from_zero_based(idx: i8) -> Self {
        assert!(idx >= 0 && idx < NUM_ROWS);
        Self { idx }
    }
    pub fn from_algebraic(ch: char) -> Option<Self> {
        let idx = (ch as i32) - ('1' as i32);
        (0..NUM_ROWS as i32).contains(&idx).then(|| Self::from_zero_based(idx as i8))
    }
    pub const fn to_zero_based(self) -> i8 { self.idx }
    pub const fn to_algebraic(self) -> char { (self.idx as u8 + b'1') as char }
    pub fn all() -> impl DoubleEndedIterator<Item = Self> + Clone {
        (0..NUM_ROWS).map(Self::from_zero_based)
    }
}

impl ops::Sub for Row {
    type Output = i8;
    fn sub(self, other: Self) -> Self::Output { self.idx - other.idx }
}


#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Col {
    idx: i8, // 0-based
}

impl Col {
    pub const fn from_zero_based(idx: i8) -> Self {
        assert!(idx >= 0 && idx < NUM_COLS);
        Self { idx }
    }
    pub fn from_algebraic(ch: char) -> Option<Self> {
        let idx = (ch.to_ascii_lowercase() as i32) - ('a' as i32);
        (0..NUM_COLS as i32).contains(&idx).then(|| Self::from_zero_based(idx as i8))
    }
    pub const fn to_zero_based(self) -> i8 { self.idx }
    pub const fn to_algebraic(self) -> char { (self.idx as u8 + b'a') as char }
    pub fn all() -> impl DoubleEndedIterator<Item = Self> + Clone {
        (0..NUM_COLS).map(Self::from_zero_based)
    }

    pub const A: Col = Col::from_zero_based(0);
    pub const C: Col = Col::from_zero_based(2);
    pub const D: Col = Col::from_zero_based(3);
    pub const E: Col = Col::from_zero_based(4);
    pub const F: Col = Col::from_zero_based(5);
    pub const G: Col = Col::from_zero_based(6);
    pub const H: Col = Col::from_zero_based(7);
}

impl ops::Sub for Col {
    type Output = i8;
    fn sub(self, other: Self) -> Self::Output { self.idx - other.idx }
}


#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Coord {
    pub row: Row,
    pub col: Col,
}

impl Coord {
    pub const fn new(row: Row, col: Col) -> Self { Self { row, col } }

    // Accepts "e4" as well as "E4". Returns `None` for anything that is not a square.
    pub fn from_algebraic(s: &str) -> Option<Self> {
        let (col, row) = s.trim().chars().collect_tuple()?;
        Some(Coord::new(Row::from_algebraic(row)?, Col::from_algebraic(col)?))
    }
    pub fn to_algebraic(self) -> String {
        format!("{}{}", self.col.to_algebraic(), self.row.to_algebraic())
    }

    pub fn all() -> impl Iterator<Item = Coord> {
        Row::all().cartesian_product(Col::all()).map(|(row, col)| Coord { row, col })
    }

    // Shifts the coord by (rows, cols). Returns `None` when the result leaves the board.
    pub fn offset(self, (d_row, d_col): (i8, i8)) -> Option<Coord> {
        let row = self.row.to_zero_based() + d_row;
        let col = self.col.to_zero_based() + d_col;
        if (0..NUM_ROWS).contains(&row) && (0..NUM_COLS).contains(&col) {
            Some(Coord::new(Row::from_zero_based(row), Col::from_zero_based(col)))
        } else {
            None
        }
    }
}

impl ops::Sub for Coord {
    type Output = (i8, i8);
    fn sub(self, other: Self) -> Self::Output { (self.row - other.row, self.col - other.col) }
}

impl fmt::Debug for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Coord({})", self.to_algebraic())
    }
}
