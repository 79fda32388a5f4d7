//! Row indexes.

use serde_json::Value;

use super::label::Label;
use super::series::Series;
use super::TableError;

/// A row index made of several levels of equal length.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiLevelIndex {
    levels: Vec<Series>,
}

impl MultiLevelIndex {
    /// Builds a multi-level index from its level series.
    ///
    /// Each level's name becomes the level name.
    ///
    /// # Errors
    ///
    /// Returns an error if no level is given or the levels differ in length.
    pub fn from_levels(levels: Vec<Series>) -> Result<Self, TableError> {
        let Some(first) = levels.first() else {
            return Err(TableError::EmptyMultiIndex);
        };
        let expected = first.len();
        for (position, level) in levels.iter().enumerate() {
            if level.len() != expected {
                return Err(TableError::LengthMismatch {
                    what: format!("index level {}", position),
                    expected,
                    got: level.len(),
                });
            }
        }
        Ok(Self { levels })
    }

    /// Builds a multi-level index from `(name, values)` pairs.
    pub fn from_arrays<I>(arrays: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = (Option<Label>, Vec<Value>)>,
    {
        Self::from_levels(
            arrays
                .into_iter()
                .map(|(name, values)| Series::from_parts(name, values))
                .collect(),
        )
    }

    /// Replaces the levels without re-checking lengths.
    pub(crate) fn with_levels(levels: Vec<Series>) -> Self {
        Self { levels }
    }

    /// Returns the levels in position order.
    pub fn levels(&self) -> &[Series] {
        &self.levels
    }

    /// Returns the level at `position`.
    pub fn level(&self, position: usize) -> Option<&Series> {
        self.levels.get(position)
    }

    /// Returns the level names, `None` for unnamed levels.
    pub fn names(&self) -> Vec<Option<Label>> {
        self.levels.iter().map(|l| l.name().cloned()).collect()
    }

    /// Returns the number of levels.
    pub fn nlevels(&self) -> usize {
        self.levels.len()
    }

    /// Returns the number of rows.
    pub fn len(&self) -> usize {
        self.levels.first().map_or(0, Series::len)
    }

    /// Returns true if the index has no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The row index of a table.
#[derive(Debug, Clone, PartialEq)]
pub enum RowIndex {
    /// A single-level index.
    Single(Series),
    /// A multi-level index.
    Multi(MultiLevelIndex),
}

impl RowIndex {
    /// An unnamed integer index `0..len`.
    pub fn range(len: usize) -> Self {
        RowIndex::Single(Series::unnamed((0..len).map(Value::from).collect()))
    }

    /// Returns the number of rows.
    pub fn len(&self) -> usize {
        match self {
            RowIndex::Single(series) => series.len(),
            RowIndex::Multi(index) => index.len(),
        }
    }

    /// Returns true if the index has no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true for a multi-level index.
    pub fn is_multi(&self) -> bool {
        matches!(self, RowIndex::Multi(_))
    }

    /// Views this index as levels; a single-level index is one level.
    pub fn to_levels(&self) -> MultiLevelIndex {
        match self {
            RowIndex::Single(series) => MultiLevelIndex::with_levels(vec![series.clone()]),
            RowIndex::Multi(index) => index.clone(),
        }
    }
}

impl From<Series> for RowIndex {
    fn from(series: Series) -> Self {
        RowIndex::Single(series)
    }
}

impl From<MultiLevelIndex> for RowIndex {
    fn from(index: MultiLevelIndex) -> Self {
        RowIndex::Multi(index)
    }
}
