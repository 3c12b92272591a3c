use std::ops::Range;

use cascade_error::{FunctionError, Result};

/// Partition boundaries shared by all columns of a frame.
///
/// Partition `p` holds the rows `offsets[p]..offsets[p + 1]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowLayout {
    offsets: Vec<u64>,
}

impl RowLayout {
    /// Create a layout from the number of rows in each partition.
    pub fn from_lengths(lengths: impl IntoIterator<Item = usize>) -> Self {
        let mut offsets = vec![0];
        let mut total = 0;
        for len in lengths {
            total += len as u64;
            offsets.push(total);
        }
        RowLayout { offsets }
    }

    /// Split `num_rows` into partitions of at most `chunk_rows` rows.
    ///
    /// A layout with zero rows has zero partitions.
    pub fn even(num_rows: u64, chunk_rows: usize) -> Result<Self> {
        if chunk_rows == 0 {
            return Err(FunctionError::runtime("Rows per chunk must be positive"));
        }

        let chunk_rows = chunk_rows as u64;
        let full = num_rows / chunk_rows;
        let rem = (num_rows % chunk_rows) as usize;

        let lengths = std::iter::repeat_n(chunk_rows as usize, full as usize)
            .chain((rem > 0).then_some(rem));

        Ok(Self::from_lengths(lengths))
    }

    pub fn num_partitions(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn num_rows(&self) -> u64 {
        self.offsets[self.offsets.len() - 1]
    }

    /// Global row range covered by a partition.
    pub fn partition_range(&self, partition: usize) -> Range<u64> {
        self.offsets[partition]..self.offsets[partition + 1]
    }

    pub fn partition_len(&self, partition: usize) -> usize {
        let range = self.partition_range(partition);
        (range.end - range.start) as usize
    }
}
