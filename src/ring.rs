
use anyhow::{Result, ensure};

/// Circular buffer of intermediate image rows.
///
/// Rows are addressed by their absolute intermediate row index, which may be
/// negative during pre-fill; the ring maps any index onto one of `rows`
/// slots. The caller is responsible for the recycling discipline: a slot is
/// valid for index `r` until index `r + rows` is written over it.
#[derive(Debug)]
pub struct RowRing {
    rows: usize,
    row_len: usize,
    data: Vec<u8>,
}

impl RowRing {
    pub fn new(rows: usize, row_len: usize) -> Result<Self> {
        ensure!(rows > 0 && row_len > 0, "empty ring ({rows}x{row_len})");
        let len = rows * row_len;
        let mut data = Vec::new();
        data.try_reserve_exact(len)?;
        data.resize(len, 0);
        Ok(Self {
            rows,
            row_len,
            data,
        })
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn row_len(&self) -> usize {
        self.row_len
    }

    /// Slot index an absolute row maps to.
    #[must_use]
    pub fn slot(&self, abs_row: i64) -> usize {
        abs_row.rem_euclid(self.rows as i64) as usize
    }

    #[must_use]
    pub fn row(&self, abs_row: i64) -> &[u8] {
        let slot = self.slot(abs_row);
        &self.data[slot * self.row_len..][..self.row_len]
    }

    #[must_use]
    pub fn row_mut(&mut self, abs_row: i64) -> &mut [u8] {
        let slot = self.slot(abs_row);
        &mut self.data[slot * self.row_len..][..self.row_len]
    }
}
