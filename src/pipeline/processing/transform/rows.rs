use crate::domain::Record;

/// Records in flight through the stages, each tagged with its position in the
/// input batch so coercion errors point at the row the caller sent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rows {
    records: Vec<Record>,
    origins: Vec<usize>,
}

impl Rows {
    pub fn new(records: Vec<Record>) -> Self {
        let origins = (0..records.len()).collect();
        Self { records, origins }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut [Record] {
        &mut self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Record)> {
        self.origins.iter().copied().zip(self.records.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, &mut Record)> {
        self.origins.iter().copied().zip(self.records.iter_mut())
    }

    pub fn origins(&self) -> &[usize] {
        &self.origins
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Keeps the rows whose flag is set; missing flags keep the row. Returns
    /// the number of rows removed.
    pub fn retain_flagged(&mut self, keep: Vec<bool>) -> usize {
        let before = self.records.len();
        let mut flags = keep.iter().copied();
        self.records.retain(|_| flags.next().unwrap_or(true));
        let mut flags = keep.iter().copied();
        self.origins.retain(|_| flags.next().unwrap_or(true));
        before - self.records.len()
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

impl From<Vec<Record>> for Rows {
    fn from(records: Vec<Record>) -> Self {
        Self::new(records)
    }
}
