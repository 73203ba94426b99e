#[derive(Debug, thiserror::Error)]
pub enum VitalsError {
    #[error("patient dataset not found: {}", .0.display())]
    DatasetMissing(std::path::PathBuf),
    #[error("failed to read patient dataset: {0}")]
    DatasetRead(std::io::Error),
    #[error("malformed patient record on line {line}: {source}")]
    RecordParse {
        line: usize,
        source: serde_json::Error,
    },
    #[error("no patient records found in dataset")]
    EmptyDataset,
    #[error("vital index {index} out of range ({total} vital points per patient)")]
    InvalidIndex { index: usize, total: usize },
    #[error("patient {identifier} has no vital point at index {index}")]
    MissingVital { identifier: u64, index: usize },
    #[error("patient {identifier} is missing from the dataset")]
    MissingRecord { identifier: u64 },
    #[error("no snapshot saved yet")]
    NoSnapshot,
}

pub type VitalsResult<T> = std::result::Result<T, VitalsError>;
