//! CSV loader for the raw transaction dataset

use std::fs::File;
use std::path::Path;

use super::{DatasetError, LabeledDataset};
use crate::logic::features::FeatureLayout;

/// Load a labeled dataset.
///
/// The header defines the feature layout: every column except
/// `label_column`, in file order.
pub fn load_csv(path: &Path, label_column: &str) -> Result<LabeledDataset, DatasetError> {
    if !path.exists() {
        return Err(DatasetError::NotFound(path.to_path_buf()));
    }

    let file = File::open(path).map_err(csv::Error::from)?;
    let mut rdr = csv::Reader::from_reader(file);

    let headers = rdr.headers()?.clone();
    let label_idx = headers
        .iter()
        .position(|h| h == label_column)
        .ok_or_else(|| DatasetError::MissingLabelColumn(label_column.to_string()))?;

    let names: Vec<String> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != label_idx)
        .map(|(_, h)| h.to_string())
        .collect();
    let layout = FeatureLayout::new(names)?;

    let mut rows = Vec::new();
    let mut labels = Vec::new();

    for (row_idx, record) in rdr.records().enumerate() {
        let record = record?;
        let mut row = Vec::with_capacity(layout.len());
        let mut label = None;

        for (col_idx, cell) in record.iter().enumerate() {
            let column = || headers.get(col_idx).unwrap_or_default().to_string();
            let value: f64 = cell.trim().parse().map_err(|_| DatasetError::NotNumeric {
                row: row_idx,
                column: column(),
                value: cell.to_string(),
            })?;
            // "NaN" and "inf" parse as f64
            if !value.is_finite() {
                return Err(DatasetError::NonFinite {
                    row: row_idx,
                    column: column(),
                    value: cell.to_string(),
                });
            }

            if col_idx == label_idx {
                label = Some(value);
            } else {
                row.push(value);
            }
        }

        let label = match label {
            Some(v) if v == 0.0 => 0,
            Some(v) if v == 1.0 => 1,
            Some(v) => return Err(DatasetError::InvalidLabel { row: row_idx, value: v }),
            None => return Err(DatasetError::MissingLabelColumn(label_column.to_string())),
        };

        rows.push(row);
        labels.push(label);
    }

    if rows.is_empty() {
        return Err(DatasetError::Empty);
    }

    log::info!(
        "Loaded {} rows x {} features from {}",
        rows.len(),
        layout.len(),
        path.display()
    );

    LabeledDataset::new(layout, rows, labels)
}
