//! Plain comma-separated writers for the run curves and the confusion matrix.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{MelError, Result};
use crate::math::matrix::Matrix;

fn write_lines<I>(path: &Path, lines: I) -> Result<()>
where
    I: IntoIterator<Item = String>,
{
    let file = File::create(path).map_err(|e| MelError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    for line in lines {
        writeln!(writer, "{}", line).map_err(|e| MelError::io(path, e))?;
    }
    writer.flush().map_err(|e| MelError::io(path, e))
}

/// `acc.csv`: header then one `train,val,lr` row per epoch.
pub fn write_acc_csv(path: &Path, tra_acc: &[f64], val_acc: &[f64], lr: &[f64]) -> Result<()> {
    let header = std::iter::once("tra_acc_list,val_acc_list,lr_list".to_string());
    let rows = tra_acc.iter().zip(val_acc).zip(lr)
        .map(|((t, v), l)| format!("{},{},{}", t, v, l));
    write_lines(path, header.chain(rows))
}

/// `loss.csv`: header then one recorded running-loss sample per row.
pub fn write_loss_csv(path: &Path, loss: &[f64]) -> Result<()> {
    let header = std::iter::once("loss_list".to_string());
    write_lines(path, header.chain(loss.iter().map(|l| l.to_string())))
}

/// `mat.csv`: one comma-separated row per matrix row, no header.
pub fn write_matrix_csv(path: &Path, matrix: &Matrix) -> Result<()> {
    let rows = (0..matrix.rows).map(|r| {
        matrix.row(r).iter().map(|v| v.to_string()).collect::<Vec<_>>().join(",")
    });
    write_lines(path, rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acc_csv_has_header_and_one_row_per_epoch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("acc.csv");
        write_acc_csv(&path, &[50.0, 75.0], &[40.0, 60.5], &[0.001, 0.0001]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["tra_acc_list,val_acc_list,lr_list", "50,40,0.001", "75,60.5,0.0001"]);
    }

    #[test]
    fn matrix_csv_round_trips_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mat.csv");
        let m = Matrix::from_vec(2, 2, vec![0.25, 0.125, 0.0, 0.625]);
        write_matrix_csv(&path, &m).unwrap();
        let parsed: Vec<f64> = std::fs::read_to_string(&path).unwrap()
            .lines()
            .flat_map(|l| l.split(',').map(|c| c.parse::<f64>().unwrap()).collect::<Vec<_>>())
            .collect();
        assert_eq!(parsed, m.data);
    }
}
