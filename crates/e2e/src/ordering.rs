//! Sort-order checks for table columns

use crate::error::{E2eError, E2eResult};

/// True when every element is `>=` its predecessor
pub fn is_sorted_ascending<T: PartialOrd>(values: &[T]) -> bool {
    values.windows(2).all(|pair| pair[0] <= pair[1])
}

/// Check cell texts are ascending, numerically or lexically
pub fn check_column_sorted(cells: &[String], numeric: bool) -> E2eResult<()> {
    let sorted = if numeric {
        let numbers = cells
            .iter()
            .map(|cell| {
                cell.trim().parse::<f64>().map_err(|_| {
                    E2eError::AssertionFailed(format!("cell '{}' is not a number", cell))
                })
            })
            .collect::<E2eResult<Vec<f64>>>()?;
        is_sorted_ascending(&numbers)
    } else {
        let texts: Vec<&str> = cells.iter().map(|c| c.trim()).collect();
        is_sorted_ascending(&texts)
    };

    if sorted {
        Ok(())
    } else {
        Err(E2eError::AssertionFailed(format!(
            "column is not in ascending order: {:?}",
            cells
        )))
    }
}

/// Check a fixed list of numbers is ascending
pub fn check_values_sorted(values: &[f64]) -> E2eResult<()> {
    if is_sorted_ascending(values) {
        Ok(())
    } else {
        Err(E2eError::AssertionFailed(format!(
            "values are not in ascending order: {:?}",
            values
        )))
    }
}
