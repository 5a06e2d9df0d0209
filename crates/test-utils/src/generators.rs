//! Value and timestamp generators behind the synthetic documents.

/// Value of a grid cell: `col * 1000 + row`.
///
/// Reading a value back tells which cell it came from, so a transposed
/// or flipped raster shows up as wrong numbers rather than a wrong sum.
pub fn grid_cell_value(row: usize, col: usize) -> f64 {
    (col * 1000 + row) as f64
}

/// One `rows × cols` plane of [`grid_cell_value`]s in row-major order.
pub fn cell_plane(cols: usize, rows: usize) -> Vec<f64> {
    (0..rows)
        .flat_map(|row| (0..cols).map(move |col| grid_cell_value(row, col)))
        .collect()
}

/// ISO 8601 timestamps, one hour apart, starting at 2024-01-15T00:00:00Z.
pub fn hourly_times(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| format!("2024-01-{:02}T{:02}:00:00Z", 15 + i / 24, i % 24))
        .collect()
}
