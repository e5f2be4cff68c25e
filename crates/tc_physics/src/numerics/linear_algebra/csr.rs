// crates/tc_physics/src/numerics/linear_algebra/csr.rs

//! 压缩稀疏行（CSR）矩阵格式
//!
//! 输运方程离散后的系数矩阵以 CSR 存储：
//! - `row_ptr`: 行指针，长度 n_rows + 1
//! - `col_idx`: 列索引（每行升序）
//! - `values`: 非零元值
//!
//! 稀疏模式 [`CsrPattern`] 与值分离，组装器每个时间步只清零并重填值。
//! 行数超过 [`PARALLEL_THRESHOLD`] 时矩阵-向量乘法走 `rayon` 并行路径。

use rayon::prelude::*;
use std::collections::BTreeMap;

/// 并行 SpMV 行数阈值
pub const PARALLEL_THRESHOLD: usize = 4096;

// =============================================================================
// 稀疏模式
// =============================================================================

/// CSR 矩阵的稀疏模式
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrPattern {
    n_rows: usize,
    n_cols: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
}

impl CsrPattern {
    /// 行数
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// 列数
    #[inline]
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// 非零元数量
    #[inline]
    pub fn nnz(&self) -> usize {
        self.col_idx.len()
    }

    /// 第 row 行的列索引
    #[inline]
    pub fn row_indices(&self, row: usize) -> &[usize] {
        &self.col_idx[self.row_ptr[row]..self.row_ptr[row + 1]]
    }

    /// 查找 (row, col) 在值数组中的位置
    pub fn find_index(&self, row: usize, col: usize) -> Option<usize> {
        let start = self.row_ptr[row];
        self.row_indices(row)
            .binary_search(&col)
            .ok()
            .map(|local| start + local)
    }
}

// =============================================================================
// CSR 矩阵
// =============================================================================

/// CSR 格式稀疏矩阵
#[derive(Debug, Clone)]
pub struct CsrMatrix {
    pattern: CsrPattern,
    values: Vec<f64>,
}

impl CsrMatrix {
    /// 行数
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.pattern.n_rows()
    }

    /// 列数
    #[inline]
    pub fn n_cols(&self) -> usize {
        self.pattern.n_cols()
    }

    /// 非零元数量
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// 稀疏模式
    #[inline]
    pub fn pattern(&self) -> &CsrPattern {
        &self.pattern
    }

    /// 值切片
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// 可变值切片
    #[inline]
    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    /// (row, col) 的值，不存在返回 0
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.pattern
            .find_index(row, col)
            .map_or(0.0, |idx| self.values[idx])
    }

    /// 设置 (row, col)，位置不在模式中时返回 false
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f64) -> bool {
        if let Some(idx) = self.pattern.find_index(row, col) {
            self.values[idx] = value;
            true
        } else {
            false
        }
    }

    /// 累加到 (row, col)，位置不在模式中时返回 false
    #[inline]
    pub fn add(&mut self, row: usize, col: usize, value: f64) -> bool {
        if let Some(idx) = self.pattern.find_index(row, col) {
            self.values[idx] += value;
            true
        } else {
            false
        }
    }

    /// 第 row 行的非零元视图
    #[inline]
    pub fn row(&self, row: usize) -> RowView<'_> {
        let start = self.pattern.row_ptr[row];
        let end = self.pattern.row_ptr[row + 1];
        RowView {
            col_idx: &self.pattern.col_idx[start..end],
            values: &self.values[start..end],
        }
    }

    /// 对角元
    #[inline]
    pub fn diagonal_value(&self, row: usize) -> Option<f64> {
        self.pattern.find_index(row, row).map(|idx| self.values[idx])
    }

    /// 对角线向量（缺失对角元记为 0）
    pub fn extract_diagonal(&self) -> Vec<f64> {
        (0..self.n_rows())
            .map(|i| self.diagonal_value(i).unwrap_or(0.0))
            .collect()
    }

    /// 对角元在值数组中的位置缓存
    pub fn build_diagonal_cache(&self) -> Vec<Option<usize>> {
        (0..self.n_rows())
            .map(|row| self.pattern.find_index(row, row))
            .collect()
    }

    /// 矩阵-向量乘法 y = A * x
    ///
    /// # Panics
    /// - `x.len() != self.n_cols()`
    /// - `y.len() != self.n_rows()`
    pub fn mul_vec(&self, x: &[f64], y: &mut [f64]) {
        assert_eq!(x.len(), self.n_cols(), "x 长度必须等于矩阵列数");
        assert_eq!(y.len(), self.n_rows(), "y 长度必须等于矩阵行数");

        let row_product = |row: usize| -> f64 {
            let start = self.pattern.row_ptr[row];
            let end = self.pattern.row_ptr[row + 1];
            (start..end)
                .map(|idx| self.values[idx] * x[self.pattern.col_idx[idx]])
                .sum()
        };

        if self.n_rows() >= PARALLEL_THRESHOLD {
            y.par_iter_mut()
                .enumerate()
                .for_each(|(row, out)| *out = row_product(row));
        } else {
            for (row, out) in y.iter_mut().enumerate() {
                *out = row_product(row);
            }
        }
    }

    /// 所有值清零（保持稀疏模式）
    pub fn clear_values(&mut self) {
        self.values.fill(0.0);
    }
}

impl From<CsrPattern> for CsrMatrix {
    /// 从稀疏模式创建零矩阵
    fn from(pattern: CsrPattern) -> Self {
        let nnz = pattern.nnz();
        Self {
            pattern,
            values: vec![0.0; nnz],
        }
    }
}

// =============================================================================
// 行视图
// =============================================================================

/// 矩阵某一行的只读视图
pub struct RowView<'a> {
    col_idx: &'a [usize],
    values: &'a [f64],
}

impl<'a> RowView<'a> {
    /// 列索引
    #[inline]
    pub fn col_indices(&self) -> &'a [usize] {
        self.col_idx
    }

    /// 值
    #[inline]
    pub fn values(&self) -> &'a [f64] {
        self.values
    }

    /// 迭代 (列索引, 值)
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + 'a {
        self.col_idx.iter().copied().zip(self.values.iter().copied())
    }
}

// =============================================================================
// 构建器
// =============================================================================

/// CSR 矩阵构建器
///
/// 每行用 BTreeMap 暂存，构建时按列序展开为紧凑 CSR。
pub struct CsrBuilder {
    n_rows: usize,
    n_cols: usize,
    rows: Vec<BTreeMap<usize, f64>>,
}

impl CsrBuilder {
    /// 方阵构建器
    #[inline]
    pub fn new_square(n: usize) -> Self {
        Self::new(n, n)
    }

    /// 创建构建器
    pub fn new(n_rows: usize, n_cols: usize) -> Self {
        Self {
            n_rows,
            n_cols,
            rows: vec![BTreeMap::new(); n_rows],
        }
    }

    /// 设置 (row, col)（覆盖）
    ///
    /// # Panics
    /// 索引越界
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        assert!(row < self.n_rows, "行索引越界");
        assert!(col < self.n_cols, "列索引越界");
        self.rows[row].insert(col, value);
    }

    /// 累加到 (row, col)
    ///
    /// # Panics
    /// 索引越界
    pub fn add(&mut self, row: usize, col: usize, value: f64) {
        assert!(row < self.n_rows, "行索引越界");
        assert!(col < self.n_cols, "列索引越界");
        *self.rows[row].entry(col).or_insert(0.0) += value;
    }

    /// 当前非零元总数
    #[inline]
    pub fn nnz(&self) -> usize {
        self.rows.iter().map(|r| r.len()).sum()
    }

    /// 构建矩阵
    pub fn build(self) -> CsrMatrix {
        let pattern = self.build_pattern();
        let values = self
            .rows
            .into_iter()
            .flat_map(|row| row.into_values())
            .collect();
        CsrMatrix { pattern, values }
    }

    /// 只构建稀疏模式
    pub fn build_pattern(&self) -> CsrPattern {
        let mut row_ptr = Vec::with_capacity(self.n_rows + 1);
        let mut col_idx = Vec::with_capacity(self.nnz());
        row_ptr.push(0);
        for row_map in &self.rows {
            col_idx.extend(row_map.keys().copied());
            row_ptr.push(col_idx.len());
        }
        CsrPattern {
            n_rows: self.n_rows,
            n_cols: self.n_cols,
            row_ptr,
            col_idx,
        }
    }
}
