//! Deterministic "top SKUs by units sold" answer.
//!
//! Keys are grouped in first-seen order and the sort keeps that order for equal
//! totals, so ties resolve to whichever key appeared first in the file.

use polars::prelude::*;

use crate::config::FastPathConfig;
use crate::dataset::{idx_limit, markdown_table, Dataset};
use crate::session::QueryError;

/// Keys ranked by their summed quantity, largest first
#[derive(Debug, Clone, PartialEq)]
pub struct TopSkus {
    pub key_column: String,
    pub quantity_column: String,
    pub rows: Vec<(String, f64)>,
}

impl TopSkus {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows formatted for display, quantities without a trailing ".0"
    pub fn display_rows(&self) -> Vec<[String; 2]> {
        self.rows
            .iter()
            .map(|(key, total)| [key.clone(), format_quantity(*total)])
            .collect()
    }

    pub fn to_markdown(&self) -> String {
        markdown_table(
            &[self.key_column.as_str(), self.quantity_column.as_str()],
            &self.display_rows(),
        )
    }
}

/// Sum `quantity_column` per `key_column` and keep the `limit` largest totals.
pub fn top_by_sum(dataset: &Dataset, config: &FastPathConfig) -> Result<TopSkus, QueryError> {
    let key = config.key_column.as_str();
    let quantity = config.quantity_column.as_str();

    for column in [key, quantity] {
        if !dataset.has_column(column) {
            return Err(QueryError::MissingColumn {
                column: column.to_string(),
                available: dataset.column_names(),
            });
        }
    }

    let dtype = dataset.frame().column(quantity)?.dtype().clone();
    if !dtype.is_numeric() {
        return Err(QueryError::NonNumericColumn {
            column: quantity.to_string(),
            dtype: dtype.to_string(),
        });
    }

    let totals = dataset
        .frame()
        .clone()
        .lazy()
        .filter(col(key).is_not_null())
        .group_by_stable([col(key)])
        .agg([col(quantity).cast(DataType::Float64).sum()])
        .sort_by_exprs(
            vec![col(quantity)],
            SortMultipleOptions::default()
                .with_order_descending(true)
                .with_maintain_order(true),
        )
        .limit(idx_limit(config.limit))
        .collect()?;

    let keys = totals.column(key)?.cast(&DataType::String)?;
    let keys = keys.str()?;
    let sums = totals.column(quantity)?.f64()?;

    let rows = keys
        .into_iter()
        .zip(sums)
        .map(|(k, total)| (k.unwrap_or_default().to_string(), total.unwrap_or(0.0)))
        .collect();

    Ok(TopSkus {
        key_column: key.to_string(),
        quantity_column: quantity.to_string(),
        rows,
    })
}

/// Whole numbers print as integers, everything else with two decimals
pub fn format_quantity(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}
