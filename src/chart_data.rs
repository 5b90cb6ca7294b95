//! Turn a dataset or a fast-path ranking into points the chart widgets can draw.

use polars::prelude::*;

use crate::dataset::{idx_limit, Dataset};
use crate::fast_path::TopSkus;

#[derive(Debug, Clone, PartialEq)]
pub struct LineSeries {
    pub name: String,
    pub points: Vec<(f64, f64)>,
}

/// Every numeric column plotted against its row position
#[derive(Debug, Clone, PartialEq)]
pub struct LineChart {
    pub series: Vec<LineSeries>,
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
}

#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    #[error("no numeric data to plot")]
    NoNumericData,
    #[error(transparent)]
    Polars(#[from] PolarsError),
}

/// Build a line chart from the first `row_limit` rows.
/// Nulls and non-finite values are skipped; columns left empty are dropped.
pub fn line_chart(dataset: &Dataset, row_limit: usize) -> Result<LineChart, ChartError> {
    let numeric: Vec<String> = dataset
        .frame()
        .get_columns()
        .iter()
        .filter(|column| column.dtype().is_numeric())
        .map(|column| column.name().to_string())
        .collect();
    if numeric.is_empty() {
        return Err(ChartError::NoNumericData);
    }

    let select: Vec<Expr> = numeric
        .iter()
        .map(|name| col(name.as_str()).cast(DataType::Float64))
        .collect();
    let df = dataset
        .frame()
        .clone()
        .lazy()
        .select(select)
        .limit(idx_limit(row_limit))
        .collect()?;

    let mut series = Vec::with_capacity(numeric.len());
    for name in numeric {
        let values = df.column(name.as_str())?.f64()?;
        let points: Vec<(f64, f64)> = values
            .into_iter()
            .enumerate()
            .filter_map(|(i, v)| v.filter(|v| v.is_finite()).map(|v| (i as f64, v)))
            .collect();
        if !points.is_empty() {
            series.push(LineSeries { name, points });
        }
    }
    if series.is_empty() {
        return Err(ChartError::NoNumericData);
    }

    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for (_, y) in series.iter().flat_map(|s| s.points.iter()) {
        y_min = y_min.min(*y);
        y_max = y_max.max(*y);
    }
    if y_min == y_max {
        y_min -= 1.0;
        y_max += 1.0;
    }
    let x_max = (df.height().saturating_sub(1)).max(1) as f64;

    Ok(LineChart {
        series,
        x_bounds: [0.0, x_max],
        y_bounds: [y_min, y_max],
    })
}

/// Bar heights for a fast-path ranking, rounded and floored at zero
pub fn bar_values(top: &TopSkus) -> Vec<(String, u64)> {
    top.rows
        .iter()
        .map(|(key, total)| (key.clone(), total.max(0.0).round() as u64))
        .collect()
}

/// Three evenly spaced axis labels for `bounds`
pub fn axis_labels(bounds: [f64; 2]) -> Vec<String> {
    let mid = (bounds[0] + bounds[1]) / 2.0;
    [bounds[0], mid, bounds[1]]
        .iter()
        .map(|v| {
            if v.fract() == 0.0 {
                format!("{:.0}", v)
            } else {
                format!("{:.1}", v)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_columns_only() {
        let df = df!(
            "week" => ["17/01/11", "24/01/11", "31/01/11"],
            "units_sold" => [Some(20i64), None, Some(35)],
            "base_price" => [100.5f64, 99.0, 101.25]
        )
        .unwrap();
        let chart = line_chart(&Dataset::from_frame(df, "t.csv"), 10_000).unwrap();

        let names: Vec<&str> = chart.series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["units_sold", "base_price"]);
        assert_eq!(chart.series[0].points, vec![(0.0, 20.0), (2.0, 35.0)]);
        assert_eq!(chart.x_bounds, [0.0, 2.0]);
        assert_eq!(chart.y_bounds, [20.0, 101.25]);
    }

    #[test]
    fn test_no_numeric_data() {
        let df = df!("sku" => ["a", "b"]).unwrap();
        let err = line_chart(&Dataset::from_frame(df, "t.csv"), 10_000).unwrap_err();
        assert!(matches!(err, ChartError::NoNumericData));
        assert_eq!(err.to_string(), "no numeric data to plot");
    }

    #[test]
    fn test_all_null_numeric_column() {
        let df = df!("units_sold" => [None::<i64>, None]).unwrap();
        assert!(matches!(
            line_chart(&Dataset::from_frame(df, "t.csv"), 10_000),
            Err(ChartError::NoNumericData)
        ));
    }

    #[test]
    fn test_row_limit() {
        let values: Vec<i64> = (0..50).collect();
        let df = df!("v" => values).unwrap();
        let chart = line_chart(&Dataset::from_frame(df, "t.csv"), 10).unwrap();
        assert_eq!(chart.series[0].points.len(), 10);
        assert_eq!(chart.x_bounds, [0.0, 9.0]);
    }

    #[test]
    fn test_bar_values() {
        let top = TopSkus {
            key_column: "sku_id".to_string(),
            quantity_column: "units_sold".to_string(),
            rows: vec![("a".to_string(), 12.6), ("b".to_string(), -3.0)],
        };
        assert_eq!(
            bar_values(&top),
            vec![("a".to_string(), 13), ("b".to_string(), 0)]
        );
    }

    #[test]
    fn test_axis_labels() {
        assert_eq!(axis_labels([0.0, 10.0]), vec!["0", "5", "10"]);
        assert_eq!(axis_labels([0.0, 3.0]), vec!["0", "1.5", "3"]);
    }
}
