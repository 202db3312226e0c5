// Parquet reader: Arrow record batches flattened into table rows
use crate::domain::table::{Table, Value};
use anyhow::Context;
use arrow_array::cast::AsArray;
use arrow_array::types::{
    ArrowPrimitiveType, Date32Type, Date64Type, Float32Type, Float64Type, Int8Type, Int16Type,
    Int32Type, Int64Type, TimestampMicrosecondType, TimestampMillisecondType, TimestampNanosecondType, TimestampSecondType,
    UInt8Type, UInt16Type, UInt32Type, UInt64Type,
};
use arrow_array::{Array, ArrayRef};
use arrow_schema::{DataType, TimeUnit};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::fs::File;
use std::path::Path;

pub fn read_parquet(path: &Path) -> anyhow::Result<Table> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .with_context(|| format!("Failed to read parquet metadata from {}", path.display()))?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|field| field.name().to_string())
        .collect();

    let mut table = Table::new(columns);
    for batch in builder.build()? {
        let batch = batch?;
        let values = batch
            .columns()
            .iter()
            .map(column_values)
            .collect::<anyhow::Result<Vec<_>>>()?;
        for row in 0..batch.num_rows() {
            table.push_row(values.iter().map(|column| column[row].clone()).collect());
        }
    }
    Ok(table)
}

fn column_values(array: &ArrayRef) -> anyhow::Result<Vec<Value>> {
    let values = match array.data_type() {
        DataType::Int8 => integers::<Int8Type>(array),
        DataType::Int16 => integers::<Int16Type>(array),
        DataType::Int32 => integers::<Int32Type>(array),
        DataType::Int64 => integers::<Int64Type>(array),
        DataType::UInt8 => integers::<UInt8Type>(array),
        DataType::UInt16 => integers::<UInt16Type>(array),
        DataType::UInt32 => integers::<UInt32Type>(array),
        DataType::UInt64 => array
            .as_primitive::<UInt64Type>()
            .iter()
            .map(|v| match v {
                Some(v) => i64::try_from(v).map_or(Value::Number(v as f64), Value::Integer),
                None => Value::Missing,
            })
            .collect(),
        DataType::Float32 => numbers::<Float32Type>(array),
        DataType::Float64 => numbers::<Float64Type>(array),
        DataType::Utf8 => texts(array.as_string::<i32>().iter()),
        DataType::LargeUtf8 => texts(array.as_string::<i64>().iter()),
        DataType::Boolean => array
            .as_boolean()
            .iter()
            .map(|v| v.map_or(Value::Missing, |b| Value::text(b.to_string())))
            .collect(),
        DataType::Date32 => {
            let dates = array.as_primitive::<Date32Type>();
            by_index(array, |i| dates.value_as_date(i).map(Value::Date))
        }
        DataType::Date64 => {
            let dates = array.as_primitive::<Date64Type>();
            by_index(array, |i| dates.value_as_date(i).map(Value::Date))
        }
        DataType::Timestamp(TimeUnit::Second, _) => {
            let stamps = array.as_primitive::<TimestampSecondType>();
            by_index(array, |i| stamps.value_as_datetime(i).map(Value::DateTime))
        }
        DataType::Timestamp(TimeUnit::Millisecond, _) => {
            let stamps = array.as_primitive::<TimestampMillisecondType>();
            by_index(array, |i| stamps.value_as_datetime(i).map(Value::DateTime))
        }
        DataType::Timestamp(TimeUnit::Microsecond, _) => {
            let stamps = array.as_primitive::<TimestampMicrosecondType>();
            by_index(array, |i| stamps.value_as_datetime(i).map(Value::DateTime))
        }
        DataType::Timestamp(TimeUnit::Nanosecond, _) => {
            let stamps = array.as_primitive::<TimestampNanosecondType>();
            by_index(array, |i| stamps.value_as_datetime(i).map(Value::DateTime))
        }
        other => anyhow::bail!("column type {} is not supported", other),
    };
    Ok(values)
}

fn integers<T>(array: &ArrayRef) -> Vec<Value>
where
    T: ArrowPrimitiveType,
    T::Native: Into<i64>,
{
    array
        .as_primitive::<T>()
        .iter()
        .map(|v| v.map_or(Value::Missing, |v| Value::Integer(v.into())))
        .collect()
}

fn numbers<T>(array: &ArrayRef) -> Vec<Value>
where
    T: ArrowPrimitiveType,
    T::Native: Into<f64>,
{
    array
        .as_primitive::<T>()
        .iter()
        .map(|v| v.map_or(Value::Missing, |v| Value::Number(v.into())))
        .collect()
}

fn texts<'a>(cells: impl Iterator<Item = Option<&'a str>>) -> Vec<Value> {
    cells.map(|v| v.map_or(Value::Missing, Value::text)).collect()
}

fn by_index(array: &ArrayRef, cell: impl Fn(usize) -> Option<Value>) -> Vec<Value> {
    (0..array.len())
        .map(|i| {
            if array.is_null(i) {
                Value::Missing
            } else {
                cell(i).unwrap_or(Value::Missing)
            }
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use arrow_array::{
        BooleanArray, Date32Array, Float64Array, Int32Array, RecordBatch, StringArray,
        TimestampMillisecondArray,
    };
    use arrow_schema::{Field, Schema};
    use chrono::NaiveDate;
    use parquet::arrow::ArrowWriter;
    use std::sync::Arc;

    fn days(y: i32, m: u32, d: u32) -> i32 {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        (NaiveDate::from_ymd_opt(y, m, d).unwrap() - epoch).num_days() as i32
    }

    /// Write a small sales file with one column per supported family
    pub(crate) fn write_sales(path: &Path) {
        let schema = Arc::new(Schema::new(vec![
            Field::new("Region", DataType::Utf8, true),
            Field::new("Units", DataType::Int32, true),
            Field::new("Sales", DataType::Float64, true),
            Field::new("Date", DataType::Date32, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec![Some("East"), None])) as ArrayRef,
                Arc::new(Int32Array::from(vec![Some(3), None])) as ArrayRef,
                Arc::new(Float64Array::from(vec![10.5, 4.0])) as ArrayRef,
                Arc::new(Date32Array::from(vec![days(2022, 1, 3), days(2022, 2, 1)])) as ArrayRef,
            ],
        )
        .unwrap();

        let mut writer = ArrowWriter::try_new(File::create(path).unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
    }

    #[test]
    fn test_read_parquet_types_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sales.parquet");
        write_sales(&path);

        let table = read_parquet(&path).unwrap();
        assert_eq!(table.columns(), &["Region", "Units", "Sales", "Date"].map(String::from));
        assert_eq!(
            table.rows()[0],
            vec![
                Value::text("East"),
                Value::Integer(3),
                Value::Number(10.5),
                Value::Date(NaiveDate::from_ymd_opt(2022, 1, 3).unwrap()),
            ]
        );
        assert_eq!(table.rows()[1][0], Value::Missing);
        assert_eq!(table.rows()[1][1], Value::Missing);
    }

    #[test]
    fn test_timestamps_and_booleans() {
        let stamps: ArrayRef = Arc::new(TimestampMillisecondArray::from(vec![Some(86_400_000), None]));
        let flags: ArrayRef = Arc::new(BooleanArray::from(vec![true, false]));

        let midnight = NaiveDate::from_ymd_opt(1970, 1, 2).unwrap().and_hms_opt(0, 0, 0).unwrap();
        assert_eq!(
            column_values(&stamps).unwrap(),
            vec![Value::DateTime(midnight), Value::Missing]
        );
        assert_eq!(
            column_values(&flags).unwrap(),
            vec![Value::text("true"), Value::text("false")]
        );
    }

    #[test]
    fn test_unsupported_column_type() {
        let nulls: ArrayRef = Arc::new(arrow_array::NullArray::new(2));
        assert!(column_values(&nulls).is_err());
    }

    #[test]
    fn test_not_a_parquet_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.parquet");
        std::fs::write(&path, "Region\nEast\n").unwrap();
        assert!(read_parquet(&path).is_err());
    }
}
