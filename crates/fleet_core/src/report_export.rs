//! Report sinks: JSON lines for the full record stream, Parquet for vehicle snapshots.

use std::error::Error;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use crate::reports::Report;

#[derive(Debug, thiserror::Error)]
pub enum ReportSinkError {
    #[error("report sink i/o: {0}")]
    Io(#[from] io::Error),
    #[error("report encoding: {0}")]
    Json(#[from] serde_json::Error),
}

/// Destination for drained report records.
pub trait ReportSink {
    fn write_report(&mut self, report: &Report) -> Result<(), ReportSinkError>;

    fn write_reports(&mut self, reports: &[Report]) -> Result<(), ReportSinkError> {
        reports.iter().try_for_each(|report| self.write_report(report))
    }

    fn flush(&mut self) -> Result<(), ReportSinkError> {
        Ok(())
    }
}

/// Writes one JSON object per line.
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl JsonLinesSink<io::BufWriter<File>> {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, ReportSinkError> {
        Ok(Self::new(io::BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> ReportSink for JsonLinesSink<W> {
    fn write_report(&mut self, report: &Report) -> Result<(), ReportSinkError> {
        serde_json::to_writer(&mut self.writer, report)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), ReportSinkError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Keeps records in memory; handy for tests and post-run analysis.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub records: Vec<Report>,
}

impl ReportSink for MemorySink {
    fn write_report(&mut self, report: &Report) -> Result<(), ReportSinkError> {
        self.records.push(report.clone());
        Ok(())
    }
}

fn u64_field(name: &'static str) -> Field {
    Field::new(name, DataType::UInt64, false)
}

fn f64_field(name: &'static str) -> Field {
    Field::new(name, DataType::Float64, false)
}

fn utf8_field(name: &'static str) -> Field {
    Field::new(name, DataType::Utf8, false)
}

fn write_record_batch<P: AsRef<Path>>(
    path: P,
    schema: Schema,
    arrays: Vec<ArrayRef>,
) -> Result<(), Box<dyn Error>> {
    let schema = Arc::new(schema);
    let batch = RecordBatch::try_new(schema.clone(), arrays)?;
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

/// Write every `VehicleSnapshot` record in `reports` to a Parquet file, one row per vehicle per
/// tick. Other record types are ignored.
pub fn write_vehicle_snapshots_parquet<P: AsRef<Path>>(
    path: P,
    reports: &[Report],
) -> Result<(), Box<dyn Error>> {
    let mut sim_time = Vec::new();
    let mut vehicle_id = Vec::new();
    let mut state = Vec::new();
    let mut cell = Vec::new();
    let mut energy = Vec::new();
    let mut soc = Vec::new();
    let mut distance = Vec::new();
    let mut passengers = Vec::new();

    for report in reports {
        if let Report::VehicleSnapshot {
            sim_time: time,
            snapshot,
        } = report
        {
            sim_time.push(*time);
            vehicle_id.push(snapshot.vehicle_id.to_string());
            state.push(snapshot.state.to_string());
            cell.push(snapshot.cell);
            energy.push(snapshot.energy);
            soc.push(snapshot.soc);
            distance.push(snapshot.distance_traveled_km);
            passengers.push(snapshot.passengers as u64);
        }
    }

    let schema = Schema::new(vec![
        u64_field("sim_time"),
        utf8_field("vehicle_id"),
        utf8_field("state"),
        u64_field("cell"),
        f64_field("energy"),
        f64_field("soc"),
        f64_field("distance_traveled_km"),
        u64_field("passengers"),
    ]);
    let arrays: Vec<ArrayRef> = vec![
        Arc::new(UInt64Array::from(sim_time)),
        Arc::new(StringArray::from(vehicle_id)),
        Arc::new(StringArray::from(state)),
        Arc::new(UInt64Array::from(cell)),
        Arc::new(Float64Array::from(energy)),
        Arc::new(Float64Array::from(soc)),
        Arc::new(Float64Array::from(distance)),
        Arc::new(UInt64Array::from(passengers)),
    ];
    write_record_batch(path, schema, arrays)
}
