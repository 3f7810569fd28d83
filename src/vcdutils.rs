use std::fs;
use std::io::{self, Write};
use std::path::Path;

use vcd::{self, SimulationCommand, TimescaleUnit, Value};

use irmagician_shared::WaveformRecord;

pub struct VcdWriter<W: Write> {
    vcd: vcd::Writer<W>,
    wire_id: vcd::IdCode,
}

impl<W: Write> VcdWriter<W> {
    /// Create a new vcd writer
    pub fn new(writer: W) -> Self {
        Self {
            vcd: vcd::Writer::new(writer),
            wire_id: vcd::IdCode::FIRST,
        }
    }

    /// Header with one wire, `top.ir`, timestamps in microseconds
    pub fn init(&mut self) -> io::Result<()> {
        let writer = &mut self.vcd;

        writer.timescale(1, TimescaleUnit::US)?;
        writer.add_module("top")?;

        let id = writer.add_wire(1, "ir")?;
        self.wire_id = id;

        writer.upscope()?;
        writer.enddefinitions()?;

        // Write the initial values
        writer.begin(SimulationCommand::Dumpvars)?;
        writer.change_scalar(id, Value::V0)?;
        writer.end()?;

        Ok(())
    }

    pub fn write_edges(&mut self, edges: &[(u64, bool)]) -> io::Result<()> {
        for &(ts, high) in edges {
            self.vcd.timestamp(ts)?;
            let value = if high { Value::V1 } else { Value::V0 };
            self.vcd.change_scalar(self.wire_id, value)?;
        }
        Ok(())
    }
}

/// Level changes of a record in microseconds.
///
/// Samples alternate between mark and space, starting with a mark. Each one
/// lasts `value * scale` ticks of `tick_us`. The tick length is not reported
/// by the device, so the result is an approximation.
pub fn record_edges(record: &WaveformRecord, tick_us: u64) -> io::Result<Vec<(u64, bool)>> {
    let overflow = || io::Error::new(io::ErrorKind::InvalidInput, "trace length overflows u64");

    let tick = u64::from(record.scale)
        .checked_mul(tick_us)
        .ok_or_else(overflow)?;

    let mut edges = Vec::with_capacity(record.data.len() + 1);
    let mut ts: u64 = 0;
    let mut high = true;

    for &value in &record.data {
        edges.push((ts, high));
        ts = u64::from(value)
            .checked_mul(tick)
            .and_then(|len| ts.checked_add(len))
            .ok_or_else(overflow)?;
        high = !high;
    }
    edges.push((ts, false));

    Ok(edges)
}

pub fn export_record(record: &WaveformRecord, path: &Path, tick_us: u64) -> io::Result<()> {
    let mut buf = Vec::new();

    let mut vcd = VcdWriter::new(&mut buf);
    vcd.init()?;
    vcd.write_edges(&record_edges(record, tick_us)?)?;
    drop(vcd);

    fs::write(path, buf)
}
