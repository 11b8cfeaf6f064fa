//! Serial device source: one newline-framed record of ADC codes per
//! acquisition tick.

use crate::error::SourceError;
use crate::source::{parse_record, RawTuple, SampleSource};
use log::{debug, info};
use std::io::{self, Read};
use std::time::Duration;

/// Reads CSV records from a serial port and converts them to voltage
/// tuples. Partial reads are reassembled internally; the port timeout
/// bounds how long one `next_tuple` call can block.
pub struct SerialDeviceSource {
    port: Box<dyn serialport::SerialPort>,
    port_name: String,
    channel_count: usize,
    pending: Vec<u8>,
    seq: u64,
}

impl SerialDeviceSource {
    pub fn open(
        port_name: &str,
        baud_rate: u32,
        channel_count: usize,
    ) -> Result<Self, SourceError> {
        let port = serialport::new(port_name, baud_rate)
            .timeout(Duration::from_millis(100))
            .open()
            .map_err(|e| SourceError::Transport(format!("open {}: {}", port_name, e)))?;
        info!("Serial port opened: {} @ {}", port_name, baud_rate);
        Ok(Self {
            port,
            port_name: port_name.to_string(),
            channel_count,
            pending: Vec::with_capacity(256),
            seq: 0,
        })
    }
}

impl SampleSource for SerialDeviceSource {
    fn describe(&self) -> String {
        format!("serial device on {}", self.port_name)
    }

    fn next_tuple(&mut self) -> Result<RawTuple, SourceError> {
        loop {
            if let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
                let record: Vec<u8> = self.pending.drain(..=pos).collect();
                let line = String::from_utf8_lossy(&record);
                debug!("record: {:?}", line.trim());
                let volts = parse_record(&line, self.channel_count)?;
                let tuple = RawTuple {
                    seq: self.seq,
                    volts,
                };
                self.seq += 1;
                return Ok(tuple);
            }

            let mut buf = [0u8; 256];
            match self.port.read(&mut buf) {
                Ok(0) => {
                    return Err(SourceError::Transport(format!(
                        "{} closed the stream",
                        self.port_name
                    )))
                }
                Ok(n) => self.pending.extend_from_slice(&buf[..n]),
                Err(ref e) if e.kind() == io::ErrorKind::TimedOut => continue,
                Err(e) => {
                    return Err(SourceError::Transport(format!(
                        "read from {}: {}",
                        self.port_name, e
                    )))
                }
            }
        }
    }
}
