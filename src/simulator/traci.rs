//! SUMO backend speaking the TraCI protocol over TCP.
//!
//! Framing: every message starts with a big-endian `i32` total length
//! (including itself) followed by commands. A command is
//! `[u8 len][u8 id][content]`, or `[0][i32 len][u8 id][content]` when it does
//! not fit in one byte. Each command is answered by a status command
//! `[len][id][u8 result][string description]`, followed by the response
//! payload for get-variable commands.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::Duration;

use log::{debug, info, warn};

use super::Simulator;
use crate::error::{Result, TrafficError};

const CMD_GETVERSION: u8 = 0x00;
const CMD_SIMSTEP: u8 = 0x02;
const CMD_CLOSE: u8 = 0x7f;
const CMD_GET_VEHICLE_VARIABLE: u8 = 0xa4;
const CMD_GET_EDGE_VARIABLE: u8 = 0xaa;
const CMD_GET_SIM_VARIABLE: u8 = 0xab;
const CMD_GET_PERSON_VARIABLE: u8 = 0xae;
const CMD_SET_TL_VARIABLE: u8 = 0xc2;

const ID_LIST: u8 = 0x00;
const LAST_STEP_VEHICLE_HALTING_NUMBER: u8 = 0x14;
const TL_PHASE_INDEX: u8 = 0x22;
const VAR_ROAD_ID: u8 = 0x50;
const VAR_LANE_ID: u8 = 0x51;
const VAR_LANEPOSITION: u8 = 0x56;
const VAR_WAITING_TIME: u8 = 0x7a;
const VAR_ACCUMULATED_WAITING_TIME: u8 = 0x87;
const VAR_EMERGENCYSTOPPING_VEHICLES_IDS: u8 = 0x8a;

const TYPE_INTEGER: u8 = 0x09;
const TYPE_DOUBLE: u8 = 0x0b;
const TYPE_STRING: u8 = 0x0c;
const TYPE_STRINGLIST: u8 = 0x0e;

const RTYPE_OK: u8 = 0x00;

/// A typed value returned by a get-variable command.
#[derive(Clone, Debug, PartialEq)]
pub enum TraciValue {
    Int(i32),
    Double(f64),
    Str(String),
    StrList(Vec<String>),
}

impl TraciValue {
    fn type_error(&self, wanted: &str) -> TrafficError {
        TrafficError::simulator(format!("expected {} in TraCI response, got {:?}", wanted, self))
    }

    pub fn into_int(self) -> Result<i32> {
        match self {
            TraciValue::Int(v) => Ok(v),
            other => Err(other.type_error("integer")),
        }
    }

    pub fn into_double(self) -> Result<f64> {
        match self {
            TraciValue::Double(v) => Ok(v),
            other => Err(other.type_error("double")),
        }
    }

    pub fn into_string(self) -> Result<String> {
        match self {
            TraciValue::Str(v) => Ok(v),
            other => Err(other.type_error("string")),
        }
    }

    pub fn into_string_list(self) -> Result<Vec<String>> {
        match self {
            TraciValue::StrList(v) => Ok(v),
            other => Err(other.type_error("string list")),
        }
    }
}

/// Cursor over a received TraCI message.
#[derive(Debug)]
pub struct Storage {
    buf: Vec<u8>,
    pos: usize,
}

impl Storage {
    pub fn new(buf: Vec<u8>) -> Self {
        Storage { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&[u8]> {
        if self.remaining() < n {
            return Err(TrafficError::simulator(format!(
                "truncated TraCI message: wanted {} bytes, {} left",
                n,
                self.remaining()
            )));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(self.take(4)?);
        Ok(i32::from_be_bytes(bytes))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(self.take(8)?);
        Ok(f64::from_be_bytes(bytes))
    }

    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_i32()?;
        if len < 0 {
            return Err(TrafficError::simulator("negative string length in TraCI message"));
        }
        let bytes = self.take(len as usize)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| TrafficError::simulator(format!("invalid UTF-8 in TraCI string: {}", e)))
    }

    pub fn read_string_list(&mut self) -> Result<Vec<String>> {
        let count = self.read_i32()?;
        (0..count.max(0)).map(|_| self.read_string()).collect()
    }

    /// Command length prefix: one byte, or zero followed by an `i32`.
    pub fn read_length(&mut self) -> Result<usize> {
        let short = self.read_u8()?;
        if short != 0 {
            return Ok(short as usize);
        }
        Ok(self.read_i32()?.max(0) as usize)
    }

    pub fn read_typed(&mut self) -> Result<TraciValue> {
        match self.read_u8()? {
            TYPE_INTEGER => Ok(TraciValue::Int(self.read_i32()?)),
            TYPE_DOUBLE => Ok(TraciValue::Double(self.read_f64()?)),
            TYPE_STRING => Ok(TraciValue::Str(self.read_string()?)),
            TYPE_STRINGLIST => Ok(TraciValue::StrList(self.read_string_list()?)),
            other => Err(TrafficError::simulator(format!("unsupported TraCI value type 0x{:02x}", other))),
        }
    }
}

fn put_string(out: &mut Vec<u8>, value: &str) {
    out.extend_from_slice(&(value.len() as i32).to_be_bytes());
    out.extend_from_slice(value.as_bytes());
}

/// Frame one command with its length prefix.
pub fn encode_command(command: u8, content: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(content.len() + 6);
    let short_len = 2 + content.len();
    if short_len <= 255 {
        out.push(short_len as u8);
    } else {
        out.push(0);
        out.extend_from_slice(&((6 + content.len()) as i32).to_be_bytes());
    }
    out.push(command);
    out.extend_from_slice(content);
    out
}

/// An open TraCI socket.
pub struct TraciConnection {
    stream: TcpStream,
}

impl TraciConnection {
    pub fn connect(port: u16, attempts: usize) -> Result<Self> {
        let mut last_error = None;
        for attempt in 0..attempts.max(1) {
            match TcpStream::connect(("127.0.0.1", port)) {
                Ok(stream) => {
                    stream.set_nodelay(true)?;
                    debug!("Connected to TraCI on port {} after {} attempt(s)", port, attempt + 1);
                    return Ok(TraciConnection { stream });
                }
                Err(err) => {
                    last_error = Some(err);
                    thread::sleep(Duration::from_secs(1));
                }
            }
        }
        Err(TrafficError::simulator(format!(
            "could not connect to TraCI port {}: {}",
            port,
            last_error.map(|e| e.to_string()).unwrap_or_default()
        )))
    }

    /// Send a single command and return the payload following its status.
    pub fn send(&mut self, command: u8, content: &[u8]) -> Result<Storage> {
        let framed = encode_command(command, content);
        let mut message = Vec::with_capacity(framed.len() + 4);
        message.extend_from_slice(&((framed.len() + 4) as i32).to_be_bytes());
        message.extend_from_slice(&framed);
        self.stream.write_all(&message)?;

        let mut header = [0u8; 4];
        self.stream.read_exact(&mut header)?;
        let total = i32::from_be_bytes(header);
        if total < 4 {
            return Err(TrafficError::simulator(format!("invalid TraCI message length {}", total)));
        }
        let mut body = vec![0u8; total as usize - 4];
        self.stream.read_exact(&mut body)?;

        let mut storage = Storage::new(body);
        storage.read_length()?;
        let answered = storage.read_u8()?;
        let result = storage.read_u8()?;
        let description = storage.read_string()?;
        if answered != command {
            return Err(TrafficError::simulator(format!(
                "TraCI answered command 0x{:02x}, expected 0x{:02x}",
                answered, command
            )));
        }
        if result != RTYPE_OK {
            return Err(TrafficError::simulator(format!(
                "TraCI command 0x{:02x} failed: {}",
                command, description
            )));
        }
        Ok(storage)
    }

    /// Query one variable of one object.
    pub fn get(&mut self, command: u8, variable: u8, object: &str) -> Result<TraciValue> {
        let mut content = vec![variable];
        put_string(&mut content, object);
        let mut storage = self.send(command, &content)?;

        storage.read_length()?;
        let response = storage.read_u8()?;
        let returned_variable = storage.read_u8()?;
        let returned_object = storage.read_string()?;
        if response != command.wrapping_add(0x10) || returned_variable != variable || returned_object != object {
            return Err(TrafficError::simulator(format!(
                "mismatched TraCI response 0x{:02x}/0x{:02x} for '{}'",
                response, returned_variable, returned_object
            )));
        }
        storage.read_typed()
    }

    pub fn version(&mut self) -> Result<(i32, String)> {
        let mut storage = self.send(CMD_GETVERSION, &[])?;
        storage.read_length()?;
        storage.read_u8()?;
        let api = storage.read_i32()?;
        let name = storage.read_string()?;
        Ok((api, name))
    }

    pub fn simulation_step(&mut self) -> Result<()> {
        let mut storage = self.send(CMD_SIMSTEP, &0.0f64.to_be_bytes())?;
        let subscriptions = storage.read_i32()?;
        if subscriptions != 0 {
            warn!("Ignoring {} unexpected TraCI subscription results", subscriptions);
        }
        Ok(())
    }

    pub fn set_phase(&mut self, tls: &str, phase: u32) -> Result<()> {
        let mut content = vec![TL_PHASE_INDEX];
        put_string(&mut content, tls);
        content.push(TYPE_INTEGER);
        content.extend_from_slice(&(phase as i32).to_be_bytes());
        self.send(CMD_SET_TL_VARIABLE, &content)?;
        Ok(())
    }

    pub fn close(&mut self) -> Result<()> {
        self.send(CMD_CLOSE, &[])?;
        Ok(())
    }
}

/// Launches SUMO as a child process and drives it through TraCI.
pub struct SumoSimulator {
    port: Option<u16>,
    connect_attempts: usize,
    child: Option<Child>,
    connection: Option<TraciConnection>,
}

impl SumoSimulator {
    pub fn new() -> Self {
        SumoSimulator {
            port: None,
            connect_attempts: 60,
            child: None,
            connection: None,
        }
    }

    /// Use a fixed remote port instead of picking a free one.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_connect_attempts(mut self, attempts: usize) -> Self {
        self.connect_attempts = attempts;
        self
    }

    fn free_port() -> Result<u16> {
        let listener = TcpListener::bind(("127.0.0.1", 0))?;
        Ok(listener.local_addr()?.port())
    }

    fn connection(&mut self) -> Result<&mut TraciConnection> {
        self.connection
            .as_mut()
            .ok_or_else(|| TrafficError::simulator("SUMO is not running"))
    }

    fn vehicle_var(&mut self, variable: u8, id: &str) -> Result<TraciValue> {
        self.connection()?.get(CMD_GET_VEHICLE_VARIABLE, variable, id)
    }

    fn person_var(&mut self, variable: u8, id: &str) -> Result<TraciValue> {
        self.connection()?.get(CMD_GET_PERSON_VARIABLE, variable, id)
    }
}

impl Default for SumoSimulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulator for SumoSimulator {
    fn start(&mut self, command: &[String]) -> Result<()> {
        if self.connection.is_some() {
            return Err(TrafficError::simulator("SUMO is already running"));
        }
        let (binary, args) = command
            .split_first()
            .ok_or_else(|| TrafficError::simulator("empty SUMO command line"))?;
        let port = match self.port {
            Some(port) => port,
            None => Self::free_port()?,
        };

        info!("Starting {} on TraCI port {}", binary, port);
        let child = Command::new(binary)
            .args(args)
            .arg("--remote-port")
            .arg(port.to_string())
            .stdout(Stdio::null())
            .spawn()
            .map_err(|e| TrafficError::simulator(format!("failed to launch '{}': {}", binary, e)))?;
        self.child = Some(child);

        let mut connection = TraciConnection::connect(port, self.connect_attempts)?;
        let (api, version) = connection.version()?;
        debug!("TraCI API {} ({})", api, version);
        self.connection = Some(connection);
        Ok(())
    }

    fn step(&mut self) -> Result<()> {
        self.connection()?.simulation_step()
    }

    fn vehicle_ids(&mut self) -> Result<Vec<String>> {
        self.vehicle_var(ID_LIST, "")?.into_string_list()
    }

    fn vehicle_lane_position(&mut self, vehicle: &str) -> Result<f64> {
        self.vehicle_var(VAR_LANEPOSITION, vehicle)?.into_double()
    }

    fn vehicle_lane_id(&mut self, vehicle: &str) -> Result<String> {
        self.vehicle_var(VAR_LANE_ID, vehicle)?.into_string()
    }

    fn vehicle_road_id(&mut self, vehicle: &str) -> Result<String> {
        self.vehicle_var(VAR_ROAD_ID, vehicle)?.into_string()
    }

    fn vehicle_accumulated_waiting_time(&mut self, vehicle: &str) -> Result<f64> {
        self.vehicle_var(VAR_ACCUMULATED_WAITING_TIME, vehicle)?.into_double()
    }

    fn person_ids(&mut self) -> Result<Vec<String>> {
        self.person_var(ID_LIST, "")?.into_string_list()
    }

    fn person_lane_position(&mut self, person: &str) -> Result<f64> {
        self.person_var(VAR_LANEPOSITION, person)?.into_double()
    }

    fn person_lane_id(&mut self, person: &str) -> Result<String> {
        self.person_var(VAR_LANE_ID, person)?.into_string()
    }

    fn person_waiting_time(&mut self, person: &str) -> Result<f64> {
        self.person_var(VAR_WAITING_TIME, person)?.into_double()
    }

    fn edge_halting_count(&mut self, edge: &str) -> Result<usize> {
        let count = self
            .connection()?
            .get(CMD_GET_EDGE_VARIABLE, LAST_STEP_VEHICLE_HALTING_NUMBER, edge)?
            .into_int()?;
        Ok(count.max(0) as usize)
    }

    fn emergency_stopping_vehicles(&mut self) -> Result<Vec<String>> {
        self.connection()?
            .get(CMD_GET_SIM_VARIABLE, VAR_EMERGENCYSTOPPING_VEHICLES_IDS, "")?
            .into_string_list()
    }

    fn set_phase(&mut self, tls: &str, phase: u32) -> Result<()> {
        self.connection()?.set_phase(tls, phase)
    }

    fn close(&mut self) -> Result<()> {
        let mut connection = self
            .connection
            .take()
            .ok_or_else(|| TrafficError::simulator("SUMO is not running"))?;
        let closed = connection.close();
        drop(connection);
        if let Some(mut child) = self.child.take() {
            let status = child.wait()?;
            debug!("SUMO exited with {}", status);
        }
        closed
    }
}

impl Drop for SumoSimulator {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            if self.connection.take().is_some() {
                warn!("SUMO dropped while running; killing the child process");
            }
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_commands_use_one_length_byte() {
        let framed = encode_command(CMD_SIMSTEP, &0.0f64.to_be_bytes());
        assert_eq!(framed[0], 10);
        assert_eq!(framed[1], CMD_SIMSTEP);
        assert_eq!(framed.len(), 10);
    }

    #[test]
    fn long_commands_use_extended_length() {
        let content = vec![7u8; 300];
        let framed = encode_command(CMD_SET_TL_VARIABLE, &content);
        assert_eq!(framed[0], 0);
        assert_eq!(i32::from_be_bytes([framed[1], framed[2], framed[3], framed[4]]), 306);
        assert_eq!(framed[5], CMD_SET_TL_VARIABLE);
        assert_eq!(framed.len(), 306);
    }

    #[test]
    fn storage_reads_typed_string_list() {
        let mut buf = vec![TYPE_STRINGLIST];
        buf.extend_from_slice(&2i32.to_be_bytes());
        put_string(&mut buf, "veh0");
        put_string(&mut buf, "veh1");
        let mut storage = Storage::new(buf);
        let value = storage.read_typed().unwrap();
        assert_eq!(value, TraciValue::StrList(vec!["veh0".to_string(), "veh1".to_string()]));
        assert_eq!(storage.remaining(), 0);
    }

    #[test]
    fn storage_rejects_truncated_double() {
        let mut storage = Storage::new(vec![TYPE_DOUBLE, 0, 0, 0]);
        assert!(storage.read_typed().is_err());
    }

    #[test]
    fn typed_value_conversion_checks_type() {
        assert_eq!(TraciValue::Int(3).into_int().unwrap(), 3);
        assert!(TraciValue::Double(1.0).into_string().is_err());
    }
}
