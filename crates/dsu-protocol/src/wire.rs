//! Little-endian cursor primitives shared by the codec modules.

use padbridge_pad_types::MacAddress;

use crate::{ProtocolError, ProtocolResult};

/// Forward-only reader over a received datagram.
#[derive(Debug)]
pub struct PacketReader<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> PacketReader<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            position: 0,
        }
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    fn take(&mut self, count: usize) -> ProtocolResult<&'a [u8]> {
        let end = self.position.checked_add(count).ok_or(ProtocolError::Truncated {
            expected: count,
            actual: self.remaining(),
        })?;
        let slice = self
            .buffer
            .get(self.position..end)
            .ok_or(ProtocolError::Truncated {
                expected: count,
                actual: self.remaining(),
            })?;
        self.position = end;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> ProtocolResult<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16_le(&mut self) -> ProtocolResult<u16> {
        let bytes = self.take(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u32_le(&mut self) -> ProtocolResult<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_i32_le(&mut self) -> ProtocolResult<i32> {
        Ok(self.read_u32_le()? as i32)
    }

    pub fn read_u64_le(&mut self) -> ProtocolResult<u64> {
        let lo = self.read_u32_le()? as u64;
        let hi = self.read_u32_le()? as u64;
        Ok(lo | (hi << 32))
    }

    pub fn read_f32_le(&mut self) -> ProtocolResult<f32> {
        Ok(f32::from_bits(self.read_u32_le()?))
    }

    pub fn read_mac(&mut self) -> ProtocolResult<MacAddress> {
        let bytes = self.take(6)?;
        let mut octets = [0u8; 6];
        octets.copy_from_slice(bytes);
        Ok(MacAddress(octets))
    }

    pub fn read_array<const N: usize>(&mut self) -> ProtocolResult<[u8; N]> {
        let bytes = self.take(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    pub fn skip(&mut self, count: usize) -> ProtocolResult<()> {
        self.take(count).map(|_| ())
    }
}

/// Append-only builder for an outbound datagram.
#[derive(Default)]
pub struct PacketWriter {
    buffer: Vec<u8>,
}

impl PacketWriter {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    pub fn write_u8(&mut self, value: u8) -> &mut Self {
        self.buffer.push(value);
        self
    }

    pub fn write_bool(&mut self, value: bool) -> &mut Self {
        self.write_u8(u8::from(value))
    }

    pub fn write_u16_le(&mut self, value: u16) -> &mut Self {
        self.buffer.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn write_u32_le(&mut self, value: u32) -> &mut Self {
        self.buffer.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn write_u64_le(&mut self, value: u64) -> &mut Self {
        self.buffer.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn write_f32_le(&mut self, value: f32) -> &mut Self {
        self.buffer.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn write_bytes(&mut self, data: &[u8]) -> &mut Self {
        self.buffer.extend_from_slice(data);
        self
    }

    pub fn write_mac(&mut self, mac: MacAddress) -> &mut Self {
        self.write_bytes(&mac.octets())
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }
}
