//! Little-endian wire codec for packed transactions.
//!
//! Integers are little-endian, lengths are LEB128 `varuint32`, names and
//! symbols travel as raw `u64`. `ByteReader` walks a borrowed buffer with
//! typed errors; `ByteWriter` produces the same layout for fixtures and
//! offline tooling.

use crate::asset::{Asset, Symbol};
use crate::error::CodecError;
use crate::name::Name;
use crate::types::{Action, PackedTransaction, PermissionLevel, TimePointSec, Transaction};
use bytes::Bytes;

/// Forward-only reader over a packed payload.
#[derive(Debug)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Fails if any input is left unconsumed.
    pub fn expect_end(&self) -> Result<(), CodecError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(CodecError::TrailingBytes { remaining: self.remaining() })
        }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        if self.remaining() < n {
            return Err(CodecError::UnexpectedEof {
                wanted: n,
                remaining: self.remaining(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, CodecError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32, CodecError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_u64(&mut self) -> Result<u64, CodecError> {
        let b = self.take(8)?;
        let mut arr = [0u8; 8];
        arr.copy_from_slice(b);
        Ok(u64::from_le_bytes(arr))
    }

    pub fn read_i8(&mut self) -> Result<i8, CodecError> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_i16(&mut self) -> Result<i16, CodecError> {
        Ok(self.read_u16()? as i16)
    }

    pub fn read_i32(&mut self) -> Result<i32, CodecError> {
        Ok(self.read_u32()? as i32)
    }

    pub fn read_i64(&mut self) -> Result<i64, CodecError> {
        Ok(self.read_u64()? as i64)
    }

    pub fn read_bool(&mut self) -> Result<bool, CodecError> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(CodecError::InvalidBool(other)),
        }
    }

    /// LEB128 unsigned, at most 5 bytes.
    pub fn read_varuint32(&mut self) -> Result<u32, CodecError> {
        let mut value: u64 = 0;
        let mut shift = 0;
        loop {
            if shift >= 35 {
                return Err(CodecError::VaruintOverflow);
            }
            let byte = self.read_u8()?;
            value |= ((byte & 0x7f) as u64) << shift;
            if byte & 0x80 == 0 {
                break;
            }
            shift += 7;
        }
        if value > u32::MAX as u64 {
            return Err(CodecError::VaruintOverflow);
        }
        Ok(value as u32)
    }

    pub fn read_name(&mut self) -> Result<Name, CodecError> {
        Ok(Name::new(self.read_u64()?))
    }

    pub fn read_symbol(&mut self) -> Result<Symbol, CodecError> {
        Ok(Symbol::from_raw(self.read_u64()?))
    }

    pub fn read_asset(&mut self) -> Result<Asset, CodecError> {
        let amount = self.read_i64()?;
        let symbol = self.read_symbol()?;
        Ok(Asset::new(amount, symbol))
    }

    pub fn read_time_point_sec(&mut self) -> Result<TimePointSec, CodecError> {
        Ok(TimePointSec(self.read_u32()?))
    }

    pub fn read_bytes(&mut self) -> Result<Bytes, CodecError> {
        let len = self.read_varuint32()? as usize;
        Ok(Bytes::copy_from_slice(self.take(len)?))
    }

    pub fn read_string(&mut self) -> Result<String, CodecError> {
        let len = self.read_varuint32()? as usize;
        let raw = self.take(len)?;
        std::str::from_utf8(raw)
            .map(|s| s.to_string())
            .map_err(|_| CodecError::InvalidUtf8)
    }

    pub fn read_checksum256(&mut self) -> Result<[u8; 32], CodecError> {
        let raw = self.take(32)?;
        let mut out = [0u8; 32];
        out.copy_from_slice(raw);
        Ok(out)
    }
}

/// Append-only writer producing the reader's wire layout.
#[derive(Debug, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_bytes(self) -> Bytes {
        Bytes::from(self.buf)
    }

    pub fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn write_u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_i64(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_bool(&mut self, v: bool) {
        self.write_u8(v as u8);
    }

    pub fn write_varuint32(&mut self, mut v: u32) {
        loop {
            let mut byte = (v & 0x7f) as u8;
            v >>= 7;
            if v > 0 {
                byte |= 0x80;
            }
            self.buf.push(byte);
            if v == 0 {
                break;
            }
        }
    }

    pub fn write_name(&mut self, name: Name) {
        self.write_u64(name.as_u64());
    }

    pub fn write_symbol(&mut self, symbol: Symbol) {
        self.write_u64(symbol.0);
    }

    pub fn write_asset(&mut self, asset: Asset) {
        self.write_i64(asset.amount);
        self.write_symbol(asset.symbol);
    }

    pub fn write_time_point_sec(&mut self, t: TimePointSec) {
        self.write_u32(t.0);
    }

    pub fn write_bytes(&mut self, data: &[u8]) {
        self.write_varuint32(data.len() as u32);
        self.buf.extend_from_slice(data);
    }

    pub fn write_string(&mut self, s: &str) {
        self.write_bytes(s.as_bytes());
    }

    pub fn write_checksum256(&mut self, digest: &[u8; 32]) {
        self.buf.extend_from_slice(digest);
    }
}

impl Action {
    fn read(reader: &mut ByteReader<'_>) -> Result<Self, CodecError> {
        let account = reader.read_name()?;
        let name = reader.read_name()?;
        let auth_count = reader.read_varuint32()? as usize;
        let mut authorization = Vec::with_capacity(auth_count.min(64));
        for _ in 0..auth_count {
            authorization.push(PermissionLevel {
                actor: reader.read_name()?,
                permission: reader.read_name()?,
            });
        }
        let data = reader.read_bytes()?;
        Ok(Action { account, name, authorization, data })
    }

    fn write(&self, writer: &mut ByteWriter) {
        writer.write_name(self.account);
        writer.write_name(self.name);
        writer.write_varuint32(self.authorization.len() as u32);
        for auth in &self.authorization {
            writer.write_name(auth.actor);
            writer.write_name(auth.permission);
        }
        writer.write_bytes(&self.data);
    }
}

impl Transaction {
    /// Decode an envelope, requiring the buffer to be fully consumed.
    pub fn unpack(raw: &[u8]) -> Result<Self, CodecError> {
        let mut reader = ByteReader::new(raw);
        let expiration = reader.read_time_point_sec()?;
        let ref_block_num = reader.read_u16()?;
        let ref_block_prefix = reader.read_u32()?;
        let action_count = reader.read_varuint32()? as usize;
        let mut actions = Vec::with_capacity(action_count.min(256));
        for _ in 0..action_count {
            actions.push(Action::read(&mut reader)?);
        }
        reader.expect_end()?;
        Ok(Transaction { expiration, ref_block_num, ref_block_prefix, actions })
    }

    pub fn pack(&self) -> Bytes {
        let mut writer = ByteWriter::new();
        writer.write_time_point_sec(self.expiration);
        writer.write_u16(self.ref_block_num);
        writer.write_u32(self.ref_block_prefix);
        writer.write_varuint32(self.actions.len() as u32);
        for action in &self.actions {
            action.write(&mut writer);
        }
        writer.into_bytes()
    }
}

impl PackedTransaction {
    pub fn unpack(&self) -> Result<Transaction, CodecError> {
        Transaction::unpack(&self.raw)
    }

    /// Pack an envelope into wire form.
    pub fn from_transaction(trx: &Transaction) -> Self {
        Self { raw: trx.pack() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_transaction() -> Transaction {
        Transaction {
            expiration: TimePointSec(1_700_000_000),
            ref_block_num: 42,
            ref_block_prefix: 0xdead_beef,
            actions: vec![Action {
                account: "eosio.token".parse().unwrap(),
                name: "transfer".parse().unwrap(),
                authorization: vec![PermissionLevel {
                    actor: "alice".parse().unwrap(),
                    permission: "active".parse().unwrap(),
                }],
                data: Bytes::from_static(&[1, 2, 3, 4]),
            }],
        }
    }

    #[test]
    fn envelope_round_trip() {
        let trx = sample_transaction();
        let packed = PackedTransaction::from_transaction(&trx);
        assert_eq!(packed.unpack().unwrap(), trx);
    }

    #[test]
    fn varuint32_boundaries() {
        for v in [0u32, 1, 127, 128, 300, 16_383, 16_384, u32::MAX] {
            let mut w = ByteWriter::new();
            w.write_varuint32(v);
            let bytes = w.into_bytes();
            let mut r = ByteReader::new(&bytes);
            assert_eq!(r.read_varuint32().unwrap(), v);
            assert!(r.is_empty());
        }
    }

    #[test]
    fn varuint32_rejects_six_bytes() {
        let mut r = ByteReader::new(&[0x80, 0x80, 0x80, 0x80, 0x80, 0x01]);
        assert_eq!(r.read_varuint32(), Err(CodecError::VaruintOverflow));
    }

    #[test]
    fn truncated_envelope_is_an_eof() {
        let packed = sample_transaction().pack();
        let cut = &packed[..packed.len() - 2];
        assert!(matches!(
            Transaction::unpack(cut),
            Err(CodecError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut packed = sample_transaction().pack().to_vec();
        packed.push(0xff);
        assert_eq!(
            Transaction::unpack(&packed),
            Err(CodecError::TrailingBytes { remaining: 1 })
        );
    }

    #[test]
    fn reader_reads_primitives_in_order() {
        let mut w = ByteWriter::new();
        w.write_bool(true);
        w.write_u16(513);
        w.write_string("memo");
        w.write_asset(Asset::new(10_000, Symbol::new(4, "SYS").unwrap()));
        let bytes = w.into_bytes();

        let mut r = ByteReader::new(&bytes);
        assert!(r.read_bool().unwrap());
        assert_eq!(r.read_u16().unwrap(), 513);
        assert_eq!(r.read_string().unwrap(), "memo");
        assert_eq!(r.read_asset().unwrap().to_string(), "1.0000 SYS");
        assert!(r.expect_end().is_ok());
    }
}
