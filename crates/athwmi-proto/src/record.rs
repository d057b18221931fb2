use athwmi_wire::{RecordReader, RecordWriter};
use bytes::Bytes;

use crate::error::Result;
use crate::generation::AbiContext;
use crate::ids::Command;

/// A fixed-layout wire record.
///
/// Every codec takes the attach-time [`AbiContext`] so records whose layout
/// differs between generations branch on it before reading any divergent
/// field.
pub trait Record: Sized {
    /// Name used in decode errors.
    const NAME: &'static str;

    fn encode(&self, ctx: &AbiContext, w: &mut RecordWriter) -> Result<()>;

    fn decode(ctx: &AbiContext, r: &mut RecordReader) -> Result<Self>;

    fn to_bytes(&self, ctx: &AbiContext) -> Result<Bytes> {
        let mut w = RecordWriter::new();
        self.encode(ctx, &mut w)?;
        Ok(w.freeze())
    }

    fn from_bytes(ctx: &AbiContext, bytes: impl Into<Bytes>) -> Result<Self> {
        let mut r = RecordReader::new(Self::NAME, bytes);
        Self::decode(ctx, &mut r)
    }
}

/// A record that is the argument of one or more commands.
pub trait CommandRecord: Record {
    /// Commands that take this record as their argument.
    const COMMANDS: &'static [Command];

    fn accepts(command: Command) -> bool {
        Self::COMMANDS.contains(&command)
    }
}

/// Write a field that only Main-generation records carry.
pub(crate) fn put_main_only(ctx: &AbiContext, w: &mut RecordWriter, value: u32) {
    if !ctx.is_tenx() {
        w.put_u32(value);
    }
}

/// Read a field that only Main-generation records carry; 0 on 10.x.
pub(crate) fn get_main_only(ctx: &AbiContext, r: &mut RecordReader) -> Result<u32> {
    if ctx.is_tenx() {
        Ok(0)
    } else {
        Ok(r.get_u32()?)
    }
}
