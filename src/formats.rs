//! On-disk BWT formats and their adapters.
//!
//! Every adapter decodes a file into the internal run stream plus per-comp
//! symbol counts, and encodes the run stream back out. The native format
//! carries its alphabet order in the header flags; the other formats pin a
//! canonical order.
//!
//! | format  | alphabet | body |
//! |---------|----------|------|
//! | native  | any      | header, counts, raw run stream |
//! | plain   | default  | one byte per position |
//! | plain_sorted | sorted | one byte per position |
//! | rfm     | sorted   | length-prefixed comp bytes, 8-byte aligned |
//! | sdsl    | sorted   | length-prefixed char bytes, 8-byte aligned |
//! | ropebwt | default  | 5-bit length + 3-bit comp per byte |
//! | sga     | default  | counted header, then ropebwt body |

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::str::FromStr;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use memmap2::Mmap;

use crate::alphabet::{Alphabet, AlphabeticOrder};
use crate::block_array::BlockArray;
use crate::codec::{Run, RunBuffer, SIGMA};
use crate::error::{Error, HeaderError, Result};

const BUFFER_SIZE: usize = 1 << 20;

/// Header of the native format: a tag, flags whose low byte holds the
/// alphabetic order, and the collection dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NativeHeader {
    pub flags: u32,
    pub sequences: u64,
    pub bases: u64,
}

impl NativeHeader {
    /// "!BWT" in little-endian byte order.
    pub const TAG: u32 = 0x5457_4221;
    const ALPHABET_MASK: u32 = 0xff;

    pub fn new(sequences: u64, bases: u64) -> Self {
        NativeHeader {
            flags: 0,
            sequences,
            bases,
        }
    }

    pub fn order(&self) -> AlphabeticOrder {
        AlphabeticOrder::from_code((self.flags & Self::ALPHABET_MASK) as u8)
    }

    pub fn set_order(&mut self, order: AlphabeticOrder) {
        self.flags = (self.flags & !Self::ALPHABET_MASK) | u32::from(order.code());
    }

    pub fn read<R: Read>(input: &mut R) -> std::result::Result<Self, HeaderError> {
        let tag = input
            .read_u32::<LittleEndian>()
            .map_err(|_| HeaderError::Truncated)?;
        if tag != Self::TAG {
            return Err(HeaderError::InvalidMagicNumber {
                expected: u64::from(Self::TAG),
                found: u64::from(tag),
            });
        }
        let flags = input
            .read_u32::<LittleEndian>()
            .map_err(|_| HeaderError::Truncated)?;
        let sequences = input
            .read_u64::<LittleEndian>()
            .map_err(|_| HeaderError::Truncated)?;
        let bases = input
            .read_u64::<LittleEndian>()
            .map_err(|_| HeaderError::Truncated)?;
        Ok(NativeHeader {
            flags,
            sequences,
            bases,
        })
    }

    pub fn write<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        out.write_u32::<LittleEndian>(Self::TAG)?;
        out.write_u32::<LittleEndian>(self.flags)?;
        out.write_u64::<LittleEndian>(self.sequences)?;
        out.write_u64::<LittleEndian>(self.bases)?;
        Ok(())
    }
}

/// Header of the RopeBWT format: a bare tag.
#[derive(Clone, Copy, Debug, Default)]
pub struct RopeHeader;

impl RopeHeader {
    /// "RLE" followed by the length byte 6.
    pub const TAG: u32 = 0x0645_4C52;

    pub fn read<R: Read>(input: &mut R) -> std::result::Result<Self, HeaderError> {
        let tag = input
            .read_u32::<LittleEndian>()
            .map_err(|_| HeaderError::Truncated)?;
        if tag != Self::TAG {
            return Err(HeaderError::InvalidMagicNumber {
                expected: u64::from(Self::TAG),
                found: u64::from(tag),
            });
        }
        Ok(RopeHeader)
    }

    pub fn write<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        out.write_u32::<LittleEndian>(Self::TAG)
    }
}

/// Header of the SGA format.
#[derive(Clone, Copy, Debug, Default)]
pub struct SgaHeader {
    pub sequences: u64,
    pub bases: u64,
    /// Number of run bytes in the body.
    pub bytes: u64,
    pub flags: u32,
}

impl SgaHeader {
    pub const TAG: u16 = 0xCACA;
    pub const DEFAULT_FLAGS: u32 = 0;

    pub fn read<R: Read>(input: &mut R) -> std::result::Result<Self, HeaderError> {
        let tag = input
            .read_u16::<LittleEndian>()
            .map_err(|_| HeaderError::Truncated)?;
        if tag != Self::TAG {
            return Err(HeaderError::InvalidMagicNumber {
                expected: u64::from(Self::TAG),
                found: u64::from(tag),
            });
        }
        let sequences = input
            .read_u64::<LittleEndian>()
            .map_err(|_| HeaderError::Truncated)?;
        let bases = input
            .read_u64::<LittleEndian>()
            .map_err(|_| HeaderError::Truncated)?;
        let bytes = input
            .read_u64::<LittleEndian>()
            .map_err(|_| HeaderError::Truncated)?;
        let flags = input
            .read_u32::<LittleEndian>()
            .map_err(|_| HeaderError::Truncated)?;
        if flags != Self::DEFAULT_FLAGS {
            return Err(HeaderError::InvalidFlags(u64::from(flags)));
        }
        Ok(SgaHeader {
            sequences,
            bases,
            bytes,
            flags,
        })
    }

    pub fn write<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        out.write_u16::<LittleEndian>(Self::TAG)?;
        out.write_u64::<LittleEndian>(self.sequences)?;
        out.write_u64::<LittleEndian>(self.bases)?;
        out.write_u64::<LittleEndian>(self.bytes)?;
        out.write_u32::<LittleEndian>(self.flags)?;
        Ok(())
    }
}

/// The native format: header, per-comp counts, and the raw run stream.
pub struct NativeFormat;

impl NativeFormat {
    pub fn read<R: Read>(input: &mut R) -> Result<(BlockArray, Vec<u64>, NativeHeader)> {
        let header = NativeHeader::read(input).map_err(into_io)?;
        let mut counts = vec![0u64; SIGMA];
        for count in counts.iter_mut() {
            *count = input.read_u64::<LittleEndian>()?;
        }
        let bytes = input.read_u64::<LittleEndian>()?;
        let data = BlockArray::read_from(input, bytes)?;
        Ok((data, counts, header))
    }

    pub fn write<W: Write>(
        out: &mut W,
        data: &BlockArray,
        counts: &[u64],
        header: &NativeHeader,
    ) -> Result<()> {
        header.write(out)?;
        for comp in 0..SIGMA {
            out.write_u64::<LittleEndian>(counts.get(comp).copied().unwrap_or(0))?;
        }
        out.write_u64::<LittleEndian>(data.len())?;
        data.write_to(out)?;
        Ok(())
    }
}

/// A header error with the path still unknown; `with_path` fills it in at
/// the file-level entry points.
fn into_io(source: HeaderError) -> Error {
    Error::Header {
        path: std::path::PathBuf::new(),
        source,
    }
}

/// One byte per position, mapped through the alphabet tables.
pub struct PlainFormat;

impl PlainFormat {
    pub fn decode(bytes: &[u8], alpha: &Alphabet) -> (BlockArray, Vec<u64>) {
        let mut data = BlockArray::new();
        let mut counts = vec![0u64; alpha.sigma];
        let mut buffer = RunBuffer::new();
        for &ch in bytes {
            let comp = alpha.char2comp[ch as usize];
            if buffer.add(u64::from(comp), 1) {
                emit(&mut data, &mut counts, buffer.run);
            }
        }
        buffer.flush();
        emit(&mut data, &mut counts, buffer.run);
        (data, counts)
    }

    pub fn encode<W: Write>(out: &mut W, data: &BlockArray, alpha: &Alphabet) -> Result<()> {
        let mut buffer = Vec::with_capacity(BUFFER_SIZE);
        let mut rle_pos = 0;
        while rle_pos < data.len() {
            let (comp, mut length) = Run::read(data, &mut rle_pos);
            let ch = alpha.comp2char[comp as usize];
            while length > 0 {
                if buffer.len() == BUFFER_SIZE {
                    out.write_all(&buffer)?;
                    buffer.clear();
                }
                let chunk = (BUFFER_SIZE - buffer.len()).min(length as usize);
                buffer.resize(buffer.len() + chunk, ch);
                length -= chunk as u64;
            }
        }
        out.write_all(&buffer)?;
        Ok(())
    }
}

/// Length-prefixed byte arrays: a 64-bit bit count, then the bytes padded
/// to a multiple of 8.
pub struct IntVectorFormat;

impl IntVectorFormat {
    pub fn decode(bytes: &[u8], alpha: &Alphabet) -> Result<(BlockArray, Vec<u64>)> {
        if bytes.len() < 8 {
            return Err(invalid_data("missing length prefix"));
        }
        let bits = u64::from_le_bytes(bytes[..8].try_into().unwrap());
        let elements = (bits / 8) as usize;
        if bytes.len() < 8 + elements {
            return Err(invalid_data("body shorter than the length prefix"));
        }
        Ok(PlainFormat::decode(&bytes[8..8 + elements], alpha))
    }

    pub fn encode<W: Write>(out: &mut W, data: &BlockArray, alpha: &Alphabet) -> Result<()> {
        let total = total_length(data);
        out.write_u64::<LittleEndian>(total * 8)?;
        PlainFormat::encode(out, data, alpha)?;
        let padding = total.next_multiple_of(8) - total;
        out.write_all(&vec![0u8; padding as usize])?;
        Ok(())
    }
}

/// Maximum run length of the 5-bit rope codes.
const ROPE_MAX_RUN: u64 = 31;

#[inline]
fn rope_encode(comp: u8, length: u64) -> u8 {
    (comp << 5) | length as u8
}

#[inline]
fn rope_decode(code: u8) -> (u8, u64) {
    (code >> 5, u64::from(code & 0x1f))
}

/// 5-bit length + 3-bit comp per byte, as written by RopeBWT.
pub struct RopeFormat;

impl RopeFormat {
    pub fn read<R: Read>(input: &mut R) -> Result<(BlockArray, Vec<u64>)> {
        RopeHeader::read(input).map_err(into_io)?;
        Self::decode_body(input, None)
    }

    pub fn write<W: Write>(out: &mut W, data: &BlockArray) -> Result<()> {
        RopeHeader.write(out)?;
        Self::encode_body(out, data)?;
        Ok(())
    }

    /// Decodes rope codes until EOF, or exactly `limit` bytes.
    fn decode_body<R: Read>(input: &mut R, limit: Option<u64>) -> Result<(BlockArray, Vec<u64>)> {
        let mut data = BlockArray::new();
        let mut counts = vec![0u64; SIGMA];
        let mut buffer = RunBuffer::new();
        let mut chunk = vec![0u8; BUFFER_SIZE];
        let mut remaining = limit;

        loop {
            let want = match remaining {
                Some(0) => break,
                Some(n) => (n as usize).min(chunk.len()),
                None => chunk.len(),
            };
            let got = input.read(&mut chunk[..want])?;
            if got == 0 {
                if remaining.is_some() {
                    return Err(invalid_data("run stream ends before its declared size"));
                }
                break;
            }
            if let Some(n) = remaining.as_mut() {
                *n -= got as u64;
            }
            for &code in &chunk[..got] {
                let (comp, length) = rope_decode(code);
                if comp as usize >= SIGMA {
                    return Err(invalid_data("invalid symbol in run code"));
                }
                if buffer.add(u64::from(comp), length) {
                    emit(&mut data, &mut counts, buffer.run);
                }
            }
        }
        buffer.flush();
        emit(&mut data, &mut counts, buffer.run);
        Ok((data, counts))
    }

    /// Encodes the run stream as rope codes; returns the number of codes.
    fn encode_body<W: Write>(out: &mut W, data: &BlockArray) -> Result<u64> {
        let mut buffer = Vec::with_capacity(BUFFER_SIZE);
        let mut written = 0u64;
        let mut rle_pos = 0;
        while rle_pos < data.len() {
            let (comp, mut length) = Run::read(data, &mut rle_pos);
            while length > ROPE_MAX_RUN {
                buffer.push(rope_encode(comp, ROPE_MAX_RUN));
                length -= ROPE_MAX_RUN;
                if buffer.len() == BUFFER_SIZE {
                    out.write_all(&buffer)?;
                    written += buffer.len() as u64;
                    buffer.clear();
                }
            }
            buffer.push(rope_encode(comp, length));
            if buffer.len() == BUFFER_SIZE {
                out.write_all(&buffer)?;
                written += buffer.len() as u64;
                buffer.clear();
            }
        }
        out.write_all(&buffer)?;
        written += buffer.len() as u64;
        Ok(written)
    }

    /// Number of rope codes the run stream needs.
    fn encoded_size(data: &BlockArray) -> u64 {
        let mut codes = 0u64;
        let mut rle_pos = 0;
        while rle_pos < data.len() {
            let (_, length) = Run::read(data, &mut rle_pos);
            codes += length.div_ceil(ROPE_MAX_RUN);
        }
        codes
    }
}

/// SGA assembler format: a counted header, then a rope body.
pub struct SgaFormat;

impl SgaFormat {
    pub fn read<R: Read>(input: &mut R) -> Result<(BlockArray, Vec<u64>, SgaHeader)> {
        let header = SgaHeader::read(input).map_err(into_io)?;
        let (data, counts) = RopeFormat::decode_body(input, Some(header.bytes))?;
        Ok((data, counts, header))
    }

    pub fn write<W: Write>(out: &mut W, data: &BlockArray, info: &NativeHeader) -> Result<()> {
        let header = SgaHeader {
            sequences: info.sequences,
            bases: info.bases,
            bytes: RopeFormat::encoded_size(data),
            flags: SgaHeader::DEFAULT_FLAGS,
        };
        header.write(out)?;
        RopeFormat::encode_body(out, data)?;
        Ok(())
    }
}

#[inline]
fn emit(data: &mut BlockArray, counts: &mut [u64], run: (u64, u64)) {
    if run.1 > 0 {
        Run::write(data, run.0 as u8, run.1);
        counts[run.0 as usize] += run.1;
    }
}

fn invalid_data(message: &str) -> Error {
    Error::Io(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        message.to_string(),
    ))
}

fn total_length(data: &BlockArray) -> u64 {
    let mut total = 0;
    let mut rle_pos = 0;
    while rle_pos < data.len() {
        let (_, length) = Run::read(data, &mut rle_pos);
        total += length;
    }
    total
}

/// Runtime selection of a format adapter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatKind {
    Native,
    Plain,
    PlainSorted,
    Rfm,
    Sdsl,
    Rope,
    Sga,
}

impl FromStr for FormatKind {
    type Err = Error;

    fn from_str(tag: &str) -> Result<Self> {
        match tag {
            "native" => Ok(FormatKind::Native),
            "plain" | "plain_default" => Ok(FormatKind::Plain),
            "plain_sorted" => Ok(FormatKind::PlainSorted),
            "rfm" => Ok(FormatKind::Rfm),
            "sdsl" => Ok(FormatKind::Sdsl),
            "rope" | "ropebwt" => Ok(FormatKind::Rope),
            "sga" => Ok(FormatKind::Sga),
            _ => Err(Error::UnknownFormat(tag.to_string())),
        }
    }
}

impl FormatKind {
    pub fn tag(self) -> &'static str {
        match self {
            FormatKind::Native => "native",
            FormatKind::Plain => "plain_default",
            FormatKind::PlainSorted => "plain_sorted",
            FormatKind::Rfm => "rfm",
            FormatKind::Sdsl => "sdsl",
            FormatKind::Rope => "ropebwt",
            FormatKind::Sga => "sga",
        }
    }

    /// The alphabetic order the format pins, if any.
    pub fn order(self) -> AlphabeticOrder {
        match self {
            FormatKind::Native => AlphabeticOrder::Any,
            FormatKind::Plain | FormatKind::Rope | FormatKind::Sga => AlphabeticOrder::Default,
            FormatKind::PlainSorted | FormatKind::Rfm | FormatKind::Sdsl => AlphabeticOrder::Sorted,
        }
    }

    /// The alphabet tables used to decode the body.
    fn decoding_alphabet(self) -> Alphabet {
        match self {
            // RFM bodies store comp values, not characters.
            FormatKind::Rfm => Alphabet::identity(SIGMA),
            other => Alphabet::canonical(other.order()),
        }
    }

    /// Reads a BWT file into the internal run stream, returning the
    /// per-comp counts and the alphabetic order of the result.
    pub fn load(self, path: &Path) -> Result<(BlockArray, Vec<u64>, AlphabeticOrder)> {
        match self {
            FormatKind::Native => {
                let mut input = BufReader::new(File::open(path)?);
                let (data, counts, header) = NativeFormat::read(&mut input)
                    .map_err(|error| with_path(error, path))?;
                Ok((data, counts, header.order()))
            }
            FormatKind::Plain | FormatKind::PlainSorted | FormatKind::Rfm | FormatKind::Sdsl => {
                let file = File::open(path)?;
                let mapped = unsafe { Mmap::map(&file)? };
                let alpha = self.decoding_alphabet();
                let (data, counts) = match self {
                    FormatKind::Plain | FormatKind::PlainSorted => {
                        PlainFormat::decode(&mapped, &alpha)
                    }
                    _ => IntVectorFormat::decode(&mapped, &alpha)
                        .map_err(|error| with_path(error, path))?,
                };
                Ok((data, counts, self.order()))
            }
            FormatKind::Rope => {
                let mut input = BufReader::new(File::open(path)?);
                let (data, counts) =
                    RopeFormat::read(&mut input).map_err(|error| with_path(error, path))?;
                Ok((data, counts, self.order()))
            }
            FormatKind::Sga => {
                let mut input = BufReader::new(File::open(path)?);
                let (data, counts, _) =
                    SgaFormat::read(&mut input).map_err(|error| with_path(error, path))?;
                Ok((data, counts, self.order()))
            }
        }
    }

    /// Writes the run stream to a file in this format.
    pub fn save(self, path: &Path, data: &BlockArray, header: &NativeHeader) -> Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        match self {
            FormatKind::Native => {
                let mut counts = vec![0u64; SIGMA];
                let mut rle_pos = 0;
                while rle_pos < data.len() {
                    let (comp, length) = Run::read(data, &mut rle_pos);
                    counts[comp as usize] += length;
                }
                NativeFormat::write(&mut out, data, &counts, header)?;
            }
            FormatKind::Plain | FormatKind::PlainSorted => {
                PlainFormat::encode(&mut out, data, &Alphabet::canonical(self.order()))?;
            }
            FormatKind::Rfm | FormatKind::Sdsl => {
                IntVectorFormat::encode(&mut out, data, &self.decoding_alphabet())?;
            }
            FormatKind::Rope => RopeFormat::write(&mut out, data)?,
            FormatKind::Sga => SgaFormat::write(&mut out, data, header)?,
        }
        out.flush()?;
        Ok(())
    }
}

fn with_path(error: Error, path: &Path) -> Error {
    match error {
        Error::Header { source, .. } => Error::header(path, source),
        Error::Io(source) if source.kind() == std::io::ErrorKind::InvalidData => {
            Error::TruncatedStream {
                path: path.to_path_buf(),
            }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &[u8] = b"CCCCAAGGT$$NNNAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAG$";

    fn sample_stream() -> (BlockArray, Vec<u64>) {
        PlainFormat::decode(SAMPLE, &Alphabet::dna_default())
    }

    fn expand(data: &BlockArray, alpha: &Alphabet) -> Vec<u8> {
        let mut out = Vec::new();
        let mut rle_pos = 0;
        while rle_pos < data.len() {
            let (comp, length) = Run::read(data, &mut rle_pos);
            out.extend(std::iter::repeat(alpha.comp2char[comp as usize]).take(length as usize));
        }
        out
    }

    #[test]
    fn plain_round_trip() {
        let (data, counts) = sample_stream();
        assert_eq!(counts.iter().sum::<u64>(), SAMPLE.len() as u64);
        assert_eq!(counts[0], 3);

        let mut bytes = Vec::new();
        PlainFormat::encode(&mut bytes, &data, &Alphabet::dna_default()).unwrap();
        let (reread, recounts) = PlainFormat::decode(&bytes, &Alphabet::dna_default());
        assert_eq!(recounts, counts);
        assert_eq!(
            expand(&reread, &Alphabet::dna_default()),
            expand(&data, &Alphabet::dna_default())
        );
    }

    #[test]
    fn rope_round_trip() {
        let (data, counts) = sample_stream();
        let mut bytes = Vec::new();
        RopeFormat::write(&mut bytes, &data).unwrap();
        assert_eq!(
            bytes.len() as u64,
            4 + RopeFormat::encoded_size(&data),
            "every run over 31 symbols costs an extra code"
        );

        let (reread, recounts) = RopeFormat::read(&mut bytes.as_slice()).unwrap();
        assert_eq!(recounts, counts);
        assert_eq!(
            expand(&reread, &Alphabet::dna_default()),
            expand(&data, &Alphabet::dna_default())
        );
    }

    #[test]
    fn rope_rejects_bad_tag() {
        let bytes = [0u8; 16];
        assert!(RopeFormat::read(&mut bytes.as_ref()).is_err());
    }

    #[test]
    fn sga_round_trip() {
        let (data, counts) = sample_stream();
        let info = NativeHeader::new(3, SAMPLE.len() as u64);
        let mut bytes = Vec::new();
        SgaFormat::write(&mut bytes, &data, &info).unwrap();

        let (reread, recounts, header) = SgaFormat::read(&mut bytes.as_slice()).unwrap();
        assert_eq!(header.sequences, 3);
        assert_eq!(header.bases, SAMPLE.len() as u64);
        assert_eq!(recounts, counts);
        assert_eq!(
            expand(&reread, &Alphabet::dna_default()),
            expand(&data, &Alphabet::dna_default())
        );
    }

    #[test]
    fn sga_detects_truncation() {
        let (data, _) = sample_stream();
        let info = NativeHeader::new(3, SAMPLE.len() as u64);
        let mut bytes = Vec::new();
        SgaFormat::write(&mut bytes, &data, &info).unwrap();
        bytes.truncate(bytes.len() - 1);
        assert!(SgaFormat::read(&mut bytes.as_slice()).is_err());
    }

    #[test]
    fn native_round_trip() {
        let (data, counts) = sample_stream();
        let mut header = NativeHeader::new(3, SAMPLE.len() as u64);
        header.set_order(AlphabeticOrder::Default);

        let mut bytes = Vec::new();
        NativeFormat::write(&mut bytes, &data, &counts, &header).unwrap();
        let (reread, recounts, reheader) = NativeFormat::read(&mut bytes.as_slice()).unwrap();
        assert_eq!(reheader, header);
        assert_eq!(reheader.order(), AlphabeticOrder::Default);
        assert_eq!(recounts, counts);
        assert_eq!(
            expand(&reread, &Alphabet::dna_default()),
            expand(&data, &Alphabet::dna_default())
        );
    }

    #[test]
    fn int_vector_round_trip() {
        let bwt = b"GNTAA$$TTT";
        let (data, counts) = PlainFormat::decode(bwt, &Alphabet::dna_sorted());
        let mut bytes = Vec::new();
        IntVectorFormat::encode(&mut bytes, &data, &Alphabet::dna_sorted()).unwrap();
        assert_eq!(bytes.len() % 8, 0, "body is 8-byte aligned");

        let (reread, recounts) = IntVectorFormat::decode(&bytes, &Alphabet::dna_sorted()).unwrap();
        assert_eq!(recounts, counts);
        assert_eq!(
            expand(&reread, &Alphabet::dna_sorted()),
            expand(&data, &Alphabet::dna_sorted())
        );
    }

    #[test]
    fn format_tags_parse() {
        assert_eq!("native".parse::<FormatKind>().unwrap(), FormatKind::Native);
        assert_eq!("sga".parse::<FormatKind>().unwrap(), FormatKind::Sga);
        assert_eq!("ropebwt".parse::<FormatKind>().unwrap(), FormatKind::Rope);
        assert!("unknown".parse::<FormatKind>().is_err());
    }
}
