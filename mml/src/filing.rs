//! # Serialization interface
//!
//! Interface to serialize and to deserialize lattice and LOCO files to/from JSON.

use std::{
    fmt::Debug,
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use crate::{MmlError, Result};

/// Encoding and decoding
pub trait Codec
where
    Self: Sized + serde::ser::Serialize + for<'de> serde::de::Deserialize<'de>,
{
    /// Decodes object from [std::io::Read]
    #[inline]
    fn decode<R>(reader: &mut R) -> Result<Self>
    where
        R: Read,
    {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Encodes object to [std::io::Write]
    ///
    /// The JSON document is indented with 2 spaces
    #[inline]
    fn encode<W>(&self, writer: &mut W) -> Result<()>
    where
        W: Write,
    {
        serde_json::to_writer_pretty(&mut *writer, self)?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

impl<T> Filing for T where T: Codec {}

/// Encoding and decoding to/from [File]
pub trait Filing: Codec {
    /// Decodes object from given path
    fn from_path<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path> + Debug,
    {
        log::info!("decoding from {path:?}");
        let file = File::open(&path).map_err(|e| MmlError::Open(e, path.as_ref().to_path_buf()))?;
        let mut buffer = BufReader::new(file);
        Self::decode(&mut buffer)
    }

    /// Encodes object to given path
    fn to_path<P>(&self, path: P) -> Result<()>
    where
        P: AsRef<Path> + Debug,
    {
        log::info!("encoding to {path:?}");
        let file =
            File::create(&path).map_err(|e| MmlError::Create(e, path.as_ref().to_path_buf()))?;
        let mut buffer = BufWriter::new(file);
        self.encode(&mut buffer)?;
        buffer.flush()?;
        Ok(())
    }
}
