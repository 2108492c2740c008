//! Sources of octets for the decoder.
//!
//! The decoder needs to look at the first octet of a value before deciding
//! how to decode it. Instead of a full blown buffered stream, a source
//! therefore only needs to be able to hand out single octets and to take
//! back the last one it handed out.

use std::{cmp, io};


//------------ ByteSource ----------------------------------------------------

/// A source of octets with a one octet push back.
pub trait ByteSource {
    /// Reads the next octet.
    ///
    /// Returns `Ok(None)` if the source has reached its end.
    fn read_byte(&mut self) -> Result<Option<u8>, io::Error>;

    /// Pushes back the octet most recently returned by `read_byte`.
    ///
    /// Only one octet can be pushed back. Returns an error if there is no
    /// octet that could be pushed back.
    fn unread_byte(&mut self) -> Result<(), io::Error>;

    /// Reads octets into `buf`.
    ///
    /// Returns the number of octets read which may be less than the length
    /// of `buf`. A return value of zero for a non-empty buffer means that
    /// the end of the source has been reached.
    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<usize, io::Error> {
        let mut pos = 0;
        while pos < buf.len() {
            match self.read_byte()? {
                Some(octet) => {
                    buf[pos] = octet;
                    pos += 1;
                }
                None => break
            }
        }
        Ok(pos)
    }
}

impl<T: ByteSource + ?Sized> ByteSource for &mut T {
    fn read_byte(&mut self) -> Result<Option<u8>, io::Error> {
        (**self).read_byte()
    }

    fn unread_byte(&mut self) -> Result<(), io::Error> {
        (**self).unread_byte()
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<usize, io::Error> {
        (**self).read_bytes(buf)
    }
}


//------------ SliceSource ---------------------------------------------------

/// A source atop an octet slice.
#[derive(Clone, Debug)]
pub struct SliceSource<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceSource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        SliceSource { data, pos: 0 }
    }

    /// Returns the number of octets consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns the part of the slice not yet consumed.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }
}

impl ByteSource for SliceSource<'_> {
    fn read_byte(&mut self) -> Result<Option<u8>, io::Error> {
        let res = self.data.get(self.pos).copied();
        if res.is_some() {
            self.pos += 1;
        }
        Ok(res)
    }

    fn unread_byte(&mut self) -> Result<(), io::Error> {
        if self.pos == 0 {
            return Err(no_push_back())
        }
        self.pos -= 1;
        Ok(())
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<usize, io::Error> {
        let len = cmp::min(buf.len(), self.data.len() - self.pos);
        buf[..len].copy_from_slice(&self.data[self.pos..self.pos + len]);
        self.pos += len;
        Ok(len)
    }
}


//------------ ReadSource ----------------------------------------------------

/// A source atop anything implementing `io::Read`.
///
/// The source keeps the last octet it read around so it can be pushed back.
/// It does not do any buffering itself, so if `R` is something like a
/// socket or file, you will want to wrap it into an `io::BufReader` first.
#[derive(Debug)]
pub struct ReadSource<R> {
    reader: R,
    last: Option<u8>,
    pushed_back: bool,
}

impl<R> ReadSource<R> {
    pub fn new(reader: R) -> Self {
        ReadSource { reader, last: None, pushed_back: false }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: io::Read> ReadSource<R> {
    fn read_raw(&mut self, buf: &mut [u8]) -> Result<usize, io::Error> {
        loop {
            match self.reader.read(buf) {
                Ok(len) => return Ok(len),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => { }
                Err(err) => return Err(err)
            }
        }
    }
}

impl<R: io::Read> ByteSource for ReadSource<R> {
    fn read_byte(&mut self) -> Result<Option<u8>, io::Error> {
        if self.pushed_back {
            self.pushed_back = false;
            return Ok(self.last)
        }
        let mut buf = [0u8];
        self.last = match self.read_raw(&mut buf)? {
            0 => None,
            _ => Some(buf[0])
        };
        Ok(self.last)
    }

    fn unread_byte(&mut self) -> Result<(), io::Error> {
        if self.pushed_back || self.last.is_none() {
            return Err(no_push_back())
        }
        self.pushed_back = true;
        Ok(())
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<usize, io::Error> {
        if buf.is_empty() {
            return Ok(0)
        }
        if self.pushed_back {
            if let Some(octet) = self.last {
                self.pushed_back = false;
                buf[0] = octet;
                return Ok(1)
            }
        }
        let len = self.read_raw(buf)?;
        if len > 0 {
            self.last = Some(buf[len - 1]);
        }
        Ok(len)
    }
}


//------------ Limited -------------------------------------------------------

/// A source that ends after a given number of octets.
///
/// This is used to decode the content of a constructed value. Once the
/// declared length of the content has been consumed, the source reports
/// its end even if the underlying source has more data. Pushing back an
/// octet gives it back to the limit, too.
pub struct Limited<'a> {
    source: &'a mut dyn ByteSource,
    remaining: usize,
}

impl<'a> Limited<'a> {
    pub fn new(source: &'a mut dyn ByteSource, limit: usize) -> Self {
        Limited { source, remaining: limit }
    }

    /// Returns the number of octets left before the limit is reached.
    pub fn remaining(&self) -> usize {
        self.remaining
    }
}

impl ByteSource for Limited<'_> {
    fn read_byte(&mut self) -> Result<Option<u8>, io::Error> {
        if self.remaining == 0 {
            return Ok(None)
        }
        let res = self.source.read_byte()?;
        if res.is_some() {
            self.remaining -= 1;
        }
        Ok(res)
    }

    fn unread_byte(&mut self) -> Result<(), io::Error> {
        self.source.unread_byte()?;
        self.remaining += 1;
        Ok(())
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<usize, io::Error> {
        let len = cmp::min(buf.len(), self.remaining);
        let len = self.source.read_bytes(&mut buf[..len])?;
        self.remaining -= len;
        Ok(len)
    }
}


//------------ Helpers -------------------------------------------------------

fn no_push_back() -> io::Error {
    io::Error::new(io::ErrorKind::Other, "no octet to push back")
}


//============ Tests =========================================================
