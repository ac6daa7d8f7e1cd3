//! Reader that cleans up common XMLTV breakage before parsing:
//! control characters become spaces and a bare `&` becomes `&amp;`.
//! Legal XML 1.0 single-byte chars: #x9 | #xA | #xD | [#x20-#x7E]

use std::io::{self, Read};

const CHUNK_SIZE: usize = 64 * 1024;
/// Longest `&name;` accepted as an entity
const MAX_ENTITY_LEN: usize = 10;

pub struct SanitizingReader<R> {
    inner: R,
    chunk: Vec<u8>,
    out: Vec<u8>,
    pos: usize,
    /// Trailing bytes from a possibly split entity
    carry: Vec<u8>,
    eof: bool,
}

impl<R: Read> SanitizingReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            chunk: vec![0u8; CHUNK_SIZE],
            // Slightly larger for escapes
            out: Vec::with_capacity(CHUNK_SIZE + CHUNK_SIZE / 2),
            pos: 0,
            carry: Vec::new(),
            eof: false,
        }
    }

    /// Returns false once the input and carry are exhausted
    fn refill(&mut self) -> io::Result<bool> {
        if self.eof && self.carry.is_empty() {
            return Ok(false);
        }

        let mut data = std::mem::take(&mut self.carry);
        if !self.eof {
            let n = loop {
                match self.inner.read(&mut self.chunk) {
                    Ok(n) => break n,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e),
                }
            };
            if n == 0 {
                self.eof = true;
            } else {
                data.extend_from_slice(&self.chunk[..n]);
            }
        }

        if !self.eof {
            if let Some(amp) = data.iter().rposition(|&b| b == b'&') {
                let tail = &data[amp..];
                if tail.len() <= MAX_ENTITY_LEN && !tail.contains(&b';') {
                    self.carry = data.split_off(amp);
                }
            }
        }

        self.out.clear();
        self.pos = 0;
        sanitize_into(&data, &mut self.out);
        Ok(true)
    }
}

impl<R: Read> Read for SanitizingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.pos >= self.out.len() {
            if !self.refill()? {
                return Ok(0);
            }
        }

        let available = &self.out[self.pos..];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.pos += n;
        Ok(n)
    }
}

fn sanitize_byte(b: u8) -> u8 {
    match b {
        0x09 | 0x0A | 0x0D => b,
        0x00..=0x1F | 0x7F => b' ',
        _ => b,
    }
}

pub(crate) fn sanitize_into(data: &[u8], out: &mut Vec<u8>) {
    for (i, &b) in data.iter().enumerate() {
        if b == b'&' && !is_entity_start(&data[i..]) {
            out.extend_from_slice(b"&amp;");
        } else {
            out.push(sanitize_byte(b));
        }
    }
}

/// `&#...` or `&name;` with a short alphanumeric name
fn is_entity_start(bytes: &[u8]) -> bool {
    if bytes.get(1) == Some(&b'#') {
        return true;
    }

    for (i, &b) in bytes.iter().enumerate().skip(1).take(MAX_ENTITY_LEN) {
        match b {
            b';' => return i > 1,
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' => {}
            _ => return false,
        }
    }
    false
}
