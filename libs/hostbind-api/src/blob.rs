use std::io::{self, Cursor, Read};

use serde_json::{Map, Value};

/// Read-only, non-seekable view over blob content.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputStream {
    data: Cursor<Vec<u8>>,
    pub name: Option<String>,
    pub length: Option<u64>,
    pub uri: Option<String>,
    pub blob_properties: Option<Map<String, Value>>,
    pub metadata: Option<Map<String, Value>>,
}

impl InputStream {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: Cursor::new(data.into()),
            ..Default::default()
        }
    }

    pub fn readable(&self) -> bool {
        true
    }

    pub fn seekable(&self) -> bool {
        false
    }

    pub fn writable(&self) -> bool {
        false
    }

    /// Everything not yet consumed by earlier reads.
    pub fn read_remaining(&mut self) -> Vec<u8> {
        let len = self.data.get_ref().len();
        let start = usize::try_from(self.data.position()).map_or(len, |pos| pos.min(len));
        self.data.get_mut().split_off(start)
    }
}

impl Read for InputStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.data.read(buf)
    }
}
