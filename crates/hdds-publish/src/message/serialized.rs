// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

/// Pre-serialized message bytes.
///
/// Handed to the transport untouched; the publish path neither allocates nor
/// inspects the encoding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SerializedMessage {
    buffer: Vec<u8>,
}

impl SerializedMessage {
    pub fn new(buffer: Vec<u8>) -> Self {
        Self { buffer }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// An empty buffer is treated as a null message.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }
}

impl From<Vec<u8>> for SerializedMessage {
    fn from(buffer: Vec<u8>) -> Self {
        Self::new(buffer)
    }
}

impl From<&[u8]> for SerializedMessage {
    fn from(bytes: &[u8]) -> Self {
        Self::new(bytes.to_vec())
    }
}
