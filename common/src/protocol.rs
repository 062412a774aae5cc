// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ODoH framing: every variable-length field is a 2-byte big-endian length
// prefix followed by the payload (RFC 9230 Section 4 / Section 6).

use bytes::{Buf, BufMut};

/// Largest field a 2-byte length prefix can describe.
pub const MAX_FIELD_LEN: usize = u16::MAX as usize;

/// Read a big-endian `u16`, advancing `buf`.
///
/// Returns `None` instead of panicking when fewer than 2 bytes remain.
pub fn take_u16(buf: &mut &[u8]) -> Option<u16> {
    if buf.len() < 2 {
        return None;
    }
    Some(buf.get_u16())
}

/// Read a length-prefixed field, advancing `buf` past it.
///
/// Format: `[2 bytes: big-endian length] [N bytes: payload]`
pub fn take_prefixed<'a>(buf: &mut &'a [u8]) -> Option<&'a [u8]> {
    let len = take_u16(buf)? as usize;
    let rest: &'a [u8] = *buf;
    if rest.len() < len {
        return None;
    }
    let (field, tail) = rest.split_at(len);
    *buf = tail;
    Some(field)
}

/// Append a length-prefixed field.
///
/// Returns `None` if the payload does not fit a 2-byte prefix.
pub fn put_prefixed(out: &mut Vec<u8>, data: &[u8]) -> Option<()> {
    let len = u16::try_from(data.len()).ok()?;
    out.put_u16(len);
    out.put_slice(data);
    Some(())
}
