// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Attach-mode capture reads its bytes secondhand, from the text a syscall
//! tracer (`strace -e trace=read,write -s <n> -p <pid>`) prints rather than
//! from the traced process's file descriptors directly. `TraceSource`
//! abstracts where that text comes from; `SyscallTraceParser` turns one
//! line of it into the raw bytes a `read`/`write` call moved.

use async_trait::async_trait;

/// A line-oriented source of syscall trace text. The spawn-mode capture
/// never needs this — it owns the PTY master directly — but the attach
/// path has nothing else to read from.
#[async_trait]
pub trait TraceSource: Send {
    async fn next_line(&mut self) -> std::io::Result<Option<String>>;
}

/// Parses lines of the form:
/// `read(3, "hello\n", 1024)           = 6`
/// `write(1, "some \"quoted\" text", 18) = 18`
/// into the fd, the syscall name, and the decoded payload bytes. Lines that
/// don't match (tracer banners, unrelated syscalls, `<unfinished ...>`
/// continuations) are skipped.
pub struct SyscallTraceParser;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSyscall {
    pub syscall: String,
    pub fd: i32,
    pub bytes: Vec<u8>,
}

impl SyscallTraceParser {
    pub fn parse_line(line: &str) -> Option<ParsedSyscall> {
        let line = line.trim();
        let paren = line.find('(')?;
        let syscall = &line[..paren];
        if syscall != "read" && syscall != "write" {
            return None;
        }
        let rest = &line[paren + 1..];

        let mut parts = rest.splitn(2, ", ");
        let fd_str = parts.next()?;
        let fd: i32 = fd_str.trim().parse().ok()?;

        let after_fd = parts.next()?;
        let quote_start = after_fd.find('"')?;
        let quoted = &after_fd[quote_start..];
        let (content, _) = extract_quoted(quoted)?;
        let bytes = unescape(&content);

        Some(ParsedSyscall {
            syscall: syscall.to_string(),
            fd,
            bytes,
        })
    }
}

/// Finds the matching closing quote for a string starting with `"`,
/// respecting `\"` escapes. Returns the content between the quotes (without
/// them) and the byte offset just past the closing quote.
fn extract_quoted(s: &str) -> Option<(String, usize)> {
    let mut chars = s.char_indices();
    let (first_idx, first_char) = chars.next()?;
    if first_char != '"' {
        return None;
    }
    let mut content = String::new();
    let mut escaped = false;
    for (idx, c) in chars {
        if escaped {
            content.push(c);
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' => return Some((content, idx + first_idx + 1)),
            _ => content.push(c),
        }
    }
    None
}

/// Undoes strace's C-style escaping: `\n`, `\t`, `\r`, `\\`, `\"`, and
/// `\xHH` hex escapes. Unrecognized escapes are passed through literally.
fn unescape(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            let mut buf = [0u8; 4];
            out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        match chars.next() {
            Some('n') => out.push(b'\n'),
            Some('t') => out.push(b'\t'),
            Some('r') => out.push(b'\r'),
            Some('\\') => out.push(b'\\'),
            Some('"') => out.push(b'"'),
            Some('0') => out.push(0),
            Some('x') => {
                let hi = chars.next();
                let lo = chars.next();
                if let (Some(hi), Some(lo)) = (hi, lo) {
                    let hex: String = [hi, lo].iter().collect();
                    if let Ok(byte) = u8::from_str_radix(&hex, 16) {
                        out.push(byte);
                        continue;
                    }
                }
            }
            Some(other) => {
                let mut buf = [0u8; 4];
                out.extend_from_slice(other.encode_utf8(&mut buf).as_bytes());
            }
            None => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_simple_read_line() {
        let parsed = SyscallTraceParser::parse_line(r#"read(3, "hello\n", 1024)           = 6"#).unwrap();
        assert_eq!(parsed.syscall, "read");
        assert_eq!(parsed.fd, 3);
        assert_eq!(parsed.bytes, b"hello\n");
    }

    #[test]
    fn parses_escaped_quotes_inside_the_payload() {
        let parsed = SyscallTraceParser::parse_line(r#"write(1, "she said \"hi\"", 12) = 12"#).unwrap();
        assert_eq!(parsed.bytes, b"she said \"hi\"");
    }

    #[test]
    fn parses_hex_escapes() {
        let parsed = SyscallTraceParser::parse_line(r#"write(2, "\x00\x01\xff", 3) = 3"#).unwrap();
        assert_eq!(parsed.bytes, vec![0x00, 0x01, 0xff]);
    }

    #[test]
    fn ignores_unrelated_syscalls() {
        assert!(SyscallTraceParser::parse_line("openat(AT_FDCWD, \"/etc/passwd\", O_RDONLY) = 3").is_none());
    }

    #[test]
    fn ignores_banner_and_unfinished_lines() {
        assert!(SyscallTraceParser::parse_line("strace: Process 1234 attached").is_none());
        assert!(SyscallTraceParser::parse_line("read(3,  <unfinished ...>").is_none());
    }
}
