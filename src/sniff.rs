//! Content type sniffing / 内容类型检测
//!
//! Looks at the first bytes of a payload and names its MIME type. Only a
//! prefix is inspected, so a payload cut at `SNIFF_LEN` must not be rejected
//! as text because a multi-byte character was split.

use serde::de::IgnoredAny;
use serde::Deserialize;

use crate::utils::get_ext;

/// Bytes inspected to detect a content type / 检测所读取的字节数
pub const SNIFF_LEN: usize = 3072;

pub const OCTET_STREAM: &str = "application/octet-stream";
pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Binary signatures checked in order / 二进制文件签名
const SIGNATURES: &[(&[u8], &str)] = &[
    (b"\x89PNG\r\n\x1a\n", "image/png"),
    (b"\xff\xd8\xff", "image/jpeg"),
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
    (b"%PDF-", "application/pdf"),
    (b"PK\x03\x04", "application/zip"),
    (b"\x1f\x8b", "application/gzip"),
    (b"BZh", "application/x-bzip2"),
    (b"7z\xbc\xaf\x27\x1c", "application/x-7z-compressed"),
    (b"\x7fELF", "application/x-elf"),
    (b"%!PS", "application/postscript"),
    (b"\x00asm", "application/wasm"),
];

/// Detect the MIME type of a payload prefix / 检测数据前缀的MIME类型
/// `truncated` tells whether more data follows the prefix / 前缀之后是否还有数据
pub fn detect(prefix: &[u8], truncated: bool) -> &'static str {
    let prefix = &prefix[..prefix.len().min(SNIFF_LEN)];

    for &(magic, mime) in SIGNATURES {
        if prefix.starts_with(magic) {
            return mime;
        }
    }

    if prefix.len() >= 12 && &prefix[..4] == b"RIFF" && &prefix[8..12] == b"WEBP" {
        return "image/webp";
    }

    let text = match text_prefix(prefix, truncated) {
        Some(text) => text,
        None => return OCTET_STREAM,
    };

    let trimmed = text.trim_start_matches('\u{feff}').trim_start();
    let lower = trimmed
        .chars()
        .take(16)
        .collect::<String>()
        .to_ascii_lowercase();

    if lower.starts_with("<?xml") {
        return "text/xml; charset=utf-8";
    }
    if lower.starts_with("<!doctype html") || lower.starts_with("<html") {
        return "text/html; charset=utf-8";
    }
    if (trimmed.starts_with('{') || trimmed.starts_with('[')) && is_json(trimmed, truncated) {
        return "application/json";
    }

    TEXT_PLAIN
}

/// Detect content type, falling back to the key's extension / 检测内容类型，失败时按扩展名推断
pub fn detect_with_key(prefix: &[u8], truncated: bool, key: &str) -> String {
    let sniffed = detect(prefix, truncated);
    if sniffed != OCTET_STREAM {
        return sniffed.to_string();
    }

    let ext = get_ext(key);
    if ext.is_empty() {
        return sniffed.to_string();
    }
    mime_guess::from_ext(&ext)
        .first()
        .map(|m| m.essence_str().to_string())
        .unwrap_or_else(|| sniffed.to_string())
}

/// A prefix cut at the read limit may end mid-document / 截断的前缀允许在文档中间结束
fn is_json(text: &str, truncated: bool) -> bool {
    let mut de = serde_json::Deserializer::from_str(text);
    match IgnoredAny::deserialize(&mut de) {
        Ok(_) => de.end().is_ok(),
        Err(e) => truncated && e.is_eof(),
    }
}

/// UTF-8 text without control characters, tolerating a cut trailing character
fn text_prefix(prefix: &[u8], truncated: bool) -> Option<&str> {
    let text = match std::str::from_utf8(prefix) {
        Ok(text) => text,
        // error_len() == None: input ended in the middle of a character
        Err(e) if truncated && e.error_len().is_none() => {
            std::str::from_utf8(&prefix[..e.valid_up_to()]).ok()?
        }
        Err(_) => return None,
    };

    let binary = text
        .chars()
        .any(|c| c.is_control() && !matches!(c, '\n' | '\r' | '\t' | '\u{c}'));
    if binary {
        None
    } else {
        Some(text)
    }
}
