/// Key and path processing utility functions / 键与路径处理工具函数

use once_cell::sync::Lazy;
use regex::Regex;

/// Runs of characters that are not safe in an object name / 非字母数字字符
static UNSAFE_KEY_CHARS: Lazy<Regex> = Lazy::new(|| {
    Regex::new("[^a-zA-Z0-9]+").expect("static regex")
});

/// Make a key safe for use as an object name / 将键转换为安全的对象名
/// Every run of non-alphanumeric characters becomes a single `-` / 连续非字母数字字符替换为单个 -
/// "user:42/avatar.png" -> "user-42-avatar-png"
pub fn sanitize_key(key: &str) -> String {
    UNSAFE_KEY_CHARS.replace_all(key, "-").into_owned()
}

/// Join path segments and clean the result / 拼接并清理路径
/// Empty segments are skipped, `.` and `..` are resolved, no leading `/` / 空段被忽略
pub fn join_key(parts: &[&str]) -> String {
    let joined = parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("/");
    clean_path(&joined)
}

/// Clean path, handle ., .. and duplicate / / 清理路径，处理 . 和 .. 和重复的 /
fn clean_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    let mut parts: Vec<&str> = Vec::new();

    for part in path.split('/') {
        match part {
            "" | "." => continue,
            ".." => {
                parts.pop();
            }
            _ => parts.push(part),
        }
    }

    parts.join("/")
}

/// Get file extension (lowercase) / 获取文件扩展名
pub fn get_ext(path: &str) -> String {
    std::path::Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}
