//! 促销码 key 的生成与校验
//!
//! key 形如 `XXXX-XXXX-XXXX`，字符集剔除了易混淆的 I 和 O。
//! 生成是纯随机的，唯一性由数据库唯一约束保证（冲突即重新生成）。

use rand::Rng;
use regex::Regex;
use std::sync::LazyLock;

use crate::error::{PromoError, Result};

/// 可用字符集（大写字母去掉 I/O，加数字）
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ0123456789";

/// 每组字符数
const GROUP_LEN: usize = 4;

/// 组数
const GROUP_COUNT: usize = 3;

static CODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^[A-Z0-9]{4}-[A-Z0-9]{4}-[A-Z0-9]{4}$").expect("valid pattern"));

/// 生成一个随机促销码 key
///
/// key 空间约为 34^12，随机冲突概率可以忽略，
/// 发放侧对唯一约束冲突做无界重试即可。
pub fn random_key() -> String {
    let mut rng = rand::rng();
    let mut groups = Vec::with_capacity(GROUP_COUNT);
    for _ in 0..GROUP_COUNT {
        let group: String = (0..GROUP_LEN)
            .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
            .collect();
        groups.push(group);
    }
    groups.join("-")
}

/// 校验 key 格式
///
/// 只做格式检查，不访问存储；格式不符直接返回 `InvalidKey`。
pub fn validate(key: &str) -> Result<()> {
    if CODE_PATTERN.is_match(key) {
        Ok(())
    } else {
        Err(PromoError::InvalidKey)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_key_is_well_formed() {
        for _ in 0..100 {
            let key = random_key();
            assert!(validate(&key).is_ok(), "generated key {} is malformed", key);
        }
    }

    #[test]
    fn test_random_key_avoids_ambiguous_chars() {
        for _ in 0..200 {
            let key = random_key();
            assert!(!key.contains('I'), "key {} contains ambiguous I", key);
            assert!(!key.contains('O'), "key {} contains ambiguous O", key);
        }
    }

    #[test]
    fn test_validate_accepts_canonical_form() {
        assert!(validate("ABCD-1234-WXYZ").is_ok());
        assert!(validate("0000-0000-0000").is_ok());
    }

    #[test]
    fn test_validate_rejects_malformed_keys() {
        assert!(matches!(validate(""), Err(PromoError::InvalidKey)));
        assert!(matches!(validate("abcd-1234-wxyz"), Err(PromoError::InvalidKey)));
        assert!(matches!(validate("ABCD-1234"), Err(PromoError::InvalidKey)));
        assert!(matches!(validate("ABCD1234WXYZ"), Err(PromoError::InvalidKey)));
        // 合法前缀后面跟着多余字符也必须拒绝
        assert!(matches!(
            validate("ABCD-1234-WXYZ-0000"),
            Err(PromoError::InvalidKey)
        ));
        assert!(matches!(
            validate("ABCD-1234-WXYZextra"),
            Err(PromoError::InvalidKey)
        ));
    }
}
