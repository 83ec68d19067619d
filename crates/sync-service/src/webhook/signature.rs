//! 回调签名验证
//!
//! 方案：部署时约定的静态共享密钥，对未经任何改动的原始请求体
//! 计算 HMAC-SHA256，十六进制编码后与请求头中的签名比对。比对
//! 通过 `Mac::verify_slice` 完成（常量时间），避免计时侧信道。
//!
//! 验证必须发生在 JSON 解析之前：解析-再序列化不保证与签名时的
//! 字节序列一致。

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// 审计日志中保留的签名前缀长度
const SIGNATURE_PREFIX_LEN: usize = 12;

/// 验证回调签名
///
/// 密钥为空或签名为空一律拒绝——“未配置密钥”不等于“放行一切”。
pub fn verify(raw_body: &[u8], received_signature: &str, secret: &str) -> bool {
    if secret.is_empty() || received_signature.is_empty() {
        return false;
    }

    let Ok(signature_bytes) = hex::decode(received_signature.trim()) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(raw_body);
    mac.verify_slice(&signature_bytes).is_ok()
}

/// 计算请求体的十六进制签名
///
/// 服务商侧的签名算法；这里用于测试构造合法请求。
pub fn sign(raw_body: &[u8], secret: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .unwrap_or_else(|_| unreachable!("HMAC 密钥允许任意长度"));
    mac.update(raw_body);
    hex::encode(mac.finalize().into_bytes())
}

/// 截取签名前缀用于审计展示，完整签名不落日志
pub fn signature_prefix(signature: &str) -> String {
    signature.chars().take(SIGNATURE_PREFIX_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec-test-0001";

    #[test]
    fn test_verify_roundtrip() {
        let body = br#"{"event":"localShipments.completed"}"#;
        let signature = sign(body, SECRET);
        assert!(verify(body, &signature, SECRET));
    }

    #[test]
    fn test_verify_rejects_wrong_signature() {
        let body = b"payload";
        let wrong = "0".repeat(64);
        assert!(!verify(body, &wrong, SECRET));
        // 非 hex 字符串同样拒绝
        assert!(!verify(body, "not-hex!!", SECRET));
    }

    #[test]
    fn test_verify_rejects_modified_body() {
        let signature = sign(br#"{"amount":100}"#, SECRET);
        assert!(!verify(br#"{"amount":999}"#, &signature, SECRET));
    }

    #[test]
    fn test_empty_secret_never_accepts() {
        let body = b"payload";
        let signature = sign(body, SECRET);
        assert!(!verify(body, &signature, ""));
    }

    #[test]
    fn test_empty_signature_rejected() {
        assert!(!verify(b"payload", "", SECRET));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let body = b"payload";
        let signature = sign(body, "other-secret");
        assert!(!verify(body, &signature, SECRET));
    }

    #[test]
    fn test_signature_is_hex_sha256() {
        let signature = sign(b"x", SECRET);
        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_signature_prefix() {
        let signature = sign(b"x", SECRET);
        let prefix = signature_prefix(&signature);
        assert_eq!(prefix.len(), 12);
        assert!(signature.starts_with(&prefix));
    }
}
