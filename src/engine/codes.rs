// ==========================================
// 海产品加工追溯系统 - 编码生成器
// ==========================================
// 职责: 批次号、用户/供应商/产品编码、箱号、记录 id
// 格式:
// - 批次号: {prefix}-{yyyyMMddHHmm}-{4 位 base36 大写}
// - 用户:   USR{yyMMdd}{3 位}
// - 供应商: SUP{yyMM}{4 位}
// - 产品:   SHO|MEA{yyMM}{2 位}
// - 箱号:   {前缀}-{序号补零}
// ==========================================
// 注意: 随机后缀不保证唯一，唯一性由调用方在写入前校验
// ==========================================

use crate::domain::types::ProductType;
use chrono::{DateTime, Utc};
use rand::Rng;
use std::collections::HashSet;
use uuid::Uuid;

const BASE36_ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// 成品箱号前缀
pub const FINAL_BOX_PREFIX: &str = "BOX";

/// 编码撞车时的最大重试次数
pub const MAX_CODE_ATTEMPTS: usize = 8;

/// 单批次箱数上限（每箱生成一个箱号）
pub const MAX_BOX_COUNT: u32 = 10_000;

pub struct CodeGenerator;

impl CodeGenerator {
    /// 新记录 id（UUID v4）
    pub fn new_record_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// 指定长度的 base36 大写随机串
    pub fn random_base36(len: usize) -> String {
        let mut rng = rand::thread_rng();
        (0..len)
            .map(|_| BASE36_ALPHABET[rng.gen_range(0..BASE36_ALPHABET.len())] as char)
            .collect()
    }

    /// 批次号
    pub fn lot_number(prefix: &str, now: DateTime<Utc>) -> String {
        format!(
            "{}-{}-{}",
            prefix,
            now.format("%Y%m%d%H%M"),
            Self::random_base36(4)
        )
    }

    pub fn user_code(now: DateTime<Utc>) -> String {
        format!("USR{}{}", now.format("%y%m%d"), Self::random_base36(3))
    }

    pub fn supplier_code(now: DateTime<Utc>) -> String {
        format!("SUP{}{}", now.format("%y%m"), Self::random_base36(4))
    }

    pub fn product_code(product_type: ProductType, now: DateTime<Utc>) -> String {
        format!(
            "{}{}{}",
            product_type.code_prefix(),
            now.format("%y%m"),
            Self::random_base36(2)
        )
    }

    /// 生成未被占用的编码
    ///
    /// # 返回
    /// - None: 连续 MAX_CODE_ATTEMPTS 次均撞车
    pub fn generate_unique<F>(taken: &HashSet<String>, mut generate: F) -> Option<String>
    where
        F: FnMut() -> String,
    {
        (0..MAX_CODE_ATTEMPTS)
            .map(|_| generate())
            .find(|code| !taken.contains(code))
    }

    /// 箱号序列（从 1 开始）
    ///
    /// # 参数
    /// - prefix: 加工工序为批次号，终包装为 BOX
    /// - count: 箱数
    /// - width: 序号补零位数
    pub fn box_numbers(prefix: &str, count: u32, width: usize) -> Vec<String> {
        (1..=count)
            .map(|n| format!("{}-{:0width$}", prefix, n, width = width))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 5, 9, 7, 0).unwrap()
    }

    fn is_base36_upper(s: &str) -> bool {
        s.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
    }

    #[test]
    fn test_lot_number_format() {
        let number = CodeGenerator::lot_number("LOT", now());
        assert!(number.starts_with("LOT-202603050907-"), "{}", number);
        let suffix = number.rsplit('-').next().unwrap();
        assert_eq!(suffix.len(), 4);
        assert!(is_base36_upper(suffix));
    }

    #[test]
    fn test_master_data_codes() {
        let user = CodeGenerator::user_code(now());
        assert!(user.starts_with("USR260305"));
        assert_eq!(user.len(), 12);

        let supplier = CodeGenerator::supplier_code(now());
        assert!(supplier.starts_with("SUP2603"));
        assert_eq!(supplier.len(), 11);

        let product = CodeGenerator::product_code(ProductType::Meat, now());
        assert!(product.starts_with("MEA2603"));
        assert_eq!(product.len(), 9);
        assert!(is_base36_upper(&product[7..]));
    }

    #[test]
    fn test_box_numbers_are_zero_padded() {
        let boxes = CodeGenerator::box_numbers("LOT-202603050907-AB12", 3, 4);
        assert_eq!(
            boxes,
            vec![
                "LOT-202603050907-AB12-0001",
                "LOT-202603050907-AB12-0002",
                "LOT-202603050907-AB12-0003",
            ]
        );
        assert_eq!(CodeGenerator::box_numbers(FINAL_BOX_PREFIX, 12, 4)[11], "BOX-0012");
        assert!(CodeGenerator::box_numbers("BOX", 0, 4).is_empty());
    }

    #[test]
    fn test_generate_unique_skips_taken_codes() {
        let taken: HashSet<String> = ["A".to_string(), "B".to_string()].into_iter().collect();
        let mut candidates = vec!["A", "B", "C"].into_iter();
        let code = CodeGenerator::generate_unique(&taken, || candidates.next().unwrap_or("A").to_string());
        assert_eq!(code.as_deref(), Some("C"));

        let exhausted = CodeGenerator::generate_unique(&taken, || "A".to_string());
        assert_eq!(exhausted, None);
    }

    #[test]
    fn test_record_ids_are_unique() {
        let a = CodeGenerator::new_record_id();
        let b = CodeGenerator::new_record_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 36);
    }
}
