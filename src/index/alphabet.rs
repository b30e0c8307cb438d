use serde::{Deserialize, Serialize};

/// 128 槽位字母表掩码（两个 64 位字）。
///
/// 符号以 ASCII 码直接寻址：`词 = 码 >> 6`，`位 = 码 & 63`。
/// rank 位向量的分区由该掩码派生（见 [`split_upper`](Self::split_upper)）。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlphabetMask(pub [u64; 2]);

impl AlphabetMask {
    pub const EMPTY: Self = Self([0, 0]);

    /// 由序列中出现的全部符号构造掩码。
    pub fn from_seq(text: &[u8]) -> Self {
        let mut mask = Self::EMPTY;
        for &sym in text {
            mask.insert(sym);
        }
        mask
    }

    pub fn from_symbols(symbols: &[u8]) -> Self {
        Self::from_seq(symbols)
    }

    #[inline]
    pub fn insert(&mut self, sym: u8) {
        debug_assert!(sym < 128);
        self.0[(sym >> 6) as usize] |= 1u64 << (sym & 63);
    }

    #[inline]
    pub fn contains(&self, sym: u8) -> bool {
        sym < 128 && (self.0[(sym >> 6) as usize] >> (sym & 63)) & 1 == 1
    }

    /// 掩码中置位的符号个数。
    #[inline]
    pub fn count(&self) -> u32 {
        crate::index::rank::popcount(self.0[0]) + crate::index::rank::popcount(self.0[1])
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0 == [0, 0]
    }

    /// 按码值升序枚举置位符号。
    pub fn symbols(&self) -> Vec<u8> {
        (0u8..128).filter(|&s| self.contains(s)).collect()
    }

    /// 均衡切分：按码值升序消费置位符号直至越过中点
    /// `(count - 1) / 2`，被消费的下半部分为分区 A，剩余掩码
    /// （本方法的返回值）为分区 B。
    ///
    /// 递归应用时每层向量的密度保持接近 50/50，从而限定
    /// 多层索引的 rank 查询成本。
    pub fn split_upper(&self) -> AlphabetMask {
        let mut words = self.0;
        let half = (i64::from(self.count()) - 1) >> 1;
        let mut cnt = 0i64;
        let mut i = 0usize;
        while i < 128 && cnt <= half {
            let cell = i >> 6;
            let pos = i & 63;
            cnt += ((words[cell] >> pos) & 1) as i64;
            words[cell] &= !(1u64 << pos);
            i += 1;
        }
        AlphabetMask(words)
    }
}
