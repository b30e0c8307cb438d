use serde::{Deserialize, Serialize};

use crate::error::RankError;
use crate::index::alphabet::AlphabetMask;

const BLOCK_SHIFT: usize = 6;
const BLOCK_MASK: usize = 63;

// 并行二分归约用的掩码（SWAR popcount）
const M1: u64 = 0x5555_5555_5555_5555; // 0101...
const M2: u64 = 0x3333_3333_3333_3333; // 00110011...
const M4: u64 = 0x0f0f_0f0f_0f0f_0f0f; // 4 zeros, 4 ones...
const H01: u64 = 0x0101_0101_0101_0101; // 256^0 + 256^1 + 256^2 + ...

/// 无分支定宽 popcount：两位、四位、八位逐级归并，
/// 最后用一次乘法把各字节的计数折叠到最高字节。
#[inline]
pub fn popcount(mut x: u64) -> u32 {
    x -= (x >> 1) & M1;
    x = (x & M2) + ((x >> 2) & M2);
    x = (x + (x >> 4)) & M4;
    (x.wrapping_mul(H01) >> 56) as u32
}

/// 字母表二分的 rank 位向量：压缩全文索引每一层的基本构件。
///
/// 对每个符号位置存一个比特（1 = 符号属于分区 B），按 64 位字分块，
/// 每块缓存一个累计 1 计数前缀和。`rank` / `is_set` 均为 O(1) 字操作：
/// 定位所属块、取其前缀和、对块内位做一次掩码 popcount，绝不跨块扫描。
///
/// 构造后不可变，由创建它的树节点（或 wavelet 层）独占持有。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankBitVector {
    length: usize,
    bits: Vec<u64>,
    block_sums: Vec<u32>,
}

impl RankBitVector {
    /// 由符号序列与字母表掩码构造。
    ///
    /// 分区在此规范化：[`AlphabetMask::split_upper`] 把存在符号的
    /// 下半部分划入分区 A，剩余掩码即分区 B。掩码之外的符号恒为 0。
    /// 单趟构建，O(length)。
    pub fn new(text: &[u8], alphabet: &AlphabetMask) -> Self {
        let upper = alphabet.split_upper();
        Self::with_partition(text, &upper)
    }

    /// 直接以已规范化的分区 B 掩码构造（多层构建器逐层传入）。
    pub fn with_partition(text: &[u8], partition: &AlphabetMask) -> Self {
        let length = text.len();
        let field_len = (length >> BLOCK_SHIFT) + 1;
        let mut bits = vec![0u64; field_len];
        let mut block_sums = vec![0u32; field_len];

        for (i, &sym) in text.iter().enumerate() {
            let cell = i >> BLOCK_SHIFT;
            let pos = i & BLOCK_MASK;
            let bit = u64::from(partition.contains(sym));
            bits[cell] |= bit << pos;
            if pos == 0 && i != 0 {
                block_sums[cell] = block_sums[cell - 1] + popcount(bits[cell - 1]);
            }
        }

        Self {
            length,
            bits,
            block_sums,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.length
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// 闭区间 `[0, i]` 内分区 B 符号的个数；`want_zeros` 时返回
    /// 分区 A 的个数，即 `(i + 1) - ones`。
    ///
    /// `i` 越界（含空向量）返回 [`RankError::OutOfRange`]。
    #[inline]
    pub fn rank(&self, i: usize, want_zeros: bool) -> Result<u32, RankError> {
        if i >= self.length {
            return Err(RankError::OutOfRange {
                index: i,
                length: self.length,
            });
        }
        let cell = i >> BLOCK_SHIFT;
        let pos = i & BLOCK_MASK;
        // 左移丢弃位置 i 之后的位，保留 [块首, i]
        let active_ones = self.bits[cell] << (BLOCK_MASK - pos);
        let ones = self.block_sums[cell] + popcount(active_ones);
        if want_zeros {
            Ok((i as u32 + 1) - ones)
        } else {
            Ok(ones)
        }
    }

    /// 位置 `i` 是否属于分区 B。
    #[inline]
    pub fn is_set(&self, i: usize) -> Result<bool, RankError> {
        if i >= self.length {
            return Err(RankError::OutOfRange {
                index: i,
                length: self.length,
            });
        }
        let cell = i >> BLOCK_SHIFT;
        let pos = i & BLOCK_MASK;
        Ok((self.bits[cell] >> pos) & 1 == 1)
    }

    /// 向量中分区 B 符号的总数（空向量为 0）。
    pub fn total_ones(&self) -> u32 {
        if self.length == 0 {
            return 0;
        }
        // length >= 1，rank(length - 1) 必然在界内
        self.rank(self.length - 1, false).unwrap_or(0)
    }
}
