/// 20 种标准氨基酸残基（单字母码，升序）。
pub const RESIDUES: &[u8; 20] = b"ACDEFGHIKLMNPQRSTVWY";

/// 未知 / 无法识别残基的占位符。
pub const UNKNOWN: u8 = b'X';

#[inline]
pub fn is_standard(b: u8) -> bool {
    RESIDUES.contains(&b.to_ascii_uppercase())
}

/// 是否为可出现在序列中的合法残基码（含歧义码 B/J/X/Z 与稀有残基 O/U）。
#[inline]
pub fn is_residue(b: u8) -> bool {
    let up = b.to_ascii_uppercase();
    is_standard(up) || matches!(up, b'B' | b'J' | b'O' | b'U' | b'X' | b'Z')
}

#[inline]
pub fn normalize_residue(b: u8) -> u8 {
    let up = b.to_ascii_uppercase();
    if is_residue(up) {
        up
    } else {
        UNKNOWN
    }
}

/// 规范化蛋白序列：大写化、丢弃终止符 '*' 与空白、未知码映射为 X。
pub fn normalize_seq(seq: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(seq.len());
    for &b in seq {
        match b {
            b'*' | b' ' | b'\t' | b'\r' | b'\n' => {}
            _ => out.push(normalize_residue(b)),
        }
    }
    out
}
