pub mod alphabet;
pub mod rank;

pub use alphabet::AlphabetMask;
pub use rank::RankBitVector;
