use anyhow::Result;
use std::io::BufRead;

/// 一条 FASTA 记录（蛋白）。`id` 为 '>' 后第一个空白前的
/// accession token（如 `sp|P12345|ALBU_HUMAN`），序列保持原始
/// 字节，规范化交给 [`crate::util::aa::normalize_seq`]。
#[derive(Debug, Clone)]
pub struct FastaRecord {
    pub id: String,
    pub desc: Option<String>,
    pub seq: Vec<u8>,
}

pub struct FastaReader<R: BufRead> {
    reader: R,
    buf: String,
    done: bool,
    peek_header: Option<String>,
}

impl<R: BufRead> FastaReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: String::new(),
            done: false,
            peek_header: None,
        }
    }

    pub fn next_record(&mut self) -> Result<Option<FastaRecord>> {
        if self.done {
            return Ok(None);
        }

        // Find header line
        let header = if let Some(h) = self.peek_header.take() {
            h
        } else {
            loop {
                self.buf.clear();
                let n = self.reader.read_line(&mut self.buf)?;
                if n == 0 {
                    self.done = true;
                    return Ok(None);
                }
                if self.buf.starts_with('>') {
                    let h = self.buf[1..].trim().to_string();
                    break h;
                }
            }
        };

        // Parse accession and description
        let mut parts = header.splitn(2, char::is_whitespace);
        let id = parts.next().unwrap_or("").to_string();
        let desc = parts
            .next()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        // Read sequence lines
        let mut seq: Vec<u8> = Vec::new();
        loop {
            self.buf.clear();
            let n = self.reader.read_line(&mut self.buf)?;
            if n == 0 {
                self.done = true;
                break;
            }
            if self.buf.starts_with('>') {
                let h = self.buf[1..].trim().to_string();
                self.peek_header = Some(h);
                break;
            }
            // legacy FASTA comment lines
            if self.buf.starts_with(';') {
                continue;
            }
            for &b in self.buf.as_bytes() {
                match b {
                    b'\n' | b'\r' | b' ' | b'\t' => {}
                    _ => seq.push(b),
                }
            }
        }

        Ok(Some(FastaRecord { id, desc, seq }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parse_simple_protein_fasta() {
        let data = b">sp|P1|TEST first protein\nMKTAYI\n>P2\nAAA\n";
        let cursor = Cursor::new(&data[..]);
        let mut r = FastaReader::new(cursor);

        let r1 = r.next_record().unwrap().unwrap();
        assert_eq!(r1.id, "sp|P1|TEST");
        assert_eq!(r1.desc.as_deref(), Some("first protein"));
        assert_eq!(r1.seq, b"MKTAYI");

        let r2 = r.next_record().unwrap().unwrap();
        assert_eq!(r2.id, "P2");
        assert_eq!(r2.desc, None);
        assert_eq!(r2.seq, b"AAA");

        assert!(r.next_record().unwrap().is_none());
    }

    #[test]
    fn parse_fasta_with_crlf_and_wrapped_lines() {
        let data = b">P1 desc\r\nMKTA YI\r\n AKQR\r\n>P2 \r\n GGG \r\n";
        let cursor = Cursor::new(&data[..]);
        let mut r = FastaReader::new(cursor);

        let r1 = r.next_record().unwrap().unwrap();
        assert_eq!(r1.id, "P1");
        assert_eq!(r1.desc.as_deref(), Some("desc"));
        assert_eq!(r1.seq, b"MKTAYIAKQR");

        let r2 = r.next_record().unwrap().unwrap();
        assert_eq!(r2.id, "P2");
        assert_eq!(r2.seq, b"GGG");

        assert!(r.next_record().unwrap().is_none());
    }

    #[test]
    fn parse_fasta_with_leading_empty_lines() {
        let data = b"\n\n>P1\nMKTL\n";
        let cursor = Cursor::new(&data[..]);
        let mut r = FastaReader::new(cursor);

        let r1 = r.next_record().unwrap().unwrap();
        assert_eq!(r1.id, "P1");
        assert_eq!(r1.desc, None);
        assert_eq!(r1.seq, b"MKTL");

        assert!(r.next_record().unwrap().is_none());
    }

    #[test]
    fn comment_lines_are_skipped() {
        let data = b">P1\n;internal note\nMKT\n;another\nLR\n";
        let mut r = FastaReader::new(Cursor::new(&data[..]));
        let r1 = r.next_record().unwrap().unwrap();
        assert_eq!(r1.seq, b"MKTLR");
        assert!(r.next_record().unwrap().is_none());
    }

    #[test]
    fn sequence_case_and_stops_are_kept_raw() {
        // 规范化是 util::aa 的职责，reader 只去掉空白
        let data = b">P1\nmkTl*\n";
        let mut r = FastaReader::new(Cursor::new(&data[..]));
        let r1 = r.next_record().unwrap().unwrap();
        assert_eq!(r1.seq, b"mkTl*");
    }
}
