//! Plain-text report of the candidates and links found by each stage.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::candidate::{Candidate, Link};
use crate::error::Result;

/// Append-only result log.
pub struct ResultLog<W: Write> {
    writer: W,
}

impl ResultLog<BufWriter<File>> {
    /// Create (or truncate) the log file at `path`.
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> ResultLog<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Write the candidate block of a stage.
    pub fn candidates(&mut self, stage: &str, candidates: &[Candidate]) -> Result<()> {
        writeln!(
            self.writer,
            "{stage} processing yielded: {} candidate links",
            candidates.len()
        )?;
        writeln!(self.writer, "##, GID_START, GID_END, HEIGHT_DIF, DIST")?;
        for (i, c) in candidates.iter().enumerate() {
            writeln!(
                self.writer,
                "{:<3}, {:>8}, {:>8}, {:>8.2}, {:>6.2}",
                i + 1,
                c.gid_start,
                c.gid_end,
                c.pair.height_difference(),
                c.pair.distance()
            )?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    /// Write the link block of a stage.
    pub fn links(&mut self, stage: &str, links: &[Link]) -> Result<()> {
        writeln!(self.writer, "{stage} processing yielded: {} links", links.len())?;
        writeln!(
            self.writer,
            "{:>5}  , {}, {:>8}, {:>6}, {}, {:>6}",
            "R_ID", "GID_START", "GID_END", "DIST", "HEIGHT_DIF", "RATE"
        )?;
        for link in links {
            writeln!(
                self.writer,
                "{:>6}, {:>9}, {:>8}, {:>6.2}, {:>9.2}, {:>6}",
                link.r_id,
                link.gid_start,
                link.gid_end,
                link.length(),
                link.height(),
                link.rate()
            )?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    /// Free-form line, used for stage notes such as a skipped bus stage.
    pub fn note(&mut self, line: &str) -> Result<()> {
        writeln!(self.writer, "{line}")?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::{Grade, LinkKind, PointPair};
    use crate::config::Thresholds;
    use crate::feature::Coordinate;

    #[test]
    fn candidate_block_layout() {
        let candidate = Candidate::new(
            LinkKind::LiftLink,
            Coordinate::new(0.0, 0.0, 1000.0),
            Coordinate::new(30.0, 40.0, 1025.0),
            "12",
            "345",
            "",
            &Thresholds::default(),
        );
        let mut log = ResultLog::new(Vec::new());
        log.candidates("liftLinks", &[candidate]).expect("in-memory write");
        let text = String::from_utf8(log.into_inner()).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "liftLinks processing yielded: 1 candidate links");
        assert_eq!(lines[1], "##, GID_START, GID_END, HEIGHT_DIF, DIST");
        assert_eq!(lines[2], "1  ,       12,      345,     2.50,  50.00");
        assert_eq!(lines[3], "");
    }

    #[test]
    fn link_block_layout() {
        let link = Link {
            pair: PointPair::new(
                Coordinate::new(0.0, 0.0, 1000.0),
                Coordinate::new(3.0, 4.0, 990.0),
            ),
            kind: LinkKind::Slope2Slope,
            gid_start: "7".into(),
            gid_end: "8".into(),
            de_name: String::new(),
            grade: Some(Grade::A),
            r_id: 17001,
        };
        let mut log = ResultLog::new(Vec::new());
        log.links("slopeLinks", &[link]).expect("in-memory write");
        let text = String::from_utf8(log.into_inner()).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "slopeLinks processing yielded: 1 links");
        assert_eq!(lines[1], " R_ID  , GID_START,  GID_END,   DIST, HEIGHT_DIF,   RATE");
        assert_eq!(lines[2], " 17001,         7,        8,   5.00,     -1.00,      A");
    }
}
