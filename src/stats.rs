//! Outcome bookkeeping for a run.

use std::fmt;

/// Append-only records of page render outcomes, one entry per attempt.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatusTally {
    pub index: Vec<bool>,
    pub posts: Vec<bool>,
}

/// A summary of a run, computed from a [`StatusTally`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    pub index_succeeded: usize,
    pub index_failed: usize,
    pub index_attempts: usize,
    pub posts_succeeded: usize,
    pub posts_failed: usize,
    pub discovered: usize,
}

fn count(outcomes: &[bool], wanted: bool) -> usize {
    outcomes.iter().filter(|&&ok| ok == wanted).count()
}

impl Stats {
    pub fn new(tally: &StatusTally, index_attempts: usize, discovered: usize) -> Stats {
        Stats {
            index_succeeded: count(&tally.index, true),
            index_failed: count(&tally.index, false),
            index_attempts,
            posts_succeeded: count(&tally.posts, true),
            posts_failed: count(&tally.posts, false),
            discovered,
        }
    }

    /// The number of pages the run set out to produce.
    pub fn total_files(&self) -> usize {
        self.discovered + self.index_attempts
    }

    pub fn total_processed(&self) -> usize {
        self.posts_succeeded + self.index_succeeded
    }

    pub fn total_failed(&self) -> usize {
        self.posts_failed + self.index_failed
    }

    pub fn has_failures(&self) -> bool {
        self.total_failed() > 0
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "Processed {} of {} index pages",
            self.index_succeeded, self.index_attempts
        )?;
        writeln!(
            f,
            "Processed {} of {} post pages",
            self.posts_succeeded, self.discovered
        )?;
        writeln!(f, "Total files:     {}", self.total_files())?;
        writeln!(f, "Total processed: {}", self.total_processed())?;
        write!(f, "Total failed:    {}", self.total_failed())
    }
}
