use crate::types::Section;

/// Rank markers that appear around names on bill pages and in transcripts.
const RANK_MARKERS: [&str; 2] = ["MP", "Sen"];

/// Uppercases the first letter of every alphabetic run and lowercases the rest,
/// so `o'BRIEN` becomes `O'Brien` and `hanson-young` becomes `Hanson-Young`.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for c in text.chars() {
        if in_word {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        in_word = c.is_alphabetic();
    }
    out
}

/// Turns `"Last, First"` (optionally decorated with `Sen` / `MP`) into `"First Last"`.
pub fn reorder_name(raw: &str) -> Option<String> {
    let parts: Vec<String> = raw
        .split(',')
        .map(|part| {
            part.split_whitespace()
                .filter(|word| !RANK_MARKERS.contains(word))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|part| !part.is_empty())
        .collect();

    match parts.as_slice() {
        [] => None,
        [single] => Some(title_case(single)),
        [last, first, ..] => Some(title_case(&format!("{} {}", first, last))),
    }
}

/// Canonical minister name: reordered, title-cased, then reduced to the first and
/// last token so middle names never break roster lookups.
pub fn normalize_minister_name(raw: &str) -> Option<String> {
    let full = reorder_name(raw)?;
    let tokens: Vec<&str> = full.split_whitespace().collect();
    match tokens.as_slice() {
        [first, .., last] => Some(format!("{} {}", first, last)),
        _ => Some(full),
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SectionStats {
    pub reused: usize,
    pub refreshed: usize,
}

impl SectionStats {
    pub fn total(&self) -> usize {
        self.reused + self.refreshed
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncStats {
    pub pending: SectionStats,
    pub passed: SectionStats,
    pub failed: SectionStats,
}

impl SyncStats {
    pub fn section_mut(&mut self, section: Section) -> &mut SectionStats {
        match section {
            Section::Pending => &mut self.pending,
            Section::Passed => &mut self.passed,
            Section::Failed => &mut self.failed,
        }
    }

    pub fn fetched_bills(&self) -> usize {
        self.pending.refreshed + self.passed.refreshed + self.failed.refreshed
    }

    pub fn total(&self) -> usize {
        self.pending.total() + self.passed.total() + self.failed.total()
    }
}

impl std::fmt::Display for SyncStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\nStatistics:")?;
        for (name, stats) in [
            ("Pending", self.pending),
            ("Passed", self.passed),
            ("Failed", self.failed),
        ] {
            writeln!(
                f,
                "  {:<8} {:>4} bill(s), {:>4} refreshed, {:>4} reused",
                name,
                stats.total(),
                stats.refreshed,
                stats.reused
            )?;
        }
        writeln!(f, "  Total:   {:>4} bill(s)", self.total())
    }
}
