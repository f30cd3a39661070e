use super::domain::SubmissionRecord;

/// Newest first. Equal timestamps keep their insertion order (stable sort).
pub fn most_recent(mut records: Vec<SubmissionRecord>) -> Vec<SubmissionRecord> {
    records.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
    records
}

/// Highest derived total first, truncated to `n`. Ties keep their insertion
/// order.
pub fn top_n(mut records: Vec<SubmissionRecord>, n: usize) -> Vec<SubmissionRecord> {
    records.sort_by(|a, b| b.votes.total().cmp(&a.votes.total()));
    records.truncate(n);
    records
}
