use std::collections::HashSet;
use std::sync::Mutex;

/// Run-scoped set of canonical links already emitted.
///
/// The only way to mark a link is [`DedupSet::try_claim`], which checks and
/// inserts under one lock: for any link exactly one caller ever gets `true`.
#[derive(Debug, Default)]
pub struct DedupSet {
    seen: Mutex<HashSet<String>>,
}

impl DedupSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with links that are already persisted.
    pub fn seed<I, S>(&self, links: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = self.lock();
        let before = seen.len();
        seen.extend(links.into_iter().map(Into::into));
        seen.len() - before
    }

    /// Returns `true` if the link was not seen before and is now claimed.
    pub fn try_claim(&self, link: &str) -> bool {
        let mut seen = self.lock();
        if seen.contains(link) {
            return false;
        }
        seen.insert(link.to_string());
        true
    }

    /// Give a claim back, e.g. when the record could not be staged.
    pub fn release(&self, link: &str) {
        self.lock().remove(link);
    }

    pub fn contains(&self, link: &str) -> bool {
        self.lock().contains(link)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashSet<String>> {
        // A panic while holding the lock cannot leave the set half-updated
        self.seen.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
