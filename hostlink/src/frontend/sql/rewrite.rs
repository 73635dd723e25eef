//! Statement text rewrite hooks.
//!
//! Hooks are injected per classifier context, not registered globally:
//! embedding applications build a [`RewriterSet`], add their hooks and
//! hand it to the context.

use std::sync::Arc;

use parking_lot::RwLock;

/// Rewrites or observes statement text before classification.
pub trait SqlRewriter: Send + Sync {
    /// Rewrite the statement text. `None` leaves it unchanged.
    fn rewrite(&self, sql: &str) -> Option<String>;

    /// The classifier stripped embedded comments from this text.
    fn comments_stripped(&self, _sql: &str) {}
}

/// An ordered, shared set of rewrite hooks.
#[derive(Clone, Default)]
pub struct RewriterSet {
    hooks: Arc<RwLock<Vec<Arc<dyn SqlRewriter>>>>,
}

impl RewriterSet {
    pub fn add(&self, hook: Arc<dyn SqlRewriter>) {
        self.hooks.write().push(hook);
    }

    pub fn clear(&self) {
        self.hooks.write().clear();
    }

    pub fn len(&self) -> usize {
        self.hooks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.read().is_empty()
    }

    /// Run every hook over the text, in registration order.
    pub(crate) fn rewrite(&self, sql: String) -> String {
        let hooks = self.hooks.read();
        let mut sql = sql;

        for hook in hooks.iter() {
            if let Some(rewritten) = hook.rewrite(&sql) {
                sql = rewritten;
            }
        }

        sql
    }

    pub(crate) fn notify_comments_stripped(&self, sql: &str) {
        for hook in self.hooks.read().iter() {
            hook.comments_stripped(sql);
        }
    }
}

impl std::fmt::Debug for RewriterSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RewriterSet")
            .field("hooks", &self.len())
            .finish()
    }
}
