//! Mention-user resolution.
//!
//! Export resolves user mentions in two passes: first every distinct user id
//! reachable from the roots is collected, then the ids that are not cached yet
//! go to the host's [`MentionResolver`] in a single batch. Rendering only ever
//! reads the [`MentionCache`].

use crate::blocks::{BlockIndex, BlockKind, TextElement};
use crate::common::MAX_DEPTH;
use crate::error::ResolveError;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Display information for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionUserInfo {
    pub name: String,
    pub email: Option<String>,
}

impl MentionUserInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// Host-supplied lookup of user ids, typically backed by a directory API.
///
/// Ids missing from the returned map stay unresolved.
pub trait MentionResolver {
    fn resolve(
        &self,
        ids: &BTreeSet<String>,
    ) -> Result<HashMap<String, MentionUserInfo>, ResolveError>;
}

impl<F> MentionResolver for F
where
    F: Fn(&BTreeSet<String>) -> Result<HashMap<String, MentionUserInfo>, ResolveError>,
{
    fn resolve(
        &self,
        ids: &BTreeSet<String>,
    ) -> Result<HashMap<String, MentionUserInfo>, ResolveError> {
        self(ids)
    }
}

/// Append-only cache of resolved users, owned by one converter.
#[derive(Debug, Clone, Default)]
pub struct MentionCache {
    users: HashMap<String, MentionUserInfo>,
}

impl MentionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, user_id: &str) -> Option<&MentionUserInfo> {
        self.users.get(user_id)
    }

    pub fn insert(&mut self, user_id: impl Into<String>, info: MentionUserInfo) {
        self.users.entry(user_id.into()).or_insert(info);
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Resolve the ids of `wanted` that are not cached yet, in one call.
    ///
    /// A missing resolver or a failing one leaves the ids unresolved; the
    /// export goes on with placeholders.
    pub fn fill(&mut self, resolver: Option<&dyn MentionResolver>, wanted: &BTreeSet<String>) {
        let missing: BTreeSet<String> = wanted
            .iter()
            .filter(|id| !self.users.contains_key(*id))
            .cloned()
            .collect();
        if missing.is_empty() {
            return;
        }

        let Some(resolver) = resolver else {
            tracing::warn!(
                unresolved = missing.len(),
                "mention expansion requested without a resolver; using placeholders"
            );
            return;
        };

        tracing::debug!(ids = missing.len(), "resolving mentioned users");
        match resolver.resolve(&missing) {
            Ok(resolved) => {
                for (id, info) in resolved {
                    self.insert(id, info);
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "mention resolver failed; using placeholders");
            }
        }
    }

    /// Markdown for a user mention.
    pub fn render(&self, user_id: &str, expand: bool) -> String {
        if !expand {
            return placeholder(user_id);
        }
        match self.get(user_id) {
            Some(MentionUserInfo {
                name,
                email: Some(email),
            }) if !email.is_empty() => format!("[@{name}](mailto:{email})"),
            Some(info) if !info.name.is_empty() => format!("@{}", info.name),
            _ => placeholder(user_id),
        }
    }
}

fn placeholder(user_id: &str) -> String {
    format!("@[user:{user_id}]")
}

/// Collect every distinct mention-user id in text-bearing blocks reachable
/// from `roots`. Each block is visited once, however often it is listed.
pub fn collect_mention_ids(index: &BlockIndex, roots: &[String]) -> BTreeSet<String> {
    let mut ids = BTreeSet::new();
    let mut seen = HashSet::new();
    for root in roots {
        visit(index, root, 0, &mut seen, &mut ids);
    }
    ids
}

fn visit<'a>(
    index: &'a BlockIndex,
    id: &str,
    depth: usize,
    seen: &mut HashSet<&'a str>,
    ids: &mut BTreeSet<String>,
) {
    if depth >= MAX_DEPTH {
        return;
    }
    let Some(block) = index.get(id) else {
        return;
    };
    if !seen.insert(block.id.as_str()) {
        tracing::trace!(%id, "block already visited for mentions");
        return;
    }

    if let Some(text) = block.kind.text() {
        for element in &text.elements {
            if let TextElement::MentionUser { user_id } = element {
                ids.insert(user_id.clone());
            }
        }
    }

    for child in &block.children {
        visit(index, child, depth + 1, seen, ids);
    }
    if let BlockKind::Table(Some(table)) = &block.kind {
        for cell in &table.cells {
            visit(index, cell, depth + 1, seen, ids);
        }
    }
}
