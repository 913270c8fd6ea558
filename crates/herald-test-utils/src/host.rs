//! [`MemoryHost`]: a scriptable in-memory [`DocumentHost`].
//!
//! Documents and posts live in maps behind a `Mutex`, every write is
//! recorded, and individual operations can be made to fail on demand.

use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use herald_config::EndpointKind;
use herald_core::{CreatedPost, DocumentHost, EndpointId, HostError, HostResult, PostInfo};

/// One recorded write, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRecord {
    pub endpoint: EndpointId,
    pub content: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
struct StoredPost {
    community: String,
    title: String,
    body: String,
    url: String,
    created_at: DateTime<Utc>,
    approved: bool,
}

#[derive(Debug, Default)]
struct Inner {
    /// Wiki pages and widgets, keyed by (kind, community, name).
    documents: BTreeMap<(String, String, String), String>,
    /// Posts by host-assigned id.
    posts: BTreeMap<String, StoredPost>,
    /// Pinned post ids per community, top slot first.
    pinned: BTreeMap<String, Vec<String>>,
    writes: Vec<WriteRecord>,
    created: Vec<String>,
    approvals: Vec<String>,
    next_post: u32,
    fail_put: Option<HostError>,
    fail_create: Option<HostError>,
}

/// In-memory document host for tests.
#[derive(Debug, Default)]
pub struct MemoryHost {
    inner: Mutex<Inner>,
}

fn doc_key(kind: EndpointKind, community: &str, name: &str) -> (String, String, String) {
    (kind.to_string(), community.to_string(), name.to_string())
}

fn post_url(community: &str, id: &str) -> String {
    format!("https://host.example/{community}/comments/{id}")
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a wiki page.
    pub fn seed_wiki(&self, community: &str, name: &str, content: &str) {
        self.inner.lock().unwrap().documents.insert(
            doc_key(EndpointKind::WikiPage, community, name),
            content.to_string(),
        );
    }

    /// Seed a sidebar widget.
    pub fn seed_widget(&self, community: &str, name: &str, content: &str) {
        self.inner.lock().unwrap().documents.insert(
            doc_key(EndpointKind::Widget, community, name),
            content.to_string(),
        );
    }

    /// Seed an existing post, as when adopting a thread some human
    /// created earlier.
    pub fn seed_post(&self, community: &str, id: &str, body: &str, created_at: DateTime<Utc>) {
        self.inner.lock().unwrap().posts.insert(
            id.to_string(),
            StoredPost {
                community: community.to_string(),
                title: format!("seeded {id}"),
                body: body.to_string(),
                url: post_url(community, id),
                created_at,
                approved: true,
            },
        );
    }

    /// Mark a seeded post as pinned, below any already-pinned posts.
    pub fn pin_existing(&self, community: &str, id: &str) {
        self.inner
            .lock()
            .unwrap()
            .pinned
            .entry(community.to_string())
            .or_default()
            .push(id.to_string());
    }

    /// Every subsequent `put` fails with `error`.
    pub fn fail_puts(&self, error: HostError) {
        self.inner.lock().unwrap().fail_put = Some(error);
    }

    /// Every subsequent `create_post` fails with `error`.
    pub fn fail_creates(&self, error: HostError) {
        self.inner.lock().unwrap().fail_create = Some(error);
    }

    /// Current content of a wiki page, if it exists.
    pub fn wiki(&self, community: &str, name: &str) -> Option<String> {
        self.inner
            .lock()
            .unwrap()
            .documents
            .get(&doc_key(EndpointKind::WikiPage, community, name))
            .cloned()
    }

    /// Current content of a widget, if it exists.
    pub fn widget(&self, community: &str, name: &str) -> Option<String> {
        self.inner
            .lock()
            .unwrap()
            .documents
            .get(&doc_key(EndpointKind::Widget, community, name))
            .cloned()
    }

    pub fn post_body(&self, id: &str) -> Option<String> {
        self.inner
            .lock()
            .unwrap()
            .posts
            .get(id)
            .map(|post| post.body.clone())
    }

    pub fn post_title(&self, id: &str) -> Option<String> {
        self.inner
            .lock()
            .unwrap()
            .posts
            .get(id)
            .map(|post| post.title.clone())
    }

    pub fn post_approved(&self, id: &str) -> bool {
        self.inner
            .lock()
            .unwrap()
            .posts
            .get(id)
            .is_some_and(|post| post.approved)
    }

    /// Pinned post ids in a community, top slot first.
    pub fn pinned_in(&self, community: &str) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .pinned
            .get(community)
            .cloned()
            .unwrap_or_default()
    }

    /// Ids of posts created through [`DocumentHost::create_post`], in
    /// call order.
    pub fn created_ids(&self) -> Vec<String> {
        self.inner.lock().unwrap().created.clone()
    }

    /// Every write in call order.
    pub fn writes(&self) -> Vec<WriteRecord> {
        self.inner.lock().unwrap().writes.clone()
    }

    pub fn write_count(&self) -> usize {
        self.inner.lock().unwrap().writes.len()
    }

    pub fn approvals(&self) -> Vec<String> {
        self.inner.lock().unwrap().approvals.clone()
    }
}

impl DocumentHost for MemoryHost {
    fn get(&self, endpoint: &EndpointId) -> HostResult<String> {
        let inner = self.inner.lock().unwrap();
        match endpoint.kind {
            EndpointKind::WikiPage | EndpointKind::Widget => inner
                .documents
                .get(&doc_key(endpoint.kind, &endpoint.community, &endpoint.name))
                .cloned()
                .ok_or_else(|| HostError::not_found(endpoint)),
            EndpointKind::Thread => inner
                .posts
                .get(&endpoint.name)
                .map(|post| post.body.clone())
                .ok_or_else(|| HostError::not_found(endpoint)),
            EndpointKind::CurrentThread => Err(HostError::Rejected {
                reason: "unresolved current_thread alias reached the host".to_string(),
            }),
        }
    }

    fn put(&self, endpoint: &EndpointId, content: &str, reason: &str) -> HostResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(error) = &inner.fail_put {
            return Err(error.clone());
        }
        match endpoint.kind {
            EndpointKind::WikiPage | EndpointKind::Widget => {
                let key = doc_key(endpoint.kind, &endpoint.community, &endpoint.name);
                let Some(slot) = inner.documents.get_mut(&key) else {
                    return Err(HostError::not_found(endpoint));
                };
                *slot = content.to_string();
            }
            EndpointKind::Thread => {
                let Some(post) = inner.posts.get_mut(&endpoint.name) else {
                    return Err(HostError::not_found(endpoint));
                };
                post.body = content.to_string();
            }
            EndpointKind::CurrentThread => {
                return Err(HostError::Rejected {
                    reason: "unresolved current_thread alias reached the host".to_string(),
                });
            }
        }
        inner.writes.push(WriteRecord {
            endpoint: endpoint.clone(),
            content: content.to_string(),
            reason: reason.to_string(),
        });
        Ok(())
    }

    fn create_post(
        &self,
        _account: &str,
        community: &str,
        title: &str,
        body: &str,
    ) -> HostResult<CreatedPost> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(error) = &inner.fail_create {
            return Err(error.clone());
        }
        inner.next_post += 1;
        let id = format!("t3_{:04}", inner.next_post);
        let url = post_url(community, &id);
        inner.posts.insert(
            id.clone(),
            StoredPost {
                community: community.to_string(),
                title: title.to_string(),
                body: body.to_string(),
                url: url.clone(),
                created_at: Utc::now(),
                approved: false,
            },
        );
        inner.created.push(id.clone());
        Ok(CreatedPost { id, url })
    }

    fn post_info(&self, _account: &str, community: &str, thread_id: &str) -> HostResult<PostInfo> {
        self.inner
            .lock()
            .unwrap()
            .posts
            .get(thread_id)
            .filter(|post| post.community == community)
            .map(|post| PostInfo {
                url: post.url.clone(),
                created_at: post.created_at,
            })
            .ok_or_else(|| HostError::not_found(&EndpointId::thread(community, thread_id, "")))
    }

    fn pinned(&self, _account: &str, community: &str) -> HostResult<Vec<String>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .pinned
            .get(community)
            .cloned()
            .unwrap_or_default())
    }

    fn pin(&self, _account: &str, community: &str, thread_id: &str, bottom: bool) -> HostResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.posts.contains_key(thread_id) {
            return Err(HostError::not_found(&EndpointId::thread(
                community, thread_id, "",
            )));
        }
        let slots = inner.pinned.entry(community.to_string()).or_default();
        slots.retain(|id| id != thread_id);
        if bottom {
            slots.push(thread_id.to_string());
        } else {
            slots.insert(0, thread_id.to_string());
        }
        Ok(())
    }

    fn unpin(&self, _account: &str, community: &str, thread_id: &str) -> HostResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(slots) = inner.pinned.get_mut(community) {
            slots.retain(|id| id != thread_id);
        }
        Ok(())
    }

    fn approve(&self, _account: &str, community: &str, thread_id: &str) -> HostResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let Some(post) = inner.posts.get_mut(thread_id) else {
            return Err(HostError::not_found(&EndpointId::thread(
                community, thread_id, "",
            )));
        };
        post.approved = true;
        inner.approvals.push(thread_id.to_string());
        Ok(())
    }
}
