use sha2::{Digest, Sha256};
use uuid::Uuid;

const SHORT_DIGEST_LEN: usize = 8;
const MAX_ATTEMPTS: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Topic,
    SubTopic,
    Question,
}

impl NodeKind {
    pub fn prefix(self) -> &'static str {
        match self {
            NodeKind::Topic => "T",
            NodeKind::SubTopic => "S",
            NodeKind::Question => "Q",
        }
    }
}

/// Source of node identifiers. `taken` reports ids that are already in use
/// and must not be returned.
pub trait IdGenerator {
    fn next_id(&mut self, kind: NodeKind, taken: &dyn Fn(&str) -> bool) -> String;
}

/// Short, random ids such as `T-3f9a0c12`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashedIds;

impl IdGenerator for HashedIds {
    fn next_id(&mut self, kind: NodeKind, taken: &dyn Fn(&str) -> bool) -> String {
        generate_node_id(kind, taken)
    }
}

/// Deterministic ids (`T-1`, `S-2`, ...) that skip anything already taken.
#[derive(Debug, Clone, Default)]
pub struct SequentialIds {
    next: u64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self, kind: NodeKind, taken: &dyn Fn(&str) -> bool) -> String {
        loop {
            self.next += 1;
            let candidate = format!("{}-{}", kind.prefix(), self.next);
            if !taken(&candidate) {
                return candidate;
            }
        }
    }
}

pub fn generate_node_id(kind: NodeKind, taken: &dyn Fn(&str) -> bool) -> String {
    for _ in 0..MAX_ATTEMPTS {
        let seed = Uuid::now_v7().to_string();
        let mut hasher = Sha256::new();
        hasher.update(seed.as_bytes());
        let digest = format!("{:x}", hasher.finalize());
        let candidate = format!("{}-{}", kind.prefix(), &digest[..SHORT_DIGEST_LEN]);
        if !taken(&candidate) {
            return candidate;
        }
    }

    format!("{}-{}", kind.prefix(), Uuid::now_v7().simple())
}
