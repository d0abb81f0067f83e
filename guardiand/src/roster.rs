use crate::store::MemberStore;
use crate::types::{Member, Vitals};
use tokio::sync::{RwLock, watch};
use uuid::Uuid;

/// The live, in-memory member list. Newest members sit at the front.
///
/// The member count is published on a watch channel so the simulator can
/// start its timer only while there is someone to simulate.
pub struct Roster {
    members: RwLock<Vec<Member>>,
    size_tx: watch::Sender<usize>,
}

impl Default for Roster {
    fn default() -> Self {
        Self::new()
    }
}

impl Roster {
    pub fn new() -> Self {
        let (size_tx, _rx) = watch::channel(0);
        Self {
            members: RwLock::new(Vec::new()),
            size_tx,
        }
    }

    pub fn with_members(members: Vec<Member>) -> Self {
        let (size_tx, _rx) = watch::channel(members.len());
        Self {
            members: RwLock::new(members),
            size_tx,
        }
    }

    /// Restore every stored profile with freshly sampled vitals.
    pub async fn from_store(store: &MemberStore) -> Result<Self, sqlx::Error> {
        let profiles = store.list().await?;
        let mut rng = rand::thread_rng();
        let members = profiles
            .into_iter()
            .map(|profile| Member::new(profile, Vitals::sampled(&mut rng)))
            .collect();
        Ok(Self::with_members(members))
    }

    pub fn subscribe_size(&self) -> watch::Receiver<usize> {
        self.size_tx.subscribe()
    }

    pub async fn replace(&self, members: Vec<Member>) {
        let mut guard = self.members.write().await;
        *guard = members;
        self.size_tx.send_replace(guard.len());
    }

    pub async fn push_front(&self, member: Member) {
        let mut guard = self.members.write().await;
        guard.insert(0, member);
        self.size_tx.send_replace(guard.len());
    }

    pub async fn list(&self) -> Vec<Member> {
        self.members.read().await.clone()
    }

    pub async fn get(&self, id: Uuid) -> Option<Member> {
        self.members
            .read()
            .await
            .iter()
            .find(|m| m.id() == id)
            .cloned()
    }

    pub async fn len(&self) -> usize {
        self.members.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Run `f` over every member under a single write lock.
    pub async fn tick_with<T>(&self, f: impl FnOnce(&mut [Member]) -> T) -> T {
        let mut guard = self.members.write().await;
        f(guard.as_mut_slice())
    }
}
