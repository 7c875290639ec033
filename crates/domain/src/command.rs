//! Command handling infrastructure.

use std::marker::PhantomData;

use common::EntityKey;
use entity_store::{ChangeEnvelope, CommitOptions, EntityStore, Version};

use crate::entity::Entity;
use crate::error::DomainError;
use crate::keylock::KeyedLocks;

/// What a command decided to do with the entity's record.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect<E> {
    /// Leave the record untouched; nothing is committed.
    None,
    /// Replace the record with a new value.
    Update(E),
    /// Remove the record.
    Delete,
}

/// The current state of an entity as seen by a command.
#[derive(Debug, Clone)]
pub struct Loaded<E> {
    /// The key the state was loaded for.
    pub key: EntityKey,

    /// The committed record, or the initializer's result.
    pub state: E,

    /// The committed version (0 for a never-written key).
    pub version: Version,

    /// True if a live record exists for the key.
    pub exists: bool,
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult<E, R = ()> {
    /// The entity state after the command.
    pub state: E,

    /// The version of the entity after the command.
    pub version: Version,

    /// True if the command committed a change.
    pub changed: bool,

    /// Command-specific reply data.
    pub reply: R,
}

/// Handler for executing commands against value entities.
///
/// The handler is responsible for:
/// 1. Serializing mutations per key
/// 2. Loading the entity from the store (or running the initializer)
/// 3. Letting the command decide on an [`Effect`]
/// 4. Committing the effect with optimistic concurrency
pub struct EntityHandler<S, E>
where
    S: EntityStore,
    E: Entity,
{
    store: S,
    locks: KeyedLocks,
    _phantom: PhantomData<E>,
}

impl<S, E> EntityHandler<S, E>
where
    S: EntityStore,
    E: Entity,
{
    /// Creates a new entity handler with the given store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            locks: KeyedLocks::new(),
            _phantom: PhantomData,
        }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Loads an entity from the store.
    ///
    /// If the key has never been written, or its record was deleted, the
    /// state comes from [`Entity::initial`].
    pub async fn load(&self, key: &EntityKey) -> Result<Loaded<E>, DomainError> {
        let loaded = match self.store.get(key).await? {
            None => Loaded {
                key: key.clone(),
                state: E::initial(key),
                version: Version::initial(),
                exists: false,
            },
            Some(record) => match record.decode::<E>()? {
                Some(state) => Loaded {
                    key: key.clone(),
                    state,
                    version: record.version,
                    exists: true,
                },
                None => Loaded {
                    key: key.clone(),
                    state: E::initial(key),
                    version: record.version,
                    exists: false,
                },
            },
        };

        Ok(loaded)
    }

    /// Returns the current state of an entity.
    pub async fn get(&self, key: &EntityKey) -> Result<E, DomainError> {
        Ok(self.load(key).await?.state)
    }

    /// Executes a command and commits its effect.
    ///
    /// The decide function receives the current state and returns the effect
    /// to commit together with a reply. Only one execution per key runs at a
    /// time; a commit that still loses a race (e.g. to a writer outside this
    /// handler) fails with a write conflict and is not retried.
    pub async fn execute<F, R>(
        &self,
        key: &EntityKey,
        decide: F,
    ) -> Result<CommandResult<E, R>, DomainError>
    where
        F: FnOnce(&Loaded<E>) -> Result<(Effect<E>, R), E::Error>,
        DomainError: From<E::Error>,
    {
        let _guard = self.locks.lock(key).await;

        let loaded = self.load(key).await?;
        let (effect, reply) = decide(&loaded)?;

        let (change, state) = match effect {
            Effect::None => {
                return Ok(CommandResult {
                    state: loaded.state,
                    version: loaded.version,
                    changed: false,
                    reply,
                });
            }
            Effect::Update(state) => {
                let change = ChangeEnvelope::builder()
                    .entity_type(E::entity_type())
                    .key(key.clone())
                    .version(loaded.version.next())
                    .state(&state)?
                    .build();
                (change, state)
            }
            Effect::Delete => {
                let change = ChangeEnvelope::builder()
                    .entity_type(E::entity_type())
                    .key(key.clone())
                    .version(loaded.version.next())
                    .deleted()
                    .build();
                (change, E::initial(key))
            }
        };

        let version = self
            .store
            .commit(change, CommitOptions::expect_version(loaded.version))
            .await?;

        tracing::debug!(entity_type = E::entity_type(), %key, %version, "committed");

        Ok(CommandResult {
            state,
            version,
            changed: true,
            reply,
        })
    }
}
