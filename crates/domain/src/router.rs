//! Command routing by name.
//!
//! The router is an explicit value built once at startup and handed to
//! whatever serves requests. Each route records whether its handler only
//! reads state ([`HandlerKind::Query`]), may change an entity
//! ([`HandlerKind::Update`]), or is a stateless action
//! ([`HandlerKind::Action`]).

use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::DomainError;

/// What a registered handler is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HandlerKind {
    /// Reads entity state, never commits.
    Query,
    /// Reads and may commit entity state.
    Update,
    /// Touches no entity state.
    Action,
}

impl HandlerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HandlerKind::Query => "query",
            HandlerKind::Update => "update",
            HandlerKind::Action => "action",
        }
    }
}

impl std::fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A handler reachable through the router.
///
/// Payloads and replies cross the router as JSON; [`RouterBuilder`] wraps
/// typed async functions into this trait.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn call(&self, payload: Value) -> Result<Value, DomainError>;
}

struct TypedHandler<C, R, F, Fut> {
    command: String,
    f: F,
    _phantom: PhantomData<fn(C) -> (R, Fut)>,
}

#[async_trait]
impl<C, R, F, Fut> Handler for TypedHandler<C, R, F, Fut>
where
    C: DeserializeOwned + Send + 'static,
    R: Serialize + Send + 'static,
    F: Fn(C) -> Fut + Send + Sync,
    Fut: Future<Output = Result<R, DomainError>> + Send + 'static,
{
    async fn call(&self, payload: Value) -> Result<Value, DomainError> {
        let command: C =
            serde_json::from_value(payload).map_err(|source| DomainError::InvalidPayload {
                command: self.command.clone(),
                source,
            })?;
        let reply = (self.f)(command).await?;
        Ok(serde_json::to_value(reply)?)
    }
}

#[derive(Clone)]
struct Route {
    kind: HandlerKind,
    handler: Arc<dyn Handler>,
}

/// Collects handler registrations before the router is frozen.
#[derive(Default)]
pub struct RouterBuilder {
    routes: Vec<(String, Route)>,
}

impl RouterBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a read-only handler.
    pub fn query<C, R, F, Fut>(self, name: impl Into<String>, f: F) -> Self
    where
        C: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
        F: Fn(C) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, DomainError>> + Send + 'static,
    {
        self.typed(name.into(), HandlerKind::Query, f)
    }

    /// Registers a handler that may change entity state.
    pub fn update<C, R, F, Fut>(self, name: impl Into<String>, f: F) -> Self
    where
        C: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
        F: Fn(C) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, DomainError>> + Send + 'static,
    {
        self.typed(name.into(), HandlerKind::Update, f)
    }

    /// Registers a stateless action handler.
    pub fn action<C, R, F, Fut>(self, name: impl Into<String>, f: F) -> Self
    where
        C: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
        F: Fn(C) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, DomainError>> + Send + 'static,
    {
        self.typed(name.into(), HandlerKind::Action, f)
    }

    /// Registers an already type-erased handler.
    pub fn handler(
        mut self,
        name: impl Into<String>,
        kind: HandlerKind,
        handler: Arc<dyn Handler>,
    ) -> Self {
        self.routes.push((name.into(), Route { kind, handler }));
        self
    }

    fn typed<C, R, F, Fut>(self, name: String, kind: HandlerKind, f: F) -> Self
    where
        C: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
        F: Fn(C) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, DomainError>> + Send + 'static,
    {
        let handler = TypedHandler {
            command: name.clone(),
            f,
            _phantom: PhantomData,
        };
        self.handler(name, kind, Arc::new(handler))
    }

    /// Freezes the registrations into a router.
    ///
    /// Fails with `DuplicateCommand` if a name was registered twice.
    pub fn build(self) -> Result<CommandRouter, DomainError> {
        let mut routes = HashMap::with_capacity(self.routes.len());
        for (name, route) in self.routes {
            if routes.contains_key(&name) {
                return Err(DomainError::DuplicateCommand(name));
            }
            routes.insert(name, route);
        }
        Ok(CommandRouter { routes })
    }
}

/// Maps command names to handlers.
#[derive(Clone)]
pub struct CommandRouter {
    routes: HashMap<String, Route>,
}

impl CommandRouter {
    /// Creates a builder for a new router.
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    /// Dispatches a command to the handler registered under `name`.
    ///
    /// Fails with `UnknownCommand` if no handler is registered; the router
    /// itself never touches entity state.
    #[tracing::instrument(skip(self, payload))]
    pub async fn dispatch(&self, name: &str, payload: Value) -> Result<Value, DomainError> {
        let route = self.route(name)?;
        metrics::counter!("router_dispatch_total", "kind" => route.kind.as_str()).increment(1);
        route.handler.call(payload).await
    }

    /// Dispatches a command only if its handler is a query.
    #[tracing::instrument(skip(self, payload))]
    pub async fn dispatch_query(&self, name: &str, payload: Value) -> Result<Value, DomainError> {
        let route = self.route(name)?;
        if route.kind != HandlerKind::Query {
            return Err(DomainError::NotAQuery(name.to_string()));
        }
        metrics::counter!("router_dispatch_total", "kind" => route.kind.as_str()).increment(1);
        route.handler.call(payload).await
    }

    /// Returns the kind of the handler registered under `name`.
    pub fn kind(&self, name: &str) -> Option<HandlerKind> {
        self.routes.get(name).map(|r| r.kind)
    }

    /// Returns all registered command names with their kinds, sorted by name.
    pub fn commands(&self) -> Vec<(String, HandlerKind)> {
        let mut commands: Vec<_> = self
            .routes
            .iter()
            .map(|(name, route)| (name.clone(), route.kind))
            .collect();
        commands.sort_by(|a, b| a.0.cmp(&b.0));
        commands
    }

    /// Returns the number of registered commands.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    fn route(&self, name: &str) -> Result<&Route, DomainError> {
        self.routes.get(name).ok_or_else(|| {
            metrics::counter!("router_unknown_command_total").increment(1);
            tracing::debug!(command = name, "unknown command");
            DomainError::UnknownCommand(name.to_string())
        })
    }
}
