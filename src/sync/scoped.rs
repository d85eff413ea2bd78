use crate::error::ClientError;

/// Load state of data the presentation layer renders
#[derive(Debug, Clone, Default)]
pub enum Loadable<T> {
    #[default]
    Idle,
    Loading,
    Ready(T),
    Failed(ClientError),
}

impl<T> Loadable<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Loadable::Loading)
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Loadable::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ClientError> {
        match self {
            Loadable::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Identifies one fetch issued for a scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket<S> {
    generation: u64,
    pub scope: S,
}

/// Data fetched for a scope (e.g. districts of one branch).
///
/// Changing the scope drops the data and bumps a generation counter; results
/// for an older generation are discarded on arrival.
#[derive(Debug, Clone)]
pub struct Scoped<S, T> {
    scope: Option<S>,
    state: Loadable<T>,
    generation: u64,
}

impl<S, T> Default for Scoped<S, T> {
    fn default() -> Self {
        Self { scope: None, state: Loadable::Idle, generation: 0 }
    }
}

impl<S: Clone + PartialEq, T> Scoped<S, T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scope(&self) -> Option<&S> {
        self.scope.as_ref()
    }

    pub fn state(&self) -> &Loadable<T> {
        &self.state
    }

    /// Returns whether the scope actually changed
    pub fn rescope(&mut self, scope: Option<S>) -> bool {
        if self.scope == scope {
            return false;
        }
        self.scope = scope;
        self.state = Loadable::Idle;
        self.generation += 1;
        true
    }

    /// True when a scope is set and nothing is loaded or loading for it
    pub fn needs_fetch(&self) -> bool {
        self.scope.is_some() && matches!(self.state, Loadable::Idle)
    }

    pub fn begin(&mut self) -> Option<Ticket<S>> {
        let scope = self.scope.clone()?;
        self.state = Loadable::Loading;
        Some(Ticket { generation: self.generation, scope })
    }

    /// Store a result; returns false if the ticket belongs to an older scope
    pub fn complete(&mut self, ticket: Ticket<S>, result: Result<T, ClientError>) -> bool {
        if ticket.generation != self.generation {
            tracing::debug!("Discarding options fetched for a previous scope");
            return false;
        }
        self.state = match result {
            Ok(value) => Loadable::Ready(value),
            Err(e) => Loadable::Failed(e),
        };
        true
    }
}
