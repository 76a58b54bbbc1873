use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::future::BoxFuture;
use ledger::DispatchError;
use serde::Serialize;
use tracing::debug;

use crate::common::{Command, CommonsApp, Query, QueryResult};
use crate::kernel::ServerDeps;

use super::{builders, context, Request, RequestContext, RequestKind, ShellError};

/// What builders get to work with. Cheap to clone.
#[derive(Clone)]
pub struct ShellEnv {
    pub app: Arc<CommonsApp>,
    pub deps: ServerDeps,
}

pub type CommandBuilder =
    Arc<dyn Fn(ShellEnv, Request, RequestContext) -> BoxFuture<'static, Result<Command>> + Send + Sync>;
pub type QueryBuilder =
    Arc<dyn Fn(ShellEnv, Request, RequestContext) -> BoxFuture<'static, Result<Query>> + Send + Sync>;
pub type ContextBuilder =
    Arc<dyn Fn(ShellEnv, Request, RequestContext) -> BoxFuture<'static, Result<RequestContext>> + Send + Sync>;

fn boxed<F, Fut, T>(f: F) -> Arc<dyn Fn(ShellEnv, Request, RequestContext) -> BoxFuture<'static, Result<T>> + Send + Sync>
where
    F: Fn(ShellEnv, Request, RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    Arc::new(move |env, request, context| Box::pin(f(env, request, context)))
}

/// The result of a request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The command was appended under `id`.
    Command { id: u64 },
    Query(QueryResult),
}

pub struct Shell {
    env: ShellEnv,
    commands: HashMap<String, CommandBuilder>,
    queries: HashMap<String, QueryBuilder>,
    context: Vec<ContextBuilder>,
}

impl Shell {
    /// A shell with no builders at all.
    pub fn new(app: Arc<CommonsApp>, deps: ServerDeps) -> Self {
        Self {
            env: ShellEnv { app, deps },
            commands: HashMap::new(),
            queries: HashMap::new(),
            context: Vec::new(),
        }
    }

    /// A shell with the stock context, command and query builders.
    pub fn with_defaults(app: Arc<CommonsApp>, deps: ServerDeps) -> Self {
        let mut shell = Self::new(app, deps);
        shell.use_context(context::current_time).use_context(context::current_session);
        builders::register_defaults(&mut shell);
        shell
    }

    pub fn app(&self) -> &Arc<CommonsApp> {
        &self.env.app
    }

    pub fn deps(&self) -> &ServerDeps {
        &self.env.deps
    }

    pub fn register_command<F, Fut>(&mut self, name: &str, builder: F) -> &mut Self
    where
        F: Fn(ShellEnv, Request, RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Command>> + Send + 'static,
    {
        self.commands.insert(name.to_string(), boxed(builder));
        self
    }

    pub fn register_query<F, Fut>(&mut self, name: &str, builder: F) -> &mut Self
    where
        F: Fn(ShellEnv, Request, RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Query>> + Send + 'static,
    {
        self.queries.insert(name.to_string(), boxed(builder));
        self
    }

    /// Append a context builder. They run in the order added.
    pub fn use_context<F, Fut>(&mut self, builder: F) -> &mut Self
    where
        F: Fn(ShellEnv, Request, RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<RequestContext>> + Send + 'static,
    {
        self.context.push(boxed(builder));
        self
    }

    pub fn command_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn query_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.queries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    async fn build_context(&self, request: &Request) -> Result<RequestContext> {
        let mut context = RequestContext::default();
        for builder in &self.context {
            context = builder(self.env.clone(), request.clone(), context).await?;
        }
        Ok(context)
    }

    /// Classify the request, run the context builders, then hand the
    /// request to the named builder and dispatch what it produces.
    pub async fn do_request(&self, request: Request) -> Result<Outcome> {
        let name = request.name().to_string();
        let kind = request.kind();
        if kind == RequestKind::Unknown {
            return Err(ShellError::UnknownRequestKind(request.headers.get("kind").to_string()).into());
        }

        let context = self
            .build_context(&request)
            .await
            .with_context(|| format!("building context for {}", name))?;

        if kind == RequestKind::Command {
            let builder = self.commands.get(&name).ok_or_else(|| DispatchError::CommandNotAccepted {
                kind: name.clone(),
            })?;
            let command = builder(self.env.clone(), request, context)
                .await
                .with_context(|| format!("building command {}", name))?;

            let id = self.env.app.handle_command(command).await?;
            debug!(name = %name, id, "shell command handled");
            Ok(Outcome::Command { id })
        } else {
            let builder = self.queries.get(&name).ok_or_else(|| DispatchError::QueryNotAccepted {
                kind: name.clone(),
            })?;
            let query = builder(self.env.clone(), request, context)
                .await
                .with_context(|| format!("building query {}", name))?;

            let result = self.env.app.handle_query(query).await?;
            Ok(Outcome::Query(result))
        }
    }
}
