//! [`Background`] environment for running [`Task`]s.

use std::{
    error::Error as StdError,
    future::{Future, IntoFuture},
};

use derive_more::Display;
use futures::{
    future::{self, LocalBoxFuture},
    FutureExt as _,
};
use tokio::task;
use tracing as log;

#[cfg(doc)]
use crate::Task;

/// Local environment driving the long-running [`Task`]s of a [`Hub`].
///
/// Resolves once every spawned [`Task`] finishes, or as soon as any of them
/// fails.
///
/// [`Hub`]: crate::Hub
#[derive(Debug, Default)]
pub struct Background {
    /// Local set the [`Task`]s are spawned onto.
    set: task::LocalSet,

    /// Handles of the spawned [`Task`]s along with their names.
    tasks: Vec<(&'static str, task::JoinHandle<Result<(), BoxedError>>)>,
}

/// Type-erased error of a [`Task`].
type BoxedError = Box<dyn StdError>;

impl Background {
    /// Spawns a new [`Task`] with the provided `name` inside this
    /// [`Background`] environment.
    pub fn spawn<F, E>(&mut self, name: &'static str, task: F)
    where
        F: Future<Output = Result<(), E>> + 'static,
        E: StdError + 'static,
    {
        log::debug!("spawning `{name}` background task");
        let handle = self.set.spawn_local(async move {
            task.await.map_err(|e| -> BoxedError { Box::new(e) })
        });
        self.tasks.push((name, handle));
    }

    /// Returns the number of [`Task`]s spawned in this [`Background`].
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Indicates whether no [`Task`]s were spawned in this [`Background`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl IntoFuture for Background {
    type Output = Result<(), Failed>;
    type IntoFuture = LocalBoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        let Self { set, tasks } = self;
        let tasks = tasks.into_iter().map(|(name, handle)| {
            handle
                .map(move |res| {
                    let source: BoxedError = match res {
                        Ok(Ok(())) => {
                            log::debug!("`{name}` background task finished");
                            return Ok(());
                        }
                        Ok(Err(e)) => e,
                        Err(e) => Box::new(e),
                    };
                    log::error!("`{name}` background task failed: {source}");
                    Err(Failed { task: name, source })
                })
                .boxed_local()
        });
        async move {
            set.run_until(future::try_join_all(tasks)).await.map(drop)
        }
        .boxed_local()
    }
}

/// Error of a [`Task`] failed in a [`Background`] environment.
#[derive(Debug, Display)]
#[display("`{task}` background task failed: {source}")]
pub struct Failed {
    /// Name of the failed [`Task`].
    pub task: &'static str,

    /// Error the [`Task`] failed with.
    pub source: BoxedError,
}

impl StdError for Failed {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&*self.source)
    }
}

#[cfg(test)]
mod spec {
    use std::fmt;

    use super::Background;

    #[derive(Debug)]
    struct Boom;

    impl fmt::Display for Boom {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("boom")
        }
    }

    impl std::error::Error for Boom {}

    #[tokio::test]
    async fn resolves_when_all_tasks_finish() {
        let mut bg = Background::default();
        bg.spawn("first", async { Ok::<_, Boom>(()) });
        bg.spawn("second", async { Ok::<_, Boom>(()) });
        assert_eq!(bg.len(), 2);

        assert!(bg.await.is_ok());
    }

    #[tokio::test]
    async fn reports_failed_task_name() {
        let mut bg = Background::default();
        bg.spawn("healthy", async { Ok::<_, Boom>(()) });
        bg.spawn("broken", async { Err(Boom) });

        let err = bg.await.expect_err("`broken` task fails");
        assert_eq!(err.task, "broken");
        assert_eq!(err.to_string(), "`broken` background task failed: boom");
    }

    #[tokio::test]
    async fn empty_resolves_immediately() {
        let bg = Background::default();
        assert!(bg.is_empty());

        assert!(bg.await.is_ok());
    }
}
