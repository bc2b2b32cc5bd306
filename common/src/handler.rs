//! [`Handler`] abstraction.

use std::future::Future;

/// Something executing `Args` asynchronously.
///
/// Commands, queries, background tasks and database operations are all
/// expressed as [`Handler`]s parametrized by the operation they accept.
pub trait Handler<Args = ()> {
    /// Result of a successful execution.
    type Ok;

    /// Error of a failed execution.
    type Err;

    /// Executes this [`Handler`] with the provided `args`.
    fn execute(
        &self,
        args: Args,
    ) -> impl Future<Output = Result<Self::Ok, Self::Err>>;
}
