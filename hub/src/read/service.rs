//! [`Service`]-related read definitions.

#[cfg(doc)]
use crate::domain::Service;

pub mod list {
    //! [`Service`]s list definitions.

    use crate::domain::{client, service, Service};
    #[cfg(doc)]
    use crate::domain::Client;

    /// Filter of a [`Service`]s list.
    ///
    /// Unset fields don't restrict the list.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct Filter {
        /// ID of the [`Client`] owning the [`Service`]s.
        pub client_id: Option<client::Id>,

        /// [`service::Kind`] of the [`Service`]s.
        pub kind: Option<service::Kind>,

        /// [`service::Status`] of the [`Service`]s.
        pub status: Option<service::Status>,
    }

    impl Filter {
        /// Checks whether the provided [`Service`] passes this [`Filter`].
        #[must_use]
        pub fn matches(&self, service: &Service) -> bool {
            let Self {
                client_id,
                kind,
                status,
            } = self;

            client_id.map_or(true, |id| id == service.client_id)
                && kind.map_or(true, |k| k == service.kind)
                && status.map_or(true, |s| s == service.status)
        }
    }
}
