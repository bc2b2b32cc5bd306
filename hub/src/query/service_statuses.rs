//! [`Query`] of multiple [`ServiceStatus`]es.

use common::operations::{By, Select};
use tracerr::Traced;

#[cfg(doc)]
use crate::read::ServiceStatus;
use crate::{
    domain::{Payment, Service},
    infra::{database, Database},
    read::{self, Statuses},
    Hub,
};

use super::Query;

/// Queries the [`ServiceStatus`]es of all the [`Service`]s matching a
/// [`read::service::list::Filter`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ServiceStatuses {
    /// [`read::service::list::Filter`] of the [`Service`]s.
    pub filter: read::service::list::Filter,
}

impl<Db> Query<ServiceStatuses> for Hub<Db>
where
    Db: Database<
            Select<By<Vec<Service>, read::service::list::Filter>>,
            Ok = Vec<Service>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Payment>, ()>>,
            Ok = Vec<Payment>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Statuses;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        ServiceStatuses { filter }: ServiceStatuses,
    ) -> Result<Self::Ok, Self::Err> {
        let services = self
            .database()
            .execute(Select(By::<Vec<Service>, _>::new(filter)))
            .await
            .map_err(tracerr::wrap!())?;
        if services.is_empty() {
            return Ok(Statuses::default());
        }
        let payments = self
            .database()
            .execute(Select(By::<Vec<Payment>, _>::new(())))
            .await
            .map_err(tracerr::wrap!())?;

        Ok(Statuses::compute(&services, &payments))
    }
}

#[cfg(test)]
mod spec {
    use common::operations::Insert;

    use crate::{
        domain::{payment, service},
        fixture,
        infra::Database as _,
        read, Query as _,
    };

    use super::ServiceStatuses;

    #[tokio::test]
    async fn computes_filtered_statuses() {
        let hub = fixture::hub();
        let domain =
            fixture::service(service::Kind::Domain, service::Status::Pending);
        let hosting =
            fixture::service(service::Kind::Hosting, service::Status::Active);
        for s in [&domain, &hosting] {
            hub.database().execute(Insert(s.clone())).await.unwrap();
        }
        hub.database()
            .execute(Insert(fixture::payment(
                &domain,
                payment::Status::Paid,
                "2024-01-01",
            )))
            .await
            .unwrap();

        let all = hub.execute(ServiceStatuses::default()).await.unwrap();
        let domains = hub
            .execute(ServiceStatuses {
                filter: read::service::list::Filter {
                    kind: Some(service::Kind::Domain),
                    ..read::service::list::Filter::default()
                },
            })
            .await
            .unwrap();

        assert_eq!(all.len(), 2);
        assert!(all.get(domain.id).unwrap().can_activate);
        assert!(!all.get(hosting.id).unwrap().can_activate);
        assert_eq!(domains.len(), 1);
        assert!(domains.get(hosting.id).is_none());
    }
}
