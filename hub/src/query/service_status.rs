//! [`Query`] of a single [`ServiceStatus`].

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    domain::{service, Payment, Service},
    infra::{database, Database},
    read::ServiceStatus,
    Hub,
};

use super::Query;

/// Queries the [`ServiceStatus`] of a [`Service`] by its [`service::Id`].
#[derive(Clone, Copy, Debug)]
pub struct ByServiceId(pub service::Id);

impl<Db> Query<ByServiceId> for Hub<Db>
where
    Db: Database<
            Select<By<Option<Service>, service::Id>>,
            Ok = Option<Service>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Payment>, service::Id>>,
            Ok = Vec<Payment>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Option<ServiceStatus>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        ByServiceId(id): ByServiceId,
    ) -> Result<Self::Ok, Self::Err> {
        let Some(service) = self
            .database()
            .execute(Select(By::<Option<Service>, _>::new(id)))
            .await
            .map_err(tracerr::wrap!())?
        else {
            return Ok(None);
        };
        let payments = self
            .database()
            .execute(Select(By::<Vec<Payment>, _>::new(id)))
            .await
            .map_err(tracerr::wrap!())?;

        Ok(Some(ServiceStatus::of(&service, &payments)))
    }
}
