//! Test fixtures of domain entities.

use std::{str::FromStr as _, time::Duration};

use common::{
    operations::{By, Select},
    DateTime, Money,
};

use crate::{
    command::reconcile_services::Automation,
    domain::{client, payment, service, Client, Payment, Service},
    infra::{Database as _, Memory},
    task, Config, Hub,
};

/// Creates a new [`Hub`] over an empty [`Memory`] database, without any
/// background tasks running.
pub(crate) fn hub() -> Hub<Memory> {
    Hub::without_tasks(
        Config {
            reconcile_services: task::reconcile_services::Config {
                interval: Duration::from_secs(60),
                automation: Automation::default(),
            },
            expire_services: task::expire_services::Config {
                interval: Duration::from_secs(60),
            },
        },
        Memory::new(),
    )
}

/// Returns the stored [`Service`] with the provided ID.
pub(crate) async fn stored(db: &Memory, id: service::Id) -> Service {
    db.execute(Select(By::<Option<Service>, _>::new(id)))
        .await
        .unwrap()
        .unwrap_or_else(|| panic!("`Service(id: {id})` is not stored"))
}

/// Parses the provided `YYYY-MM-DD` date as a midnight UTC [`DateTime`].
pub(crate) fn at(date: &str) -> DateTime {
    DateTime::from_rfc3339(&format!("{date}T00:00:00Z")).unwrap()
}

/// Creates a new [`Client`].
pub(crate) fn client() -> Client {
    Client {
        id: client::Id::new(),
        name: client::Name::new("Acme Ltd.").unwrap(),
        email: client::Email::new("billing@acme.test"),
        phone: None,
        created_at: at("2023-12-01").coerce(),
    }
}

/// Creates a new [`Service`] of the provided [`service::Kind`] and
/// [`service::Status`], expiring far in the future.
pub(crate) fn service(kind: service::Kind, status: service::Status) -> Service {
    let id = service::Id::new();
    Service {
        id,
        kind,
        name: service::Name::new(format!("{id}.example")).unwrap(),
        client_id: client::Id::new(),
        status,
        expires_at: at("2999-01-01").coerce(),
        created_at: at("2023-12-01").coerce(),
    }
}

/// Creates a new [`Payment`] for the provided [`Service`], recorded at the
/// provided `YYYY-MM-DD` date.
pub(crate) fn payment(
    service: &Service,
    status: payment::Status,
    created_at: &str,
) -> Payment {
    let created_at = at(created_at);
    Payment {
        id: payment::Id::new(),
        service_id: service.id,
        service_kind: service.kind,
        status,
        amount: Money::from_str("1500BDT").unwrap(),
        method: payment::Method::Cash,
        paid_at: created_at.coerce(),
        days_overdue: None,
        created_at: created_at.coerce(),
    }
}
