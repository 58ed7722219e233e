use anyhow::Context;
use sqlx::pool::PoolConnection;
use sqlx::{PgConnection, PgPool, Postgres};

/// A held database connection that driven-port adapters can execute queries against.
pub trait ConnectionHandle {
    fn borrow_connection(&mut self) -> &mut PgConnection;
}

/// Access to the external systems the application depends on. An implementation is
/// threaded through every domain operation so that driven ports never hold hidden
/// connection state of their own.
pub trait ExternalConnectivity {
    type Handle: ConnectionHandle;

    async fn database_cxn(&mut self) -> Result<Self::Handle, anyhow::Error>;
}

/// [ExternalConnectivity] backed by the shared connection pool built at startup.
/// Cloning is cheap, the pool hands out connections on demand and is safe for
/// concurrent use across in-flight requests.
#[derive(Clone)]
pub struct PoolExternalConnectivity {
    db: PgPool,
}

impl PoolExternalConnectivity {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

pub struct PoolConnectionHandle {
    active_connection: PoolConnection<Postgres>,
}

impl ConnectionHandle for PoolConnectionHandle {
    fn borrow_connection(&mut self) -> &mut PgConnection {
        &mut self.active_connection
    }
}

impl ExternalConnectivity for PoolExternalConnectivity {
    type Handle = PoolConnectionHandle;

    async fn database_cxn(&mut self) -> Result<PoolConnectionHandle, anyhow::Error> {
        let handle = PoolConnectionHandle {
            active_connection: self
                .db
                .acquire()
                .await
                .context("acquiring a connection from the database pool")?,
        };

        Ok(handle)
    }
}

#[cfg(test)]
pub mod test_util {
    use super::*;

    /// Stand-in connectivity for unit tests. The in-memory driven port fakes never
    /// touch a real connection, so handing one out is a test bug.
    pub struct FakeExternalConnectivity;

    impl FakeExternalConnectivity {
        pub fn new() -> Self {
            Self
        }
    }

    pub struct FakeConnectionHandle;

    impl ConnectionHandle for FakeConnectionHandle {
        fn borrow_connection(&mut self) -> &mut PgConnection {
            panic!("unit tests do not carry a real database connection")
        }
    }

    impl ExternalConnectivity for FakeExternalConnectivity {
        type Handle = FakeConnectionHandle;

        async fn database_cxn(&mut self) -> Result<FakeConnectionHandle, anyhow::Error> {
            Ok(FakeConnectionHandle)
        }
    }
}
