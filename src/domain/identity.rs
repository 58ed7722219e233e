use crate::external_connections::ExternalConnectivity;
use anyhow::{Context, anyhow};
use uuid::Uuid;

/// Outcome of resolving the identity a client presented. Handlers branch on this
/// rather than re-deriving "new vs returning" from cookie state on their own.
#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(test, derive(Clone))]
pub enum Identity {
    /// A user record was just registered for this client. The token must be mirrored
    /// back to the client as a cookie so the identity survives the visit.
    New { user_id: i64, token: String },
    /// The presented token matched an existing user record.
    Returning { user_id: i64 },
}

impl Identity {
    pub fn user_id(&self) -> i64 {
        match *self {
            Identity::New { user_id, .. } | Identity::Returning { user_id } => user_id,
        }
    }
}

pub mod driven_ports {
    use super::*;
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum SaveUserError {
        /// Another user row already holds the access code (unique constraint)
        #[error("a user with the given access code already exists")]
        CodeTaken,
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }

    pub trait UserStore {
        async fn create_user(
            &self,
            access_code: &str,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<i64, SaveUserError>;

        async fn user_id_by_access_code(
            &self,
            access_code: &str,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<i64>, anyhow::Error>;
    }
}

pub mod driving_ports {
    use super::*;
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum AuthenticateError {
        /// No token was presented, or the presented token is not recognized.
        /// Write paths fail closed rather than minting an identity.
        #[error("no recognized identity was presented")]
        Unauthenticated,
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }


    pub trait IdentityPort {
        /// Read-path identity bootstrap. Mints a fresh identity when no token is
        /// presented, and re-mints when the presented token is unknown (a store
        /// reset would otherwise lock the client out permanently).
        async fn resolve(
            &self,
            presented_token: Option<&str>,
            ext_cxn: &mut impl ExternalConnectivity,
            user_store: &impl driven_ports::UserStore,
        ) -> Result<Identity, anyhow::Error>;

        /// Write-path identity check. Absent, empty, and unknown tokens all fail
        /// with [AuthenticateError::Unauthenticated].
        async fn authenticate(
            &self,
            presented_token: Option<&str>,
            ext_cxn: &mut impl ExternalConnectivity,
            user_store: &impl driven_ports::UserStore,
        ) -> Result<i64, AuthenticateError>;
    }
}

pub struct IdentityService {}

impl IdentityService {
    /// Generates a 128-bit random token, registers a user row for it, and reports
    /// the token for cookie issuance. A duplicate-insert failure means a concurrent
    /// request registered the token first, in which case the winning row is fetched
    /// and reused rather than failing the request.
    async fn mint(
        &self,
        ext_cxn: &mut impl ExternalConnectivity,
        user_store: &impl driven_ports::UserStore,
    ) -> Result<Identity, anyhow::Error> {
        let token = Uuid::new_v4().to_string();

        match user_store.create_user(&token, &mut *ext_cxn).await {
            Ok(user_id) => Ok(Identity::New { user_id, token }),
            Err(driven_ports::SaveUserError::CodeTaken) => {
                let user_id = user_store
                    .user_id_by_access_code(&token, &mut *ext_cxn)
                    .await
                    .context("re-fetching a user after losing the registration race")?
                    .ok_or_else(|| {
                        anyhow!("user row vanished after a duplicate access code insert")
                    })?;
                Ok(Identity::New { user_id, token })
            }
            Err(driven_ports::SaveUserError::PortError(err)) => {
                Err(err.context("registering a new user"))
            }
        }
    }
}

impl driving_ports::IdentityPort for IdentityService {
    async fn resolve(
        &self,
        presented_token: Option<&str>,
        ext_cxn: &mut impl ExternalConnectivity,
        user_store: &impl driven_ports::UserStore,
    ) -> Result<Identity, anyhow::Error> {
        let token = match presented_token {
            Some(token) if !token.is_empty() => token,
            _ => return self.mint(&mut *ext_cxn, user_store).await,
        };

        let known_user = user_store
            .user_id_by_access_code(token, &mut *ext_cxn)
            .await
            .context("looking up a presented access code")?;

        match known_user {
            Some(user_id) => Ok(Identity::Returning { user_id }),
            None => self.mint(&mut *ext_cxn, user_store).await,
        }
    }

    async fn authenticate(
        &self,
        presented_token: Option<&str>,
        ext_cxn: &mut impl ExternalConnectivity,
        user_store: &impl driven_ports::UserStore,
    ) -> Result<i64, driving_ports::AuthenticateError> {
        let token = match presented_token {
            Some(token) if !token.is_empty() => token,
            _ => return Err(driving_ports::AuthenticateError::Unauthenticated),
        };

        let known_user = user_store
            .user_id_by_access_code(token, &mut *ext_cxn)
            .await
            .context("authenticating an access code")?;

        known_user.ok_or(driving_ports::AuthenticateError::Unauthenticated)
    }
}


#[cfg(test)]
pub mod test_util {
    use super::driven_ports::{SaveUserError, UserStore};
    use super::*;
    pub use crate::domain::test_util::Connectivity;
    use crate::domain::test_util::FakeCall;
    use std::sync::{Mutex, RwLock};

    pub struct StoredUser {
        pub id: i64,
        pub access_code: String,
    }

    /// In-memory [UserStore] enforcing access code uniqueness like the real table does.
    pub struct InMemoryUserStore {
        pub users: Vec<StoredUser>,
        pub connected: Connectivity,
        /// When set, the next registration behaves as if a concurrent request
        /// inserted the same access code a moment earlier: the row appears, but
        /// the call reports [SaveUserError::CodeTaken].
        pub steal_next_registration: bool,
        highest_user_id: i64,
    }

    impl InMemoryUserStore {
        pub fn new() -> InMemoryUserStore {
            InMemoryUserStore {
                users: Vec::new(),
                connected: Connectivity::Connected,
                steal_next_registration: false,
                highest_user_id: 0,
            }
        }

        pub fn new_locked() -> RwLock<InMemoryUserStore> {
            RwLock::new(Self::new())
        }

        pub fn new_locked_with_users(access_codes: &[&str]) -> RwLock<InMemoryUserStore> {
            RwLock::new(InMemoryUserStore {
                users: access_codes
                    .iter()
                    .enumerate()
                    .map(|(index, code)| StoredUser {
                        id: index as i64 + 1,
                        access_code: (*code).to_owned(),
                    })
                    .collect(),
                connected: Connectivity::Connected,
                steal_next_registration: false,
                highest_user_id: access_codes.len() as i64,
            })
        }
    }

    impl UserStore for RwLock<InMemoryUserStore> {
        async fn create_user(
            &self,
            access_code: &str,
            _ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<i64, SaveUserError> {
            let mut store = self.write().expect("user store rw lock poisoned");
            store.connected.blow_up_if_disconnected()?;

            if store.users.iter().any(|user| user.access_code == access_code) {
                return Err(SaveUserError::CodeTaken);
            }

            store.highest_user_id += 1;
            let id = store.highest_user_id;
            store.users.push(StoredUser {
                id,
                access_code: access_code.to_owned(),
            });

            if store.steal_next_registration {
                store.steal_next_registration = false;
                return Err(SaveUserError::CodeTaken);
            }

            Ok(id)
        }

        async fn user_id_by_access_code(
            &self,
            access_code: &str,
            _ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<i64>, anyhow::Error> {
            let store = self.read().expect("user store rw lock poisoned");
            store.connected.blow_up_if_disconnected()?;

            Ok(store
                .users
                .iter()
                .find(|user| user.access_code == access_code)
                .map(|user| user.id))
        }
    }

    pub struct MockIdentityService {
        pub resolve_result: FakeCall<Option<String>, anyhow::Result<Identity>>,
        pub authenticate_result:
            FakeCall<Option<String>, Result<i64, driving_ports::AuthenticateError>>,
    }

    impl MockIdentityService {
        pub fn new() -> MockIdentityService {
            MockIdentityService {
                resolve_result: FakeCall::new(),
                authenticate_result: FakeCall::new(),
            }
        }
    }

    impl driving_ports::IdentityPort for Mutex<MockIdentityService> {
        async fn resolve(
            &self,
            presented_token: Option<&str>,
            _ext_cxn: &mut impl ExternalConnectivity,
            _user_store: &impl driven_ports::UserStore,
        ) -> Result<Identity, anyhow::Error> {
            let mut locked_self = self.lock().expect("mock identity service mutex poisoned");
            locked_self
                .resolve_result
                .record(presented_token.map(ToOwned::to_owned));

            locked_self.resolve_result.anyhow_result()
        }

        async fn authenticate(
            &self,
            presented_token: Option<&str>,
            _ext_cxn: &mut impl ExternalConnectivity,
            _user_store: &impl driven_ports::UserStore,
        ) -> Result<i64, driving_ports::AuthenticateError> {
            let mut locked_self = self.lock().expect("mock identity service mutex poisoned");
            locked_self
                .authenticate_result
                .record(presented_token.map(ToOwned::to_owned));

            locked_self.authenticate_result.result()
        }
    }
}
